//! Tool trait and registry
//!
//! Named wrappers around the analysis calculators. Arguments are structured
//! JSON objects; tools are invoked explicitly by a host shell and are never
//! chosen automatically by the pipeline.

use crate::analysis::{
    analyze_risk, calculate_portfolio_metrics, generate_investment_recommendation,
    get_diversification_score, AmountHoldings, SectorHoldings,
};
use crate::error::AssistantError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// `name: description` lines, sorted by name.
    pub fn describe(&self) -> Vec<String> {
        self.list()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect()
    }

    /// Look up `name` and run it with `parameters`.
    pub async fn invoke(&self, name: &str, parameters: Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| AssistantError::ToolNotFound(name.to_string()))?;

        let input = ToolInput {
            tool_name: name.to_string(),
            parameters,
        };
        tool.execute(&input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AssistantError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn require_holdings(input: &ToolInput) -> Result<&Value> {
    input.parameters.get("holdings").ok_or_else(|| {
        AssistantError::InvalidToolInput("Expected 'holdings' in tool_input".to_string())
    })
}

pub struct PortfolioMetricsTool;

#[async_trait::async_trait]
impl Tool for PortfolioMetricsTool {
    fn name(&self) -> &'static str {
        "calculate_portfolio_metrics"
    }

    fn description(&self) -> &'static str {
        "Analyze portfolio composition and metrics. Input: {\"holdings\": {ticker: amount}}"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let holdings = AmountHoldings::from_json(require_holdings(input)?)?;
        let metrics = calculate_portfolio_metrics(&holdings)?;
        Ok(ToolOutput::ok(serde_json::to_value(metrics)?))
    }
}

pub struct RiskAnalysisTool;

#[async_trait::async_trait]
impl Tool for RiskAnalysisTool {
    fn name(&self) -> &'static str {
        "analyze_risk"
    }

    fn description(&self) -> &'static str {
        "Assess risk profile and allocation recommendations. Input: {\"holdings\": {ticker: amount}, \"risk_profile\": \"conservative|moderate|aggressive\"}"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let holdings = AmountHoldings::from_json(require_holdings(input)?)?;
        let risk_profile = input
            .parameters
            .get("risk_profile")
            .and_then(Value::as_str)
            .unwrap_or("moderate");

        let analysis = analyze_risk(&holdings, risk_profile);
        Ok(ToolOutput::ok(serde_json::to_value(analysis)?))
    }
}

pub struct DiversificationTool;

#[async_trait::async_trait]
impl Tool for DiversificationTool {
    fn name(&self) -> &'static str {
        "get_diversification_score"
    }

    fn description(&self) -> &'static str {
        "Evaluate portfolio diversification. Input: {\"holdings\": {ticker: sector}}"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let holdings = SectorHoldings::from_json(require_holdings(input)?)?;
        let score = get_diversification_score(&holdings);
        Ok(ToolOutput::ok(serde_json::to_value(score)?))
    }
}

pub struct RecommendationTool;

#[async_trait::async_trait]
impl Tool for RecommendationTool {
    fn name(&self) -> &'static str {
        "generate_recommendation"
    }

    fn description(&self) -> &'static str {
        "Generate investment recommendations. Input: {\"query\": text, \"context\": object}"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let query = input
            .parameters
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AssistantError::InvalidToolInput("Expected 'query' for this tool".to_string())
            })?;
        let context = input.parameters.get("context").cloned().unwrap_or_else(|| json!({}));

        let recommendation = generate_investment_recommendation(query, &context);
        Ok(ToolOutput::ok(json!({ "recommendation": recommendation })))
    }
}

/// Create a registry holding the four analysis tools.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(PortfolioMetricsTool));
    registry.register(Arc::new(RiskAnalysisTool));
    registry.register(Arc::new(DiversificationTool));
    registry.register(Arc::new(RecommendationTool));

    registry
}
