//! Deterministic portfolio calculators
//!
//! Pure functions over a holdings mapping. No I/O, no hidden state. The risk
//! and diversification figures are illustrative heuristics, not financial
//! models.

use crate::error::AssistantError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

//
// ================= Holdings =================
//

/// Ticker-keyed holdings in insertion order.
///
/// `Holdings<f64>` maps tickers to amounts, `Holdings<String>` maps tickers
/// to sector labels. The two are not interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holdings<V> {
    entries: Vec<(String, V)>,
}

pub type AmountHoldings = Holdings<f64>;
pub type SectorHoldings = Holdings<String>;

impl<V> Holdings<V> {
    /// Tickers must be non-empty and unique (case-sensitive).
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for (ticker, value) in entries {
            let ticker = ticker.into();
            if ticker.trim().is_empty() {
                return Err(AssistantError::InvalidHoldings(
                    "ticker symbols must not be empty".to_string(),
                ));
            }
            if !seen.insert(ticker.clone()) {
                return Err(AssistantError::InvalidHoldings(format!(
                    "duplicate ticker: {}",
                    ticker
                )));
            }
            collected.push((ticker, value));
        }

        Ok(Self { entries: collected })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v))
    }
}

impl Holdings<f64> {
    /// Amount holdings: every amount must be finite and non-negative.
    pub fn amounts<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let holdings = Self::new(entries)?;

        if let Some((ticker, amount)) = holdings
            .iter()
            .find(|(_, amount)| !amount.is_finite() || **amount < 0.0)
        {
            return Err(AssistantError::InvalidHoldings(format!(
                "amount for {} must be a non-negative number, got {}",
                ticker, amount
            )));
        }

        Ok(holdings)
    }

    /// Parse `{"AAPL": 10000, ...}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = expect_object(value)?;
        let mut entries = Vec::with_capacity(object.len());

        for (ticker, amount) in object {
            let amount = amount.as_f64().ok_or_else(|| {
                AssistantError::InvalidHoldings(format!("amount for {} must be a number", ticker))
            })?;
            entries.push((ticker.clone(), amount));
        }

        Self::amounts(entries)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }
}

impl Holdings<String> {
    /// Parse `{"AAPL": "tech", ...}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = expect_object(value)?;
        let mut entries = Vec::with_capacity(object.len());

        for (ticker, sector) in object {
            let sector = sector.as_str().ok_or_else(|| {
                AssistantError::InvalidHoldings(format!("sector for {} must be a string", ticker))
            })?;
            entries.push((ticker.clone(), sector.to_string()));
        }

        Self::new(entries)
    }
}

fn expect_object(value: &Value) -> Result<&serde_json::Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        AssistantError::InvalidHoldings("holdings must be a JSON object".to_string())
    })
}

//
// ================= Portfolio metrics =================
//

/// Ticker → percentage of total value, in holdings order.
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation(Vec<(String, f64)>);

impl Allocation {
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, percent)| *percent)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(t, _)| t.as_str())
    }

    pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, percent)| *percent)
    }
}

impl Serialize for Allocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(t, percent)| (t, percent)))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioMetrics {
    pub total_value: f64,
    pub allocation: Allocation,
    pub num_holdings: usize,
    pub largest_position: String,
}

/// Total value, percentage allocation and largest position.
///
/// Empty holdings or a zero total are reported as `InvalidHoldings`. Ties for
/// the largest position go to the ticker seen first.
pub fn calculate_portfolio_metrics(holdings: &AmountHoldings) -> Result<PortfolioMetrics> {
    if holdings.is_empty() {
        return Err(AssistantError::InvalidHoldings(
            "holdings must not be empty".to_string(),
        ));
    }

    let total_value = holdings.total();
    if total_value <= 0.0 {
        return Err(AssistantError::InvalidHoldings(
            "total portfolio value must be positive".to_string(),
        ));
    }

    let allocation = Allocation(
        holdings
            .iter()
            .map(|(ticker, amount)| (ticker.to_string(), amount / total_value * 100.0))
            .collect(),
    );

    let mut largest: Option<(&str, f64)> = None;
    for (ticker, amount) in holdings.iter() {
        match largest {
            Some((_, max)) if *amount <= max => {}
            _ => largest = Some((ticker, *amount)),
        }
    }

    Ok(PortfolioMetrics {
        total_value,
        allocation,
        num_holdings: holdings.len(),
        largest_position: largest.map(|(t, _)| t.to_string()).unwrap_or_default(),
    })
}

//
// ================= Risk =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskProfile {
    /// Exact, case-sensitive match; anything else falls back to `Moderate`.
    pub fn parse(label: &str) -> Self {
        match label {
            "conservative" => RiskProfile::Conservative,
            "aggressive" => RiskProfile::Aggressive,
            _ => RiskProfile::Moderate,
        }
    }

    pub fn allocation(self) -> AssetSplit {
        match self {
            RiskProfile::Conservative => AssetSplit { stocks: 0.3, bonds: 0.7 },
            RiskProfile::Moderate => AssetSplit { stocks: 0.6, bonds: 0.4 },
            RiskProfile::Aggressive => AssetSplit { stocks: 0.9, bonds: 0.1 },
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        };
        write!(f, "{}", s)
    }
}

/// Stock/bond fractions summing to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AssetSplit {
    pub stocks: f64,
    pub bonds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAnalysis {
    /// The label as supplied by the caller.
    pub risk_profile: String,
    pub recommended_allocation: AssetSplit,
    pub analysis: String,
    pub timestamp: DateTime<Utc>,
}

/// Recommended split for a risk profile label.
///
/// The holdings are accepted but do not influence the result; the profile
/// alone decides the split.
pub fn analyze_risk(_holdings: &AmountHoldings, risk_profile: &str) -> RiskAnalysis {
    let profile = RiskProfile::parse(risk_profile);
    let split = profile.allocation();

    RiskAnalysis {
        risk_profile: risk_profile.to_string(),
        recommended_allocation: split,
        analysis: format!(
            "Your {} profile recommends {:.1}% stocks and {:.1}% bonds.",
            risk_profile,
            split.stocks * 100.0,
            split.bonds * 100.0
        ),
        timestamp: Utc::now(),
    }
}

//
// ================= Diversification =================
//

const LOW_DIVERSIFICATION_BELOW: usize = 3;
const GOOD_DIVERSIFICATION_FROM: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiversificationScore {
    pub diversification_score: u32,
    pub num_holdings: usize,
    pub recommendation: String,
}

/// Step score on holding count: 0-2 → 20, 3-7 → 60, 8+ → 85.
pub fn get_diversification_score(holdings: &SectorHoldings) -> DiversificationScore {
    let num_holdings = holdings.len();

    let (score, recommendation) = if num_holdings < LOW_DIVERSIFICATION_BELOW {
        (20, "Consider adding more holdings for better diversification")
    } else if num_holdings < GOOD_DIVERSIFICATION_FROM {
        (60, "Your portfolio is moderately diversified")
    } else {
        (85, "Your portfolio shows good diversification")
    };

    DiversificationScore {
        diversification_score: score,
        num_holdings,
        recommendation: recommendation.to_string(),
    }
}

//
// ================= Recommendations =================
//

/// Checked in order; the first keyword found wins.
const RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "diversification",
        "Diversification is key to managing risk. Consider allocating your investments across different asset classes, sectors, and geographies.",
    ),
    (
        "long-term",
        "For long-term investing, consider dollar-cost averaging and maintaining a disciplined investment strategy.",
    ),
    (
        "risk",
        "Understanding your risk tolerance is crucial. Align your portfolio with your financial goals and time horizon.",
    ),
    (
        "bonds",
        "Bonds can provide stability and income. Consider your duration and credit risk carefully.",
    ),
    (
        "stocks",
        "Stocks offer growth potential but come with volatility. Focus on quality companies and long-term prospects.",
    ),
];

pub const GENERIC_RECOMMENDATION: &str = "I recommend taking a balanced approach to investing that aligns with your financial goals and risk tolerance.";

/// Canned advice for the first keyword contained in `query`
/// (case-insensitive). `context` is reserved and currently ignored.
pub fn generate_investment_recommendation(query: &str, _context: &Value) -> &'static str {
    let query = query.to_lowercase();

    RECOMMENDATIONS
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_RECOMMENDATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_holdings() -> AmountHoldings {
        Holdings::amounts([("AAPL", 10000.0), ("MSFT", 5000.0), ("GOOGL", 3000.0)]).unwrap()
    }

    fn sectors(count: usize) -> SectorHoldings {
        Holdings::new((0..count).map(|i| (format!("T{}", i), "tech".to_string()))).unwrap()
    }

    #[test]
    fn test_calculate_portfolio_metrics() {
        let metrics = calculate_portfolio_metrics(&sample_holdings()).unwrap();

        assert_eq!(metrics.total_value, 18000.0);
        assert_eq!(metrics.allocation.len(), 3);
        assert!((metrics.allocation.get("AAPL").unwrap() - 55.56).abs() < 0.01);
        assert_eq!(metrics.num_holdings, 3);
        assert_eq!(metrics.largest_position, "AAPL");
    }

    #[test]
    fn test_allocation_sums_to_hundred() {
        let holdings =
            Holdings::amounts([("A", 1.0), ("B", 2.0), ("C", 3.3), ("D", 0.0), ("E", 7.25)]).unwrap();
        let metrics = calculate_portfolio_metrics(&holdings).unwrap();
        let sum: f64 = metrics.allocation.percentages().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(metrics.largest_position, "E");
    }

    #[test]
    fn test_allocation_keeps_holdings_order() {
        let holdings = AmountHoldings::from_json(&json!({"MSFT": 5000, "AAPL": 10000})).unwrap();
        let metrics = calculate_portfolio_metrics(&holdings).unwrap();

        let tickers: Vec<&str> = metrics.allocation.tickers().collect();
        assert_eq!(tickers, vec!["MSFT", "AAPL"]);

        let json = serde_json::to_value(&metrics).unwrap();
        let keys: Vec<&String> = json["allocation"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn test_largest_position_tie_goes_to_first() {
        let holdings = Holdings::amounts([("VTI", 500.0), ("BND", 500.0), ("QQQ", 100.0)]).unwrap();
        let metrics = calculate_portfolio_metrics(&holdings).unwrap();
        assert_eq!(metrics.largest_position, "VTI");
    }

    #[test]
    fn test_metrics_reject_empty_and_zero_total() {
        let empty = Holdings::<f64>::amounts(Vec::<(String, f64)>::new()).unwrap();
        assert!(matches!(
            calculate_portfolio_metrics(&empty),
            Err(AssistantError::InvalidHoldings(_))
        ));

        let zero = Holdings::amounts([("AAPL", 0.0), ("MSFT", 0.0)]).unwrap();
        assert!(matches!(
            calculate_portfolio_metrics(&zero),
            Err(AssistantError::InvalidHoldings(_))
        ));
    }

    #[test]
    fn test_holdings_validation() {
        assert!(Holdings::amounts([("AAPL", -1.0)]).is_err());
        assert!(Holdings::amounts([("AAPL", f64::NAN)]).is_err());
        assert!(Holdings::amounts([("", 1.0)]).is_err());
        assert!(Holdings::amounts([("AAPL", 1.0), ("AAPL", 2.0)]).is_err());
        // Case-sensitive tickers are distinct.
        assert!(Holdings::amounts([("AAPL", 1.0), ("aapl", 2.0)]).is_ok());
    }

    #[test]
    fn test_holdings_from_json_keeps_order() {
        let holdings = AmountHoldings::from_json(&json!({"MSFT": 5, "AAPL": 5})).unwrap();
        let tickers: Vec<&str> = holdings.iter().map(|(t, _)| t).collect();
        assert_eq!(tickers, vec!["MSFT", "AAPL"]);

        assert!(AmountHoldings::from_json(&json!({"MSFT": "tech"})).is_err());
        assert!(SectorHoldings::from_json(&json!({"MSFT": 5})).is_err());
        assert!(AmountHoldings::from_json(&json!(["MSFT"])).is_err());
    }

    #[test]
    fn test_analyze_risk() {
        let holdings = Holdings::amounts([("AAPL", 10000.0), ("MSFT", 5000.0)]).unwrap();
        let result = analyze_risk(&holdings, "moderate");

        assert_eq!(result.risk_profile, "moderate");
        assert_eq!(result.recommended_allocation.stocks, 0.6);
        assert_eq!(result.recommended_allocation.bonds, 0.4);
        assert_eq!(
            result.analysis,
            "Your moderate profile recommends 60.0% stocks and 40.0% bonds."
        );
    }

    #[test]
    fn test_risk_splits_sum_to_one() {
        let holdings = sample_holdings();
        for label in ["conservative", "moderate", "aggressive"] {
            let split = analyze_risk(&holdings, label).recommended_allocation;
            assert!((split.stocks + split.bonds - 1.0).abs() < 1e-9, "{}", label);
        }
    }

    #[test]
    fn test_unknown_profile_falls_back_to_moderate() {
        let result = analyze_risk(&sample_holdings(), "yolo");
        assert_eq!(result.risk_profile, "yolo");
        assert_eq!(result.recommended_allocation, RiskProfile::Moderate.allocation());
        assert_eq!(
            result.analysis,
            "Your yolo profile recommends 60.0% stocks and 40.0% bonds."
        );
    }

    #[test]
    fn test_profile_labels_match_exactly() {
        let holdings = sample_holdings();
        for label in ["Conservative", " aggressive ", "AGGRESSIVE", "conservative\n"] {
            let result = analyze_risk(&holdings, label);
            assert_eq!(result.recommended_allocation.stocks, 0.6, "{:?}", label);
            assert_eq!(result.recommended_allocation.bonds, 0.4, "{:?}", label);
            assert_eq!(result.risk_profile, label);
        }

        let conservative = analyze_risk(&holdings, "conservative").recommended_allocation;
        assert_eq!(conservative, AssetSplit { stocks: 0.3, bonds: 0.7 });
    }

    #[test]
    fn test_risk_ignores_holdings() {
        let small = Holdings::amounts([("AAPL", 1.0)]).unwrap();
        let a = analyze_risk(&small, "aggressive");
        let b = analyze_risk(&sample_holdings(), "aggressive");
        assert_eq!(a.recommended_allocation, b.recommended_allocation);
        assert_eq!(a.analysis, b.analysis);
    }

    #[test]
    fn test_get_diversification_score() {
        let low = Holdings::new([("AAPL", "tech".to_string()), ("MSFT", "tech".to_string())]).unwrap();
        assert_eq!(get_diversification_score(&low).diversification_score, 20);

        let high = Holdings::new(
            [
                ("AAPL", "tech"),
                ("MSFT", "tech"),
                ("JPM", "finance"),
                ("JNJ", "healthcare"),
                ("XOM", "energy"),
                ("WMT", "retail"),
                ("LMT", "defense"),
                ("PLD", "reits"),
                ("TSLA", "auto"),
            ]
            .map(|(t, s)| (t, s.to_string())),
        )
        .unwrap();
        let result = get_diversification_score(&high);
        assert_eq!(result.diversification_score, 85);
        assert_eq!(result.num_holdings, 9);
    }

    #[test]
    fn test_diversification_thresholds_are_monotonic() {
        let expected = [20, 20, 20, 60, 60, 60, 60, 60, 85, 85, 85];
        let mut previous = 0;
        for (count, score) in expected.iter().enumerate() {
            let result = get_diversification_score(&sectors(count));
            assert_eq!(result.diversification_score, *score, "count {}", count);
            assert!(result.diversification_score >= previous);
            previous = result.diversification_score;
        }
    }

    #[test]
    fn test_recommendation_keywords() {
        let ctx = json!({});
        for (keyword, text) in RECOMMENDATIONS {
            let query = format!("Tell me about {} please", keyword.to_uppercase());
            assert_eq!(generate_investment_recommendation(&query, &ctx), *text);
        }
    }

    #[test]
    fn test_recommendation_precedence_and_fallback() {
        let ctx = json!({});
        assert_eq!(
            generate_investment_recommendation("stocks or bonds for risk?", &ctx),
            RECOMMENDATIONS[2].1
        );
        assert_eq!(
            generate_investment_recommendation("what about gold?", &ctx),
            GENERIC_RECOMMENDATION
        );
    }
}
