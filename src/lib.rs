//! Investment Assistant
//!
//! A conversational front-end that forwards user questions to a language
//! model and exposes a small set of deterministic portfolio calculators.
//!
//! - Runs without network access or secrets (stub language model)
//! - Never surfaces pipeline failures as errors; every turn yields text
//! - Calculators are pure and invoked explicitly, never chosen by the model
//!
//! TURN PIPELINE:
//! INPUT → GENERATE → FINALIZE → DONE

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use config::Config;
pub use models::*;
pub use pipeline::{create_investment_pipeline, Pipeline};
