//! Consensus (§4.6): grouping and agreed-value selection for both pipelines.

pub mod outcome;
pub mod statistic;
