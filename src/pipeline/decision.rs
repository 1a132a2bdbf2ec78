//! Decision Policy
//!
//! Binary accept/reject against the deployment threshold, plus a risk tier
//! and a confidence score. Pure functions, no failure modes.

use serde::Serialize;

/// Lower bound of the Moderate tier
pub const MODERATE_CUT: f64 = 0.30;

/// Lower bound of the VeryHigh tier
pub const VERY_HIGH_CUT: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// 1 when default is predicted
    pub fn as_prediction(&self) -> u8 {
        match self {
            Self::Accept => 0,
            Self::Reject => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskTier {
    /// The High tier starts at the configured threshold, not at 0.5
    pub fn classify(probability: f64, threshold: f64) -> Self {
        if probability < MODERATE_CUT {
            Self::Low
        } else if probability < threshold {
            Self::Moderate
        } else if probability < VERY_HIGH_CUT {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub risk_tier: RiskTier,
    pub confidence: f64,
}

/// Distance from the 0.5 midpoint, rescaled to [0, 1]
pub fn confidence(probability: f64) -> f64 {
    (probability - 0.5).abs() * 2.0
}

pub fn decide(probability: f64, threshold: f64) -> DecisionOutcome {
    let decision = if probability >= threshold {
        Decision::Reject
    } else {
        Decision::Accept
    };

    DecisionOutcome {
        decision,
        risk_tier: RiskTier::classify(probability, threshold),
        confidence: confidence(probability),
    }
}
