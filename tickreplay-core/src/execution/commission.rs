//! Commission schedules.

use serde::{Deserialize, Serialize};

/// How a broker charges for a fill. Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommissionModel {
    /// No commission
    #[default]
    None,

    /// Fixed per-fill commission
    PerTrade { amount: f64 },

    /// Per-unit commission
    PerShare { amount: f64 },

    /// Percentage of traded notional (0.1 = 0.1%)
    Percentage { percent: f64 },
}

impl CommissionModel {
    pub fn compute(&self, price: f64, quantity: u64) -> f64 {
        let qty = quantity as f64;
        let raw = match *self {
            CommissionModel::None => 0.0,
            CommissionModel::PerTrade { amount } => amount,
            CommissionModel::PerShare { amount } => amount * qty,
            CommissionModel::Percentage { percent } => (price * qty).abs() * percent / 100.0,
        };
        raw.max(0.0)
    }

    /// The configured rate, for validation.
    pub fn rate(&self) -> f64 {
        match *self {
            CommissionModel::None => 0.0,
            CommissionModel::PerTrade { amount } | CommissionModel::PerShare { amount } => amount,
            CommissionModel::Percentage { percent } => percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules() {
        assert_eq!(CommissionModel::None.compute(100.0, 10), 0.0);
        assert_eq!(CommissionModel::PerTrade { amount: 1.5 }.compute(100.0, 10), 1.5);
        assert_eq!(CommissionModel::PerShare { amount: 0.01 }.compute(100.0, 100), 1.0);
        let pct = CommissionModel::Percentage { percent: 0.1 }.compute(50.0, 100);
        assert!((pct - 5.0).abs() < 1e-12);
    }

    #[test]
    fn parses_tagged_form() {
        let model: CommissionModel =
            serde_json::from_str(r#"{"type":"per_share","amount":0.005}"#).unwrap();
        assert_eq!(model, CommissionModel::PerShare { amount: 0.005 });

        let none: CommissionModel = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(none, CommissionModel::None);
    }

    #[test]
    fn never_negative() {
        assert_eq!(CommissionModel::PerTrade { amount: -3.0 }.compute(10.0, 1), 0.0);
    }
}
