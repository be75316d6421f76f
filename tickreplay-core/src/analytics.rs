//! Performance analytics: pure functions over the ledger's holdings history.
//!
//! Totals in, statistics out. Undefined arithmetic (a return on a zero base,
//! a Sharpe ratio with no dispersion) is reported as NaN or `None`, never as
//! an error.

use serde::{Deserialize, Serialize};

/// Trading periods per year for daily bars.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Summary statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// (final equity curve − 1) × 100.
    pub total_return_pct: f64,
    pub sharpe_ratio: Option<f64>,
    /// Largest fall from a high-water mark, on the unit equity curve.
    pub max_drawdown: f64,
    /// Longest run of consecutive periods spent under water.
    pub drawdown_duration: usize,
}

impl PerformanceReport {
    /// Compute every statistic from the per-snapshot portfolio totals.
    pub fn from_totals(totals: &[f64], periods_per_year: u32) -> Self {
        let returns = returns(totals);
        let curve = equity_curve(&returns);
        let (max_drawdown, drawdown_duration) = drawdowns(&curve);
        Self {
            total_return_pct: (curve.last().copied().unwrap_or(1.0) - 1.0) * 100.0,
            sharpe_ratio: sharpe_ratio(&returns, periods_per_year),
            max_drawdown,
            drawdown_duration,
        }
    }

    /// Ordered (label, value) pairs for console output.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let sharpe = match self.sharpe_ratio {
            Some(s) => format!("{s:.2}"),
            None => "n/a".to_string(),
        };
        vec![
            ("Total Return", format!("{:.2}%", self.total_return_pct)),
            ("Sharpe Ratio", sharpe),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0)),
            ("Drawdown Duration", self.drawdown_duration.to_string()),
        ]
    }
}

// ─── Individual transforms ──────────────────────────────────────────

/// Simple period returns. `returns[0]` is always NaN; a zero prior total
/// also yields NaN.
pub fn returns(totals: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(totals.len());
    if totals.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    for pair in totals.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        out.push(if prev == 0.0 { f64::NAN } else { (cur - prev) / prev });
    }
    out
}

/// Cumulative product of `1 + r`, starting at 1.0. An undefined return
/// carries the previous value forward.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len());
    let mut level = 1.0;
    for (i, &r) in returns.iter().enumerate() {
        if i > 0 && r.is_finite() {
            level *= 1.0 + r;
        }
        curve.push(level);
    }
    curve
}

/// Annualized Sharpe ratio: √periods × mean / sample standard deviation,
/// over the defined returns only.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    let defined: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if defined.len() < 2 {
        return None;
    }
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    let var = defined.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (defined.len() - 1) as f64;
    let std = var.sqrt();
    if std < 1e-15 {
        return None;
    }
    Some(f64::from(periods_per_year).sqrt() * mean / std)
}

/// Maximum drawdown and longest drawdown duration over an equity curve.
///
/// The high-water mark starts at the first point. A period whose value sits
/// below the mark extends the current duration; touching or exceeding the
/// mark resets it.
pub fn drawdowns(curve: &[f64]) -> (f64, usize) {
    let mut hwm = match curve.first() {
        Some(&first) => first,
        None => return (0.0, 0),
    };
    let mut max_dd = 0.0_f64;
    let mut duration = 0usize;
    let mut max_duration = 0usize;

    for &value in curve {
        hwm = hwm.max(value);
        let dd = hwm - value;
        if dd > 0.0 {
            duration += 1;
        } else {
            duration = 0;
        }
        max_dd = max_dd.max(dd);
        max_duration = max_duration.max(duration);
    }
    (max_dd, max_duration)
}
