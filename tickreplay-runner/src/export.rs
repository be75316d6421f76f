//! Artifact export: JSON result and CSV histories.
//!
//! Persisted results carry a `schema_version`; unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tickreplay_core::ledger::Ledger;

use crate::runner::{BacktestResult, EquityPoint, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the holdings history as CSV.
///
/// Columns: date, total, cash, commission, returns, equity_curve. The first
/// row's `returns` cell is empty.
pub fn export_equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total", "cash", "commission", "returns", "equity_curve"])?;
    for p in points {
        wtr.write_record([
            p.date.to_string(),
            format!("{:.2}", p.total),
            format!("{:.2}", p.cash),
            format!("{:.2}", p.commission),
            p.returns.map(|r| format!("{r:.6}")).unwrap_or_default(),
            format!("{:.6}", p.equity_curve),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the position history as CSV: one row per snapshot, one column
/// per symbol.
pub fn export_positions_csv(ledger: &Ledger) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(ledger.symbols().iter().cloned());
    wtr.write_record(&header)?;

    for snapshot in ledger.all_positions() {
        let mut row = vec![snapshot.date.to_string()];
        row.extend(ledger.symbols().iter().map(|s| snapshot.quantity(s).to_string()));
        wtr.write_record(&row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{run_id prefix}/` under `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `equity.csv`: holdings history with returns and equity curve
/// - `positions.csv`: position history
///
/// Re-running an identical config overwrites the same directory. Returns the
/// path to the directory.
pub fn save_artifacts(result: &BacktestResult, ledger: &Ledger, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(prefix);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)
        .context("failed to write result.json")?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(&result.equity)?)
        .context("failed to write equity.csv")?;
    std::fs::write(run_dir.join("positions.csv"), export_positions_csv(ledger)?)
        .context("failed to write positions.csv")?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
