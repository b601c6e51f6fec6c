//! Artifact export: JSON result, equity CSV, and a Markdown report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use replaylab_core::domain::EquityPoint;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

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

pub fn write_result_json(path: &Path, result: &BacktestResult) -> Result<()> {
    fs::write(path, export_json(result)?).with_context(|| format!("failed to write {}", path.display()))
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export an equity history as CSV with ts, equity and cash columns.
pub fn export_equity_csv(history: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ts", "equity", "cash"])?;
    for p in history {
        wtr.write_record([
            &p.ts.to_rfc3339(),
            &format!("{:.6}", p.equity),
            &format!("{:.6}", p.cash),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_equity_csv(path: &Path, history: &[EquityPoint]) -> Result<()> {
    fs::write(path, export_equity_csv(history)?).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one replay.
///
/// Creates `{symbol}_{run_id[..12]}/` under `output_dir` containing
/// `result.json`, `equity.csv` and `report.md`. Returns the directory path.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, short_id));
    fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {}", run_dir.display()))?;

    write_result_json(&run_dir.join("result.json"), result)?;
    write_equity_csv(&run_dir.join("equity.csv"), &result.summary.equity_history)?;
    let report = run_dir.join("report.md");
    fs::write(&report, generate_report(result)).with_context(|| format!("failed to write {}", report.display()))?;

    tracing::info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Load a previously saved result from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one replay.
pub fn generate_report(result: &BacktestResult) -> String {
    let s = &result.summary;
    let m = &result.metrics;
    let mut md = String::with_capacity(2048);

    md.push_str("# Replay Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    if let (Some(start), Some(end)) = (result.start_ts, result.end_ts) {
        md.push_str(&format!("| Period | {} to {} |\n", start.to_rfc3339(), end.to_rfc3339()));
    }
    md.push_str(&format!("| Bars | {} ({} warmup) |\n", s.bars, result.warmup_bars));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Activity\n\n");
    md.push_str("| Signals | Orders | Fills | Rejected | Fees |\n");
    md.push_str("| ---: | ---: | ---: | ---: | ---: |\n");
    md.push_str(&format!(
        "| {} | {} | {} | {} | {:.2} |\n\n",
        s.signals, s.orders, s.fills, s.rejected_fills, s.total_fees
    ));

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Initial Cash | {:.2} |\n", s.initial_cash));
    md.push_str(&format!("| Final Cash | {:.2} |\n", s.final_cash));
    md.push_str(&format!("| Final Equity | {:.2} |\n", s.final_equity));
    md.push_str(&format!("| Total Return | {:.2}% |\n", m.total_return * 100.0));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Volatility | {:.2}% |\n", m.volatility * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe));
    md.push('\n');

    let equity: Vec<f64> = s.equity_history.iter().map(|p| p.equity).collect();
    if !equity.is_empty() {
        md.push_str("## Equity\n\n");
        md.push_str(&format!("`{}`\n", sparkline(&equity, 60)));
    }

    md
}

/// Render `values` as a unicode block sparkline of at most `width` cells.
///
/// Longer series are downsampled by taking evenly spaced points. A flat
/// series renders at the lowest level.
pub fn sparkline(values: &[f64], width: usize) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled: Vec<f64> = if values.len() <= width {
        values.to_vec()
    } else {
        (0..width)
            .map(|i| values[i * (values.len() - 1) / (width - 1).max(1)])
            .collect()
    };

    let lo = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    sampled
        .iter()
        .map(|&v| {
            if span <= 0.0 || !span.is_finite() {
                BLOCKS[0]
            } else {
                let idx = ((v - lo) / span * (BLOCKS.len() - 1) as f64).round() as usize;
                BLOCKS[idx.min(BLOCKS.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;
    use chrono::{Duration, TimeZone, Utc};
    use replaylab_core::engine::RunSummary;

    fn sample_result() -> BacktestResult {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        let equity = [10_000.0, 10_050.0, 9_900.0, 10_200.0];
        let history: Vec<EquityPoint> = equity
            .iter()
            .enumerate()
            .map(|(i, &e)| EquityPoint {
                ts: t0 + Duration::minutes(i as i64),
                equity: e,
                cash: 8_000.0,
            })
            .collect();

        BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: "ab".repeat(32),
            symbol: "SPY".into(),
            strategy: "ma_crossover".into(),
            dataset_hash: "cd".repeat(32),
            has_synthetic: false,
            start_ts: history.first().map(|p| p.ts),
            end_ts: history.last().map(|p| p.ts),
            warmup_bars: 3,
            metrics: PerformanceMetrics::compute(&equity, 252.0),
            summary: RunSummary {
                bars: 4,
                signals: 2,
                orders: 1,
                fills: 1,
                rejected_fills: 0,
                total_fees: 1.0,
                initial_cash: 10_000.0,
                final_cash: 8_000.0,
                final_equity: 10_200.0,
                equity_history: history,
            },
        }
    }

    // ── JSON ──

    #[test]
    fn json_roundtrip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.summary.equity_history, result.summary.equity_history);
        assert_eq!(back.summary.final_equity, 10_200.0);
        assert_eq!(back.start_ts, result.start_ts);
    }

    #[test]
    fn json_rejects_future_version() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn json_without_version_defaults_to_current() {
        let mut value: serde_json::Value = serde_json::to_value(sample_result()).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let result = import_json(&value.to_string()).unwrap();
        assert_eq!(result.schema_version, SCHEMA_VERSION);
    }

    // ── CSV ──

    #[test]
    fn equity_csv_has_header_and_rows() {
        let result = sample_result();
        let csv = export_equity_csv(&result.summary.equity_history).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "ts,equity,cash");
        assert_eq!(lines[1], "2024-01-02T14:30:00+00:00,10000.000000,8000.000000");
    }

    #[test]
    fn equity_csv_empty_history() {
        let csv = export_equity_csv(&[]).unwrap();
        assert_eq!(csv.trim(), "ts,equity,cash");
    }

    // ── Report ──

    #[test]
    fn markdown_report_has_sections() {
        let md = generate_report(&sample_result());
        assert!(md.contains("# Replay Report"));
        assert!(md.contains("## Metadata"));
        assert!(md.contains("## Performance"));
        assert!(md.contains("| Final Equity | 10200.00 |"));
        assert!(md.contains("| Total Return | 2.00% |"));
        assert!(!md.contains("SYNTHETIC"));
    }

    #[test]
    fn markdown_report_flags_synthetic() {
        let mut result = sample_result();
        result.has_synthetic = true;
        assert!(generate_report(&result).contains("**SYNTHETIC**"));
    }

    #[test]
    fn sparkline_scales_to_range() {
        assert_eq!(sparkline(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 20), "▁▂▃▄▅▆▇█");
        assert_eq!(sparkline(&[5.0, 5.0, 5.0], 20), "▁▁▁");
        assert_eq!(sparkline(&[], 20), "");
    }

    #[test]
    fn sparkline_downsamples_to_width() {
        let values: Vec<f64> = (0..1_000).map(f64::from).collect();
        let line = sparkline(&values, 40);
        assert_eq!(line.chars().count(), 40);
        assert!(line.starts_with('▁'));
        assert!(line.ends_with('█'));
    }

    // ── Artifacts ──

    #[test]
    fn save_load_artifacts_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert!(run_dir.ends_with(format!("SPY_{}", "ab".repeat(6))));
        assert!(run_dir.join("equity.csv").exists());
        assert!(run_dir.join("report.md").exists());
        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.run_id, result.run_id);
        assert_eq!(loaded.summary.bars, 4);
    }
}
