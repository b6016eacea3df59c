//! Export — JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: exit tape, realized equity curve, sweep table
//! - **Markdown**: human-readable single-run report
//!
//! All persisted JSON includes a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use blocklab_core::domain::{ExitRecord, ParamsHash};
use blocklab_core::engine::replay_exits;
use blocklab_core::Detection;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

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

/// Detection output of one symbol, for charting tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDump {
    pub schema_version: u32,
    pub symbol: String,
    pub params_hash: ParamsHash,
    #[serde(flatten)]
    pub detection: Detection,
}

impl DetectionDump {
    pub fn new(symbol: &str, params_hash: ParamsHash, detection: Detection) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: symbol.to_string(),
            params_hash,
            detection,
        }
    }
}

pub fn export_detection_json(dump: &DetectionDump) -> Result<String> {
    serde_json::to_string_pretty(dump).context("failed to serialize detection output to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export exit records as CSV, one row per exit.
///
/// `target_list` and `target_hit_times` are `;`-joined.
pub fn export_exits_csv(exits: &[ExitRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "zone_id",
        "side",
        "status",
        "capital_used",
        "quantity",
        "net_profit",
        "entry_pdi",
        "entry_time",
        "entry_price",
        "exit_pdi",
        "exit_time",
        "exit_price",
        "stoploss",
        "target_list",
        "target_hit_times",
    ])?;

    for e in exits {
        let targets = e
            .target_list
            .iter()
            .map(|t| format!("{t:.6}"))
            .collect::<Vec<_>>()
            .join(";");
        let hit_times = e
            .target_hit_times
            .iter()
            .map(|t| fmt_time(*t))
            .collect::<Vec<_>>()
            .join(";");
        wtr.write_record([
            e.symbol.clone(),
            e.zone_id.to_string(),
            e.side.to_string(),
            e.status.to_string(),
            format!("{:.2}", e.capital_used),
            format!("{:.6}", e.quantity),
            format!("{:.6}", e.net_profit),
            e.entry_pdi.to_string(),
            fmt_time(e.entry_time),
            format!("{:.6}", e.entry_price),
            e.exit_pdi.to_string(),
            fmt_time(e.exit_time),
            format!("{:.6}", e.exit_price),
            format!("{:.6}", e.stoploss),
            targets,
            hit_times,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Realized equity after each exit, exits in exit-time order. Row 0 is the
/// starting capital.
pub fn export_equity_csv(exits: &[ExitRecord], initial_capital: f64) -> Result<String> {
    let tracker = replay_exits(initial_capital, exits);
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["exit_index", "equity"])?;
    for (i, eq) in tracker.equity_history().iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{eq:.6}")])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Sweep rows best-first, with the swept parameters and the fitness summary.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "params_hash",
        "zigzag_window_size",
        "stoploss_coeff",
        "target_coeff",
        "max_bounces",
        "max_concurrent",
        "net_profit",
        "win_rate",
        "trade_count",
        "profit_factor",
        "average_profit",
        "max_drawdown",
        "full_target_count",
        "stoploss_count",
        "aborted_zones",
    ])?;

    for (rank, row) in results.sorted_by_fitness().iter().enumerate() {
        let p = &row.params;
        let f = &row.fitness;
        wtr.write_record([
            (rank + 1).to_string(),
            row.params_hash.short().to_string(),
            p.zigzag_window_size.to_string(),
            format!("{:.2}", p.stoploss_coeff),
            format!("{:.2}", p.target_coeff),
            p.max_bounces.to_string(),
            p.max_concurrent.to_string(),
            format!("{:.6}", f.net_profit),
            format!("{:.2}", f.win_rate),
            f.trade_count.to_string(),
            format!("{:.3}", f.profit_factor),
            format!("{:.6}", f.average_profit),
            format!("{:.6}", f.max_drawdown),
            f.full_target_count.to_string(),
            f.stoploss_count.to_string(),
            row.aborted_zones.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn fmt_time(t: NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{params_hash_short}_{timestamp}/` under `output_dir` containing:
/// - `manifest.json` — the full `BacktestResult`
/// - `exits.csv` — exit tape
/// - `equity.csv` — realized equity after each exit
/// - `report.md` — Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.params_hash.short(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write_file(&run_dir.join("exits.csv"), &export_exits_csv(&result.exits)?)?;
    write_file(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&result.exits, 0.0)?,
    )?;
    write_file(&run_dir.join("report.md"), &generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown report ────────────────────────────────────────────────

/// Markdown summary of one run: parameters, pooled fitness, per-symbol table.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);
    let p = &result.params;
    let f = &result.fitness;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Params Hash | {} |\n", result.params_hash));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Symbols | {} |\n", result.symbols.len()));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Parameters\n\n");
    md.push_str("| Parameter | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Zigzag Window | {} |\n", p.zigzag_window_size));
    md.push_str(&format!("| Fib Retracement | {} |\n", p.fib_retracement_coeff));
    md.push_str(&format!("| Stoploss Coeff | {} |\n", p.stoploss_coeff));
    md.push_str(&format!(
        "| Targets | {} x {} |\n",
        p.n_targets, p.target_coeff
    ));
    md.push_str(&format!("| Max Bounces | {} |\n", p.max_bounces));
    md.push_str(&format!("| Max Concurrent | {} |\n", p.max_concurrent));
    match p.trailing_target() {
        Some(k) => md.push_str(&format!("| Trailing Stop | after target {k} |\n")),
        None => md.push_str("| Trailing Stop | off |\n"),
    }
    md.push_str(&format!("| Trading Mode | {:?} |\n", p.trading_mode));
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Net Profit | {:.2} |\n", f.net_profit));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", f.win_rate));
    md.push_str(&format!("| Trades | {} |\n", f.trade_count));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", f.profit_factor));
    md.push_str(&format!("| Average Profit | {:.4} |\n", f.average_profit));
    md.push_str(&format!("| Max Drawdown | {:.2} |\n", f.max_drawdown));
    md.push_str(&format!("| Full Targets | {} |\n", f.full_target_count));
    md.push_str(&format!("| Stoplosses | {} |\n", f.stoploss_count));
    md.push('\n');

    md.push_str("## Symbols\n\n");
    md.push_str("| Symbol | Candles | Pivots | MSBs | Zones | Trades | Net Profit | Aborted |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for s in &result.symbols {
        md.push_str(&format!(
            "| {}{} | {} | {} | {} | {} | {} | {:.2} | {} |\n",
            s.symbol,
            if s.synthetic { " (synthetic)" } else { "" },
            s.candle_count,
            s.pivot_count,
            s.msb_count,
            s.zone_count,
            s.fitness.trade_count,
            s.fitness.net_profit,
            s.aborted.len(),
        ));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{LoadedData, SymbolSeries};
    use crate::fitness::FitnessMetric;
    use crate::runner::run_backtest_from_data;
    use crate::sweep::{ParamGrid, ParamSweep};
    use blocklab_core::synthetic::{generate_candles, SyntheticSpec};
    use blocklab_core::{Pipeline, StrategyParams};

    fn sample_data() -> LoadedData {
        let spec = SyntheticSpec {
            count: 1_000,
            ..SyntheticSpec::default()
        };
        LoadedData::from_series(vec![SymbolSeries {
            symbol: "EURUSD".to_string(),
            candles: generate_candles("EURUSD", &spec),
            synthetic: true,
        }])
    }

    fn sample_result() -> BacktestResult {
        run_backtest_from_data(&StrategyParams::default(), &sample_data()).unwrap()
    }

    #[test]
    fn json_roundtrip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.params_hash, result.params_hash);
        assert_eq!(back.exits.len(), result.exits.len());
        assert_eq!(back.symbols.len(), result.symbols.len());
        assert_eq!(back.symbols[0].symbol, "EURUSD");
        assert_eq!(back.fitness.trade_count, result.fitness.trade_count);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn json_without_version_defaults() {
        let result = sample_result();
        let mut value = serde_json::to_value(&result).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back = import_json(&value.to_string()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn exits_csv_has_one_row_per_exit() {
        let result = sample_result();
        let csv = export_exits_csv(&result.exits).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("symbol,zone_id,side,status"));
        assert_eq!(header.split(',').count(), 16);
        assert_eq!(lines.count(), result.exits.len());

        if let Some(first) = result.exits.first() {
            let row = csv.lines().nth(1).unwrap();
            assert!(row.contains(first.zone_id.as_str()));
            assert!(row.contains(&first.status.to_string()));
        }
    }

    #[test]
    fn empty_exits_csv_is_header_only() {
        let csv = export_exits_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn equity_csv_ends_at_net_profit() {
        let result = sample_result();
        let csv = export_equity_csv(&result.exits, 0.0).unwrap();
        assert_eq!(csv.lines().count(), result.exits.len() + 2);
        let last: f64 = csv
            .lines()
            .last()
            .and_then(|l| l.split(',').nth(1))
            .unwrap()
            .parse()
            .unwrap();
        assert!((last - result.fitness.net_profit).abs() < 1e-4);
    }

    #[test]
    fn sweep_csv_is_ranked() {
        let data = sample_data();
        let grid = ParamGrid {
            zigzag_window_size: vec![8, 12],
            max_concurrent: vec![1, 3],
            ..ParamGrid::single(&StrategyParams::default())
        };
        let results = ParamSweep::new(&data)
            .with_metric(FitnessMetric::NetProfit)
            .sweep(&grid, &StrategyParams::default())
            .unwrap();
        let csv = export_sweep_csv(&results).unwrap();
        let profits: Vec<f64> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(7).unwrap().parse().unwrap())
            .collect();
        assert_eq!(profits.len(), 4);
        assert!(profits.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn detection_dump_flattens_stages() {
        let data = sample_data();
        let params = StrategyParams::default();
        let pipeline = Pipeline::new(params.clone()).unwrap();
        let detection = pipeline.detect(&data.series[0].candles);
        let zones = detection.order_blocks.len();
        let dump = DetectionDump::new("EURUSD", params.params_hash(), detection);
        let json = export_detection_json(&dump).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["symbol"], "EURUSD");
        assert!(value["pivots"].is_array());
        assert!(value["msb_points"].is_array());
        assert_eq!(value["order_blocks"].as_array().map(|a| a.len()), Some(zones));
    }

    #[test]
    fn report_lists_symbols() {
        let report = generate_report(&sample_result());
        assert!(report.contains("# Backtest Report"));
        assert!(report.contains("## Performance Summary"));
        assert!(report.contains("EURUSD (synthetic)"));
        assert!(report.contains("**SYNTHETIC**"));
    }

    #[test]
    fn save_load_artifacts_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        for file in ["manifest.json", "exits.csv", "equity.csv", "report.md"] {
            assert!(run_dir.join(file).is_file(), "missing {file}");
        }
        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.params, result.params);
        assert_eq!(loaded.dataset_hash, result.dataset_hash);
        assert_eq!(loaded.exits.len(), result.exits.len());
    }
}
