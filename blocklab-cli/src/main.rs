//! BlockLab CLI — order-block detection and zone backtests over candle CSVs.
//!
//! Commands:
//! - `run` — run one parameter set over every symbol and save artifacts
//! - `sweep` — evaluate a parameter grid and write the ranked table
//! - `detect` — dump pivots, structure breaks and zones of one symbol as JSON
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to adjust.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blocklab_runner::export::{
    export_detection_json, export_sweep_csv, save_artifacts, write_file, DetectionDump,
};
use blocklab_runner::{
    detect_symbol, load_candles, run_single_backtest, BacktestConfig, BacktestResult,
    FitnessMetric, ParamSweep, SweepResults,
};

#[derive(Parser)]
#[command(
    name = "blocklab",
    about = "BlockLab CLI — order-block zone detection and backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Data and config options shared by every command.
#[derive(Args)]
struct DataArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Timeframe subdirectory, e.g. 15m (overrides the config).
    #[arg(long)]
    timeframe: Option<String>,

    /// Symbols to load. Empty means every CSV in the timeframe directory.
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// Generate synthetic candles for symbols without a data file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

impl DataArgs {
    fn resolve(&self) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)?,
            None => BacktestConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data.data_dir = dir.clone();
        }
        if let Some(tf) = &self.timeframe {
            config.data.timeframe = tf.clone();
        }
        if !self.symbols.is_empty() {
            config.data.symbols = self.symbols.clone();
        }
        config.data.synthetic |= self.synthetic;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured strategy over every symbol.
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Output directory for the artifact bundle.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evaluate the configured parameter grid.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Ranking metric: net_profit, win_rate, profit_factor, average_profit,
        /// trade_count, max_drawdown (overrides the config).
        #[arg(long)]
        metric: Option<FitnessMetric>,

        /// Rows to print (overrides the config).
        #[arg(long)]
        top: Option<usize>,

        /// Run combinations one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Where to write the ranked CSV.
        #[arg(long, default_value = "results/sweep.csv")]
        output: PathBuf,
    },
    /// Write detection output of one symbol as JSON.
    Detect {
        #[command(flatten)]
        data: DataArgs,

        /// Symbol to analyze.
        #[arg(long)]
        symbol: String,

        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, output_dir } => run_cmd(&data, output_dir),
        Commands::Sweep {
            data,
            metric,
            top,
            sequential,
            output,
        } => sweep_cmd(&data, metric, top, sequential, output),
        Commands::Detect {
            data,
            symbol,
            output,
        } => detect_cmd(&data, &symbol, output),
    }
}

fn run_cmd(args: &DataArgs, output_dir: PathBuf) -> Result<()> {
    let config = args.resolve()?;
    let result = run_single_backtest(&config)?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn sweep_cmd(
    args: &DataArgs,
    metric: Option<FitnessMetric>,
    top: Option<usize>,
    sequential: bool,
    output: PathBuf,
) -> Result<()> {
    let config = args.resolve()?;
    let metric = metric.unwrap_or(config.sweep.metric);
    let top = top.unwrap_or(config.sweep.top);
    let parallel = config.sweep.parallel && !sequential;

    let data = load_candles(&config.data.symbols, &config.load_options())?;
    let grid = &config.sweep.grid;
    info!(
        combinations = grid.size(),
        symbols = data.series.len(),
        metric = metric.name(),
        "starting sweep"
    );

    let done = AtomicUsize::new(0);
    let step = (grid.size() / 20).max(1);
    let results = ParamSweep::new(&data)
        .with_metric(metric)
        .with_parallelism(parallel)
        .sweep_with_progress(grid, &config.strategy, |_, total, _| {
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % step == 0 || n == total {
                info!(done = n, total, "sweep progress");
            }
        })?;

    print_ranking(&results, top);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_file(&output, &export_sweep_csv(&results)?)?;
    println!("Sweep table saved to: {}", output.display());
    Ok(())
}

fn detect_cmd(args: &DataArgs, symbol: &str, output: Option<PathBuf>) -> Result<()> {
    let config = args.resolve()?;
    let data = load_candles(&[symbol.to_string()], &config.load_options())?;
    let detection = detect_symbol(&config.strategy, &data, symbol)?;
    info!(
        symbol,
        pivots = detection.pivots.len(),
        msb_points = detection.msb_points.len(),
        zones = detection.order_blocks.len(),
        "detection complete"
    );

    let dump = DetectionDump::new(symbol, config.strategy.params_hash(), detection);
    let json = export_detection_json(&dump)?;
    match output {
        Some(path) => {
            write_file(&path, &json)?;
            println!("Detection written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let f = &result.fitness;
    println!();
    println!("=== Backtest Result ===");
    println!("Params:         {}", result.params_hash.short());
    println!("Symbols:        {}", result.symbols.len());
    println!("Trades:         {}", f.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Net Profit:     {:.2}", f.net_profit);
    println!("Win Rate:       {:.1}%", f.win_rate);
    println!("Profit Factor:  {:.2}", f.profit_factor);
    println!("Avg Profit:     {:.4}", f.average_profit);
    println!("Max Drawdown:   {:.2}", f.max_drawdown);
    println!("Full Targets:   {}", f.full_target_count);
    println!("Stoplosses:     {}", f.stoploss_count);
    println!();
    println!("--- Symbols ---");
    for s in &result.symbols {
        println!(
            "{:<12} candles {:>6}  zones {:>4}  trades {:>4}  net {:>10.2}",
            s.symbol, s.candle_count, s.zone_count, s.fitness.trade_count, s.fitness.net_profit
        );
    }
    if result.aborted_count() > 0 {
        println!();
        println!(
            "WARNING: {} zone(s) aborted by a simulation error",
            result.aborted_count()
        );
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_ranking(results: &SweepResults, top: usize) {
    let metric = results.metric();
    println!();
    println!("=== Top {} by {} ===", top.min(results.len()), metric.name());
    println!(
        "{:>4}  {:<12}  {:>3}  {:>5}  {:>5}  {:>2}  {:>2}  {:>12}  {:>6}  {:>6}",
        "rank", "hash", "W", "sl", "tc", "b", "c", "net_profit", "win%", "trades"
    );
    for (i, row) in results.top_n(top).iter().enumerate() {
        let p = &row.params;
        println!(
            "{:>4}  {:<12}  {:>3}  {:>5.2}  {:>5.2}  {:>2}  {:>2}  {:>12.2}  {:>6.1}  {:>6}",
            i + 1,
            row.params_hash.short(),
            p.zigzag_window_size,
            p.stoploss_coeff,
            p.target_coeff,
            p.max_bounces,
            p.max_concurrent,
            row.fitness.net_profit,
            row.fitness.win_rate,
            row.fitness.trade_count,
        );
    }
    println!();
}
