//! Candle loading and symbol resolution for the runner.
//!
//! Candles come from `<data_dir>/<timeframe>/<SYMBOL>.csv`. The fallback
//! policy per symbol:
//! 1. If the CSV file exists → parse and validate it
//! 2. If not and `synthetic` is set → generate a seeded random walk (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! A candle's PDI is its row position after loading.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use blocklab_core::domain::{validate_series, Candle, CandleError, DatasetHash};
use blocklab_core::synthetic::{generate_candles, SyntheticSpec};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {} (use --synthetic for synthetic data)", path.display())]
    MissingData { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("unparseable time '{value}' in {source_name} row {row}")]
    BadTime {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("invalid candles in {source_name}: {source}")]
    Invalid {
        source_name: String,
        #[source]
        source: CandleError,
    },

    #[error("no symbols given and none found in {}", dir.display())]
    NoSymbols { dir: PathBuf },
}

/// Options controlling how candles are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    /// Sub-directory of `data_dir` holding the CSV files, e.g. `15m`.
    pub timeframe: String,
    /// If true, generate synthetic candles when a file is missing.
    pub synthetic: bool,
    pub synthetic_spec: SyntheticSpec,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            timeframe: "15m".to_string(),
            synthetic: false,
            synthetic_spec: SyntheticSpec::default(),
        }
    }
}

impl LoadOptions {
    pub fn timeframe_dir(&self) -> PathBuf {
        self.data_dir.join(&self.timeframe)
    }

    pub fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.timeframe_dir().join(format!("{symbol}.csv"))
    }
}

/// One symbol's candles and where they came from.
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub synthetic: bool,
}

/// Result of loading candles, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Series in requested symbol order.
    pub series: Vec<SymbolSeries>,
    /// BLAKE3 over all candle data.
    pub dataset_hash: DatasetHash,
    /// Whether any symbol used synthetic data.
    pub has_synthetic: bool,
}

impl LoadedData {
    pub fn get(&self, symbol: &str) -> Option<&SymbolSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn candle_count(&self) -> usize {
        self.series.iter().map(|s| s.candles.len()).sum()
    }

    /// Wrap already-built series.
    pub fn from_series(series: Vec<SymbolSeries>) -> Self {
        let dataset_hash = compute_dataset_hash(&series);
        let has_synthetic = series.iter().any(|s| s.synthetic);
        Self {
            series,
            dataset_hash,
            has_synthetic,
        }
    }
}

/// Load candles for `symbols`, or for every CSV in the timeframe directory
/// when `symbols` is empty.
pub fn load_candles(symbols: &[String], opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let symbols = if symbols.is_empty() {
        discover_symbols(opts)?
    } else {
        symbols.to_vec()
    };

    let mut series = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let path = opts.symbol_path(&symbol);
        if path.is_file() {
            let candles = read_candles_csv(&path)?;
            info!(symbol = %symbol, candles = candles.len(), "loaded candles");
            series.push(SymbolSeries {
                symbol,
                candles,
                synthetic: false,
            });
        } else if opts.synthetic {
            warn!(symbol = %symbol, "generating synthetic candles; results are tagged as synthetic");
            let candles = generate_candles(&symbol, &opts.synthetic_spec);
            series.push(SymbolSeries {
                symbol,
                candles,
                synthetic: true,
            });
        } else {
            return Err(LoadError::MissingData { symbol, path });
        }
    }

    Ok(LoadedData::from_series(series))
}

/// Symbols with a `.csv` file in the timeframe directory, sorted.
pub fn discover_symbols(opts: &LoadOptions) -> Result<Vec<String>, LoadError> {
    let dir = opts.timeframe_dir();
    let entries = std::fs::read_dir(&dir).map_err(|source| LoadError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut symbols: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    symbols.sort();

    if symbols.is_empty() {
        return Err(LoadError::NoSymbols { dir });
    }
    Ok(symbols)
}

/// Read and validate one CSV file.
pub fn read_candles_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_candles_csv(file, &path.display().to_string())
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Parse `time,open,high,low,close` rows (extra columns ignored) and validate
/// the resulting series.
pub fn parse_candles_csv<R: Read>(reader: R, source_name: &str) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for (row, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            source_name: source_name.to_string(),
            source,
        })?;
        let time = parse_time(&record.time).ok_or_else(|| LoadError::BadTime {
            source_name: source_name.to_string(),
            row,
            value: record.time.clone(),
        })?;
        candles.push(Candle::new(time, record.open, record.high, record.low, record.close));
    }

    validate_series(&candles).map_err(|source| LoadError::Invalid {
        source_name: source_name.to_string(),
        source,
    })?;
    Ok(candles)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// a bare date, or integer epoch milliseconds.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

/// Compute a deterministic BLAKE3 hash over all candle data.
///
/// Covers symbol names, times and OHLC values in series order.
pub fn compute_dataset_hash(series: &[SymbolSeries]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();

    for s in series {
        hasher.update(s.symbol.as_bytes());
        for candle in &s.candles {
            hasher.update(&candle.time.and_utc().timestamp_millis().to_le_bytes());
            hasher.update(&candle.open.to_le_bytes());
            hasher.update(&candle.high.to_le_bytes());
            hasher.update(&candle.low.to_le_bytes());
            hasher.update(&candle.close.to_le_bytes());
        }
    }

    DatasetHash::from_hash(&hasher.finalize().to_hex())
}
