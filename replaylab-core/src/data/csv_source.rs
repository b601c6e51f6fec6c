//! CSV bar source.
//!
//! The whole file is read and validated up front, so a bad row fails the load
//! instead of surfacing halfway through a replay. Bars are then handed out in
//! file order through `IntoIterator`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::domain::{EventError, MarketEvent, Timestamp};

use super::timestamp::parse_timestamp;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv has no header row")]
    MissingHeader,

    #[error("missing columns {missing:?}, found {found:?}")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("line {line}: cannot parse {column} value {value:?} as a number")]
    BadNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("line {line}: {source}")]
    BadRow {
        line: u64,
        #[source]
        source: EventError,
    },

    #[error("line {line}: timestamp {current} is not after {previous}")]
    NonIncreasingTimestamp {
        line: u64,
        previous: Timestamp,
        current: Timestamp,
    },
}

/// Column mapping for a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSourceConfig {
    /// Symbol stamped on every bar; the file itself carries no symbol column.
    pub symbol: String,
    pub ts_col: String,
    pub open_col: String,
    pub high_col: String,
    pub low_col: String,
    pub close_col: String,
    pub volume_col: String,
}

impl CsvSourceConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ts_col: "timestamp".into(),
            open_col: "open".into(),
            high_col: "high".into(),
            low_col: "low".into(),
            close_col: "close".into(),
            volume_col: "volume".into(),
        }
    }

    pub fn with_ts_col(mut self, ts_col: impl Into<String>) -> Self {
        self.ts_col = ts_col.into();
        self
    }

    fn required(&self) -> [&str; 6] {
        [
            self.ts_col.as_str(),
            self.open_col.as_str(),
            self.high_col.as_str(),
            self.low_col.as_str(),
            self.close_col.as_str(),
            self.volume_col.as_str(),
        ]
    }
}

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub symbol: String,
    pub bars: usize,
    pub first_ts: Option<Timestamp>,
    pub last_ts: Option<Timestamp>,
    /// Bars failing the OHLC relationship check. They are kept, not dropped.
    pub insane_ohlc: usize,
}

impl LoadReport {
    pub fn is_sane(&self) -> bool {
        self.insane_ohlc == 0
    }
}

/// Validated bars loaded from CSV.
#[derive(Debug, Clone)]
pub struct CsvSource {
    bars: Vec<MarketEvent>,
    report: LoadReport,
}

impl CsvSource {
    pub fn load(path: impl AsRef<Path>, config: &CsvSourceConfig) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_reader(file, config)?;
        tracing::info!(
            path = %path.display(),
            symbol = %config.symbol,
            bars = source.report.bars,
            insane_ohlc = source.report.insane_ohlc,
            "loaded csv"
        );
        Ok(source)
    }

    pub fn from_reader(reader: impl io::Read, config: &CsvSourceConfig) -> Result<Self, SourceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(SourceError::MissingHeader);
        }

        let missing: Vec<String> = config
            .required()
            .into_iter()
            .filter(|col| !headers.iter().any(|h| h == col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::MissingColumns {
                missing,
                found: headers,
            });
        }

        let index = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
        let [ts_i, open_i, high_i, low_i, close_i, vol_i] = config.required().map(index);

        let mut bars = Vec::new();
        let mut insane_ohlc = 0usize;
        let mut previous: Option<Timestamp> = None;

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let line = record.position().map_or(row as u64 + 2, |p| p.line());
            let field = |i: usize| record.get(i).unwrap_or("");

            let number = |i: usize, column: &str| -> Result<f64, SourceError> {
                let raw = field(i);
                raw.parse::<f64>().map_err(|_| SourceError::BadNumber {
                    line,
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };

            let ts = parse_timestamp(field(ts_i)).map_err(|source| SourceError::BadRow { line, source })?;
            if let Some(prev) = previous {
                if ts <= prev {
                    return Err(SourceError::NonIncreasingTimestamp {
                        line,
                        previous: prev,
                        current: ts,
                    });
                }
            }

            let volume = if field(vol_i).is_empty() {
                0.0
            } else {
                number(vol_i, &config.volume_col)?
            };

            let bar = MarketEvent::new(
                ts,
                config.symbol.as_str(),
                number(open_i, &config.open_col)?,
                number(high_i, &config.high_col)?,
                number(low_i, &config.low_col)?,
                number(close_i, &config.close_col)?,
                volume,
            )
            .map_err(|source| SourceError::BadRow { line, source })?;

            if !bar.is_sane() {
                insane_ohlc += 1;
                tracing::warn!(line, ts = %ts, "OHLC sanity check failed");
            }

            previous = Some(ts);
            bars.push(bar);
        }

        let report = LoadReport {
            symbol: config.symbol.clone(),
            bars: bars.len(),
            first_ts: bars.first().map(MarketEvent::ts),
            last_ts: bars.last().map(MarketEvent::ts),
            insane_ohlc,
        };
        Ok(Self { bars, report })
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn bars(&self) -> &[MarketEvent] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn into_bars(self) -> Vec<MarketEvent> {
        self.bars
    }
}

impl IntoIterator for CsvSource {
    type Item = MarketEvent;
    type IntoIter = std::vec::IntoIter<MarketEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Result<CsvSource, SourceError> {
        CsvSource::from_reader(text.as_bytes(), &CsvSourceConfig::new("SPY"))
    }

    #[test]
    fn loads_well_formed_file() {
        let src = load(
            "timestamp,open,high,low,close,volume\n\
             2026-01-02 09:30:00,100,101,99,100.5,1000\n\
             2026-01-02 09:31:00,100.5,102,100,101.5,1200\n",
        )
        .unwrap();

        assert_eq!(src.len(), 2);
        let report = src.report().clone();
        assert_eq!(report.bars, 2);
        assert_eq!(report.insane_ohlc, 0);
        assert!(report.first_ts < report.last_ts);

        let bars: Vec<MarketEvent> = src.into_iter().collect();
        assert_eq!(bars[1].close(), 101.5);
        assert_eq!(bars[0].symbol(), "SPY");
    }

    #[test]
    fn tolerates_bom_and_padded_headers() {
        let src = load(
            "\u{feff}timestamp, open ,high,low,close,volume\n\
             2026-01-02,1,1,1,1,\n",
        )
        .unwrap();
        assert_eq!(src.bars()[0].volume(), 0.0);
    }

    #[test]
    fn custom_timestamp_column() {
        let cfg = CsvSourceConfig::new("SPY").with_ts_col("date");
        let src = CsvSource::from_reader(
            "date,open,high,low,close,volume\n01/02/2026,1,2,1,2,5\n".as_bytes(),
            &cfg,
        )
        .unwrap();
        assert_eq!(src.len(), 1);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = load("timestamp,open,high,low,close\n").unwrap_err();
        match err {
            SourceError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["volume"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(load("").unwrap_err(), SourceError::MissingHeader));
    }

    #[test]
    fn header_only_file_is_empty() {
        let src = load("timestamp,open,high,low,close,volume\n").unwrap();
        assert!(src.is_empty());
        assert!(src.report().first_ts.is_none());
    }

    #[test]
    fn bad_timestamp_fails_load() {
        let err = load("timestamp,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n").unwrap_err();
        assert!(matches!(
            err,
            SourceError::BadRow { source: EventError::InvalidTimestamp { .. }, .. }
        ));
    }

    #[test]
    fn bad_number_names_the_column() {
        let err = load("timestamp,open,high,low,close,volume\n2026-01-02,1,x,1,1,1\n").unwrap_err();
        match err {
            SourceError::BadNumber { column, value, line } => {
                assert_eq!(column, "high");
                assert_eq!(value, "x");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_positive_price_fails_load() {
        let err = load("timestamp,open,high,low,close,volume\n2026-01-02,1,1,1,0,1\n").unwrap_err();
        assert!(matches!(err, SourceError::BadRow { .. }));
    }

    #[test]
    fn non_increasing_timestamps_fail_load() {
        let err = load(
            "timestamp,open,high,low,close,volume\n\
             2026-01-02,1,1,1,1,1\n\
             2026-01-02,1,1,1,1,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::NonIncreasingTimestamp { line: 3, .. }));
    }

    #[test]
    fn insane_ohlc_is_counted_not_dropped() {
        let src = load(
            "timestamp,open,high,low,close,volume\n\
             2026-01-02,100,99,98,100,1\n\
             2026-01-03,100,101,99,100,1\n",
        )
        .unwrap();
        assert_eq!(src.len(), 2);
        assert_eq!(src.report().insane_ohlc, 1);
        assert!(!src.report().is_sane());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CsvSource::load("/nonexistent/bars.csv", &CsvSourceConfig::new("SPY")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
