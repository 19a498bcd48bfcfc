//! CSV reading and writing of daily bars.
//!
//! Files carry a header row `date,open,high,low,close,volume[,open_interest]`
//! with ISO dates (`YYYY-MM-DD`). Extra columns are ignored.

use crate::error::DataError;
use crate::quality::DataQuality;
use chrono::NaiveDate;
use core_types::Bar;
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Bars parsed from a file together with the quality of that file.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub bars: Vec<Bar>,
    pub quality: DataQuality,
}

/// One row as it appears in the file. Unparsable cells become `None`.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    open_interest: Option<f64>,
}

impl RawRow {
    fn into_bar(self) -> Option<Bar> {
        let bar = Bar {
            date: self.date?,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume?,
            open_interest: self.open_interest.unwrap_or(0.0),
        };
        bar.validate().ok().map(|_| bar)
    }
}

/// Loads a bar file from disk.
///
/// Fails with `DataError::Empty` when no row of the file is usable.
pub fn load_bars(path: &Path) -> Result<LoadedSeries, DataError> {
    let file = File::open(path)?;
    let series = read_bars(file)?;
    if series.bars.is_empty() {
        return Err(DataError::Empty(path.display().to_string()));
    }
    tracing::info!(
        path = %path.display(),
        bars = series.bars.len(),
        score = series.quality.score,
        "Loaded market data."
    );
    Ok(series)
}

/// Parses bars from any CSV source.
///
/// Defective rows (missing or non-numeric fields, inconsistent prices) are
/// skipped and counted. The result is sorted by date and, when a date occurs
/// more than once, the row appearing last in the input wins.
pub fn read_bars<R: Read>(source: R) -> Result<LoadedSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataError::MissingColumn(column.to_string()));
        }
    }

    let mut bars = Vec::new();
    let mut total = 0;
    let mut defective = 0;

    for (i, result) in reader.deserialize::<RawRow>().enumerate() {
        total += 1;
        // Header is line 1.
        let line = i + 2;
        match result {
            Ok(row) => match row.into_bar() {
                Some(bar) => bars.push(bar),
                None => {
                    tracing::debug!(line, "Skipping defective row.");
                    defective += 1;
                }
            },
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::debug!(line, error = %e, "Skipping unreadable row.");
                defective += 1;
            }
        }
    }

    let parsed = bars.len();
    let bars = sort_and_dedup(bars);
    let quality = DataQuality::new(total, defective, parsed - bars.len());
    if defective > 0 {
        tracing::warn!(defective, total, "Bar file contains defective rows.");
    }
    Ok(LoadedSeries { bars, quality })
}

fn sort_and_dedup(mut bars: Vec<Bar>) -> Vec<Bar> {
    // Stable, so equal dates keep their input order.
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Writes bars to a file, replacing it if it exists.
pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    let file = File::create(path)?;
    write_bars_to(file, bars)?;
    tracing::info!(path = %path.display(), bars = bars.len(), "Wrote market data.");
    Ok(())
}

/// Writes bars with a header row to any sink.
pub fn write_bars_to<W: Write>(sink: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_writer(sink);
    if bars.is_empty() {
        writer.write_record(REQUIRED_COLUMNS.iter().chain(["open_interest"].iter()))?;
    }
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,open,high,low,close,volume,open_interest
2023-01-04,10,11,9,10.5,100,1000
2023-01-03,9,10,8,9.5,120,900
2023-01-05,11,12,10,11.5,80,1100
";

    #[test]
    fn test_read_sorts_by_date() {
        let series = read_bars(SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.bars.len(), 3);
        assert!(series.bars.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series.bars[0].close, 9.5);
        assert!(series.quality.is_clean());
        assert_eq!(series.quality.score, 100.0);
    }

    #[test]
    fn test_defective_rows_are_skipped_and_counted() {
        let data = "\
date,open,high,low,close,volume
2023-01-03,9,10,8,9.5,120
not-a-date,9,10,8,9.5,120
2023-01-05,11,12,10,,80
2023-01-06,11,9,10,10.5,80
2023-01-09,11,12,10,11.0,80
";
        let series = read_bars(data.as_bytes()).unwrap();
        assert_eq!(series.bars.len(), 2);
        assert_eq!(series.quality.total_rows, 5);
        assert_eq!(series.quality.defective_rows, 3);
        assert!((series.quality.score - 40.0).abs() < 1e-9);
        // No open_interest column.
        assert_eq!(series.bars[0].open_interest, 0.0);
    }

    #[test]
    fn test_zero_prices_are_defective() {
        let data = "\
date,open,high,low,close,volume
2023-01-03,9,10,8,9.5,120
2023-01-04,9,10,0,0,120
2023-01-05,9,10,8,9.7,120
";
        let series = read_bars(data.as_bytes()).unwrap();
        assert_eq!(series.bars.len(), 2);
        assert_eq!(series.quality.defective_rows, 1);
        assert!(series.bars.iter().all(|b| b.close > 0.0));
    }

    #[test]
    fn test_duplicate_dates_keep_last_row() {
        let data = "\
date,open,high,low,close,volume
2023-01-03,9,10,8,9.5,120
2023-01-03,9,10,8,9.9,130
";
        let series = read_bars(data.as_bytes()).unwrap();
        assert_eq!(series.bars.len(), 1);
        assert_eq!(series.bars[0].close, 9.9);
        assert_eq!(series.quality.duplicate_rows, 1);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "date,open,high,low,volume\n2023-01-03,9,10,8,120\n";
        assert!(matches!(
            read_bars(data.as_bytes()),
            Err(DataError::MissingColumn(c)) if c == "close"
        ));
    }

    #[test]
    fn test_write_then_read_preserves_bars() {
        let original = read_bars(SAMPLE.as_bytes()).unwrap().bars;
        let mut buf = Vec::new();
        write_bars_to(&mut buf, &original).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("date,open,high,low,close,volume,open_interest"));
        let reread = read_bars(text.as_bytes()).unwrap().bars;
        assert_eq!(reread, original);
    }

    #[test]
    fn test_load_empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "date,open,high,low,close,volume\n").unwrap();
        assert!(matches!(load_bars(&path), Err(DataError::Empty(_))));
    }
}
