//! Oscilloscope CSV export readers
//!
//! Each supported scope model writes a slightly different CSV dialect:
//! the metadata key naming the sampling interval, the number of header
//! rows before sample data begins, and the column holding the voltage all
//! vary. European exports use a comma as the decimal separator in the
//! interval field; that is tolerated everywhere a number is parsed.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Capture;
use crate::error::DecodeError;

/// Supported oscilloscope CSV dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeModel {
    TektronixMso,
    Rigol,
    TektronixTds2012,
}

impl ScopeModel {
    /// Metadata key carrying the sampling interval.
    fn interval_key(&self) -> &'static str {
        match self {
            Self::TektronixMso | Self::TektronixTds2012 => "Sample Interval",
            Self::Rigol => "Sampling Period",
        }
    }

    /// Rows to skip before sample data begins.
    fn header_rows(&self) -> usize {
        match self {
            Self::TektronixMso => 17,
            Self::Rigol => 26,
            Self::TektronixTds2012 => 0,
        }
    }

    /// Zero-based column holding the voltage value.
    fn data_column(&self) -> usize {
        match self {
            Self::TektronixMso => 1,
            Self::Rigol => 0,
            Self::TektronixTds2012 => 4,
        }
    }
}

/// Parse a numeric field, tolerating a comma decimal separator.
fn parse_field(field: &str) -> Option<f64> {
    field.trim().replace(',', ".").parse::<f64>().ok()
}

/// Read a scope CSV export into a [`Capture`].
///
/// # Arguments
/// * `reader` - CSV text
/// * `model` - Dialect to parse
///
/// # Errors
/// `Format` when the sampling-interval row is missing, `EmptyCapture`
/// when no numeric samples were found past the header.
pub fn read_csv<R: Read>(reader: R, model: ScopeModel) -> Result<Capture, DecodeError> {
    let reader = BufReader::new(reader);
    let mut interval = None;
    let mut samples = Vec::new();
    let col = model.data_column();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();

        if fields[0].trim() == model.interval_key() {
            interval = fields.get(1).and_then(|f| parse_field(f));
            continue;
        }
        if index <= model.header_rows() {
            continue;
        }
        // Data rows: anything non-numeric in the voltage column is a
        // stray annotation row and skipped, matching scope export quirks.
        if let Some(v) = fields.get(col).and_then(|f| parse_field(f)) {
            samples.push(v);
        }
    }

    let interval = interval.ok_or_else(|| {
        DecodeError::Format(format!(
            "'{}' row not found in CSV header",
            model.interval_key()
        ))
    })?;
    if samples.is_empty() {
        return Err(DecodeError::EmptyCapture);
    }
    Capture::new(samples, interval)
}

/// Read a scope CSV export from disk. See [`read_csv`].
pub fn load_csv<P: AsRef<Path>>(path: P, model: ScopeModel) -> Result<Capture, DecodeError> {
    read_csv(File::open(path)?, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mso_csv() -> String {
        let mut text = String::new();
        text.push_str("Model,MSO44\n");
        text.push_str("Sample Interval,1e-9\n");
        for _ in 0..16 {
            text.push_str("header,junk\n");
        }
        for i in 0..8 {
            text.push_str(&format!("{}e-9,{}\n", i, 0.1 * i as f64));
        }
        text
    }

    #[test]
    fn test_tektronix_mso() {
        let cap = read_csv(mso_csv().as_bytes(), ScopeModel::TektronixMso).unwrap();
        assert_eq!(cap.sample_interval(), 1e-9);
        assert_eq!(cap.len(), 8);
        assert!((cap.samples()[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(parse_field("1,5e-9"), Some(1.5e-9));
        assert_eq!(parse_field(" 0.25 "), Some(0.25));
        assert_eq!(parse_field("volts"), None);
    }

    #[test]
    fn test_missing_interval_is_format_error() {
        let text = "a,b\n1,2\n";
        let err = read_csv(text.as_bytes(), ScopeModel::TektronixMso).unwrap_err();
        assert!(matches!(err, DecodeError::Format(_)));
        assert!(err.to_string().contains("Sample Interval"));
    }

    #[test]
    fn test_rigol_dialect() {
        let mut text = String::new();
        text.push_str("Sampling Period,2e-9\n");
        for _ in 0..26 {
            text.push_str("header\n");
        }
        for i in 0..5 {
            text.push_str(&format!("{}\n", 0.2 * i as f64));
        }
        let cap = read_csv(text.as_bytes(), ScopeModel::Rigol).unwrap();
        assert_eq!(cap.sample_interval(), 2e-9);
        assert_eq!(cap.len(), 5);
    }

    #[test]
    fn test_tds2012_dialect() {
        let mut text = String::new();
        text.push_str("Sample Interval,5e-10,,,0.0\n");
        text.push_str("x,y,z,w,0.5\n");
        text.push_str("x,y,z,w,-0.5\n");
        let cap = read_csv(text.as_bytes(), ScopeModel::TektronixTds2012).unwrap();
        assert_eq!(cap.sample_interval(), 5e-10);
        assert_eq!(cap.len(), 2);
        assert_eq!(cap.samples(), &[0.5, -0.5]);
    }
}
