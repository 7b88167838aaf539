// ============================================================
// Layer 4 — Dataset File Loader
// ============================================================
// Reads a dataset of binary image vectors from a text file.
//
// File format:
//   <num_classes> <width> <height>
//   [0, 1, 0, ..., 0, 0, 1]
//   [1, 1, 0, ..., 1, 0, 0]
//   ...
//
// The three header integers are whitespace separated and may
// span lines. Every following non-empty line is one example
// of width*height pixels plus a num_classes one-hot suffix.
// Examples are stored grouped by class, class 0 first, with
// the same number of examples for every class.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::dataset::{Example, RawDataset};
use crate::domain::error::{RbmError, RbmResult};
use crate::domain::traits::ExampleSource;

/// Loads a dataset file from disk.
/// Implements the ExampleSource trait from Layer 3.
pub struct DatasetFileLoader {
    path: PathBuf,
}

impl DatasetFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for DatasetFileLoader {
    fn load_all(&self) -> Result<RawDataset> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let dataset = parse_dataset(&text)
            .with_context(|| format!("Malformed dataset '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} examples ({} classes, {}x{} images) from '{}'",
            dataset.examples.len(),
            dataset.num_classes,
            dataset.width,
            dataset.height,
            self.path.display(),
        );
        Ok(dataset)
    }
}

/// Parse the full text of a dataset file.
pub fn parse_dataset(text: &str) -> RbmResult<RawDataset> {
    let mut lines = text.lines();

    // ── Header: the first three integers ─────────────────────────────────────
    let mut header = Vec::with_capacity(3);
    while header.len() < 3 {
        let line = lines.next().ok_or_else(|| {
            RbmError::InvalidArgument("dataset header needs classes, width and height".to_string())
        })?;
        for token in line.split_whitespace() {
            if header.len() == 3 {
                return Err(RbmError::InvalidArgument(format!(
                    "unexpected token '{token}' after the dataset header"
                )));
            }
            let value = token.parse::<usize>().map_err(|_| {
                RbmError::InvalidArgument(format!("invalid header value '{token}'"))
            })?;
            header.push(value);
        }
    }
    let (num_classes, width, height) = (header[0], header[1], header[2]);
    if num_classes == 0 {
        return Err(RbmError::InvalidArgument("dataset declares zero classes".to_string()));
    }

    // ── Body: one vector per non-empty line ──────────────────────────────────
    let expected = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_add(num_classes))
        .ok_or_else(|| {
            RbmError::InvalidArgument(format!(
                "dataset header {num_classes} {width} {height} describes vectors too long to hold"
            ))
        })?;
    let mut examples = Vec::new();
    for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
        let example = parse_vector_line(line)?;
        if example.len() != expected {
            return Err(RbmError::DimensionMismatch { expected, actual: example.len() });
        }
        examples.push(example);
    }

    if examples.len() % num_classes != 0 {
        return Err(RbmError::UnequalClassPartitions {
            examples: examples.len(),
            classes:  num_classes,
        });
    }

    Ok(RawDataset { num_classes, width, height, examples })
}

/// Parse one `[0, 1, 1, 0]` vector. Brackets are optional; every
/// element must be 0 or 1.
pub fn parse_vector_line(line: &str) -> RbmResult<Example> {
    let inner = line.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|token| match token.trim() {
            "0" => Ok(0),
            "1" => Ok(1),
            other => Err(RbmError::InvalidArgument(format!(
                "expected a binary value, found '{other}'"
            ))),
        })
        .collect()
}

/// Read a single vector from a file holding one `[..]` line.
pub fn read_vector_file(path: &Path) -> Result<Example> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read input vector '{}'", path.display()))?;
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .with_context(|| format!("Input file '{}' is empty", path.display()))?;
    Ok(parse_vector_line(line)?)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "2 2 1\n[1, 0, 1, 0]\n[1, 1, 1, 0]\n\n[0, 1, 0, 1]\n[0, 0, 0, 1]\n";

    #[test]
    fn test_parse_header_and_body() {
        let ds = parse_dataset(SMALL).unwrap();
        assert_eq!((ds.num_classes, ds.width, ds.height), (2, 2, 1));
        assert_eq!(ds.examples.len(), 4);
        assert_eq!(ds.examples[2], vec![0, 1, 0, 1]);
        assert_eq!(ds.vector_len(), 4);
    }

    #[test]
    fn test_header_may_span_lines() {
        let ds = parse_dataset("2\n2 1\n[1, 0, 1, 0]\n[0, 1, 0, 1]").unwrap();
        assert_eq!(ds.examples.len(), 2);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = parse_dataset("2 2 1\n[1, 0, 1]\n[0, 1, 0, 1]").unwrap_err();
        assert!(matches!(err, RbmError::DimensionMismatch { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_rejects_non_binary() {
        assert!(parse_vector_line("[0, 2, 1]").is_err());
        assert!(parse_vector_line("[0, x]").is_err());
    }

    #[test]
    fn test_rejects_unequal_classes() {
        let err = parse_dataset("2 2 1\n[1, 0, 1, 0]\n[1, 1, 1, 0]\n[0, 1, 0, 1]").unwrap_err();
        assert!(matches!(err, RbmError::UnequalClassPartitions { .. }));
    }

    #[test]
    fn test_rejects_missing_header() {
        assert!(parse_dataset("2 2").is_err());
        assert!(parse_dataset("a b c").is_err());
    }

    #[test]
    fn test_rejects_header_whose_vector_length_overflows() {
        let header = format!("2 {} {}\n[1, 0]\n[0, 1]", u64::MAX, 2);
        let err = parse_dataset(&header).unwrap_err();
        assert!(matches!(err, RbmError::InvalidArgument(_)));
    }

    #[test]
    fn test_vector_without_brackets() {
        assert_eq!(parse_vector_line("1,0 , 1").unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_load_from_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("letters.txt");
        fs::write(&path, SMALL).unwrap();
        let ds = DatasetFileLoader::new(&path).load_all().unwrap();
        assert_eq!(ds.examples.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = DatasetFileLoader::new("/definitely/not/here.txt");
        assert!(loader.load_all().is_err());
    }
}
