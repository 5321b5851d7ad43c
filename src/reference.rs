//! Golden reference loading.
//!
//! The reference file is plain text. Line 1 holds the initial conditions,
//! each following line holds one trial's expected output: the scalar first,
//! then the state vector, all separated by `;`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{HarnessError, Result};

/// Expected device output for one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedOutput {
    pub scalar: f64,
    pub vector: Vec<f64>,
}

/// Precomputed expected results for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldenReference {
    initial_conditions: Vec<f64>,
    expected: Vec<ExpectedOutput>,
}

impl GoldenReference {
    /// Loads a reference file covering `trials` trials.
    pub fn load(path: impl AsRef<Path>, trials: usize) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading golden reference from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), trials)
    }

    /// Parses a reference from any buffered reader. Lines past the last
    /// trial are ignored.
    pub fn from_reader<R: BufRead>(reader: R, trials: usize) -> Result<Self> {
        let required = trials + 1;
        let mut lines = reader.lines();

        let first = lines.next().transpose()?.ok_or(HarnessError::ReferenceMissing {
            expected: required,
            found: 0,
        })?;
        let initial_conditions = parse_fields(&first, 1)?;

        let mut expected = Vec::with_capacity(trials);
        for trial in 0..trials {
            let line_no = trial + 2;
            let line = lines.next().transpose()?.ok_or(HarnessError::ReferenceMissing {
                expected: required,
                found: line_no - 1,
            })?;

            let mut fields = parse_fields(&line, line_no)?;
            if fields.len() < 2 {
                return Err(HarnessError::reference_format(
                    line_no,
                    format!("expected at least 2 fields, found {}", fields.len()),
                ));
            }
            let vector = fields.split_off(1);
            expected.push(ExpectedOutput {
                scalar: fields[0],
                vector,
            });
        }

        tracing::debug!(
            "Golden reference: {} initial conditions, {} trials",
            initial_conditions.len(),
            expected.len()
        );

        Ok(Self {
            initial_conditions,
            expected,
        })
    }

    /// Values sent to the device once, before the first trial.
    pub fn initial_conditions(&self) -> &[f64] {
        &self.initial_conditions
    }

    /// Expected outputs in trial order.
    pub fn expected(&self) -> &[ExpectedOutput] {
        &self.expected
    }

    pub fn trial_count(&self) -> usize {
        self.expected.len()
    }
}

fn parse_fields(line: &str, line_no: usize) -> Result<Vec<f64>> {
    line.trim()
        .split(';')
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|e| {
                HarnessError::reference_format(line_no, format!("invalid number {field:?}: {e}"))
            })
        })
        .collect()
}
