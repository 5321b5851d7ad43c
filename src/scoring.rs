//! Mean-squared-error scoring against the golden reference.

use crate::decoder::TrialResult;
use crate::reference::ExpectedOutput;

/// Mean squared error of an observed value against its expected value.
pub trait MeanSquaredError<Rhs: ?Sized = Self> {
    fn mse(&self, expected: &Rhs) -> f64;
}

impl MeanSquaredError for f64 {
    fn mse(&self, expected: &f64) -> f64 {
        (self - expected).powi(2)
    }
}

/// Elements are paired positionally and each squared difference is divided
/// by the observed length. Elements without a partner on the other side are
/// ignored.
impl MeanSquaredError for [f64] {
    fn mse(&self, expected: &[f64]) -> f64 {
        if self.len() != expected.len() {
            tracing::warn!(
                "Vector length mismatch: observed {}, expected {}; comparing first {}",
                self.len(),
                expected.len(),
                self.len().min(expected.len())
            );
        }
        let len = self.len() as f64;
        self.iter()
            .zip(expected)
            .map(|(a, b)| (a - b).powi(2) / len)
            .sum()
    }
}

impl MeanSquaredError for Vec<f64> {
    fn mse(&self, expected: &Vec<f64>) -> f64 {
        self.as_slice().mse(expected.as_slice())
    }
}

/// Free-function form of [`MeanSquaredError::mse`].
pub fn mse<T: MeanSquaredError + ?Sized>(observed: &T, expected: &T) -> f64 {
    observed.mse(expected)
}

/// Errors of one trial and the resulting verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialScore {
    pub scalar_error: f64,
    pub vector_error: f64,
    pub passed: bool,
}

/// Applies the fixed pass/fail threshold to trial results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    threshold: f64,
}

impl Scorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// A trial fails when either error is strictly above the threshold.
    /// An error that is not a number fails too.
    pub fn score(&self, observed: &TrialResult, expected: &ExpectedOutput) -> TrialScore {
        let scalar_error = mse(&observed.scalar, &expected.scalar);
        let vector_error = mse(observed.vector.as_slice(), expected.vector.as_slice());
        TrialScore {
            scalar_error,
            vector_error,
            passed: scalar_error <= self.threshold && vector_error <= self.threshold,
        }
    }
}
