//! Decoding of per-trial device responses.
//!
//! Each trial produces exactly three lines, in order:
//!
//! ```text
//! elapsed:<cycles>
//! u:<scalar>
//! x:<v0>;<v1>;...
//! ```

use std::io::{Read, Write};

use crate::error::{HarnessError, Result};
use crate::transport::LineTransport;

/// Labels the device puts in front of each response line.
pub const RESPONSE_LABELS: [&str; 3] = ["elapsed", "u", "x"];

/// One decoded device computation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    /// Raw cycle count reported by the device.
    pub elapsed_cycles: f64,
    /// Scalar control output.
    pub scalar: f64,
    /// State vector.
    pub vector: Vec<f64>,
}

/// Decodes the three response lines of one trial.
///
/// Labels are ignored unless `strict_labels` is set, in which case they must
/// match [`RESPONSE_LABELS`] in order.
pub fn decode_trial(lines: [&str; 3], strict_labels: bool) -> Result<TrialResult> {
    let [elapsed_line, scalar_line, vector_line] = lines;

    let elapsed_cycles = parse_number(elapsed_line, payload(elapsed_line, 0, strict_labels)?)?;
    let scalar = parse_number(scalar_line, payload(scalar_line, 1, strict_labels)?)?;
    let vector = payload(vector_line, 2, strict_labels)?
        .split(';')
        .map(|token| parse_number(vector_line, token))
        .collect::<Result<Vec<_>>>()?;

    Ok(TrialResult {
        elapsed_cycles,
        scalar,
        vector,
    })
}

/// Reads the next three non-empty lines from the device and decodes them.
pub fn receive_trial<C: Read + Write>(
    transport: &mut LineTransport<C>,
    strict_labels: bool,
) -> Result<TrialResult> {
    let elapsed = transport.receive_line()?;
    let scalar = transport.receive_line()?;
    let vector = transport.receive_line()?;
    decode_trial([elapsed.as_str(), scalar.as_str(), vector.as_str()], strict_labels)
}

fn payload(line: &str, index: usize, strict_labels: bool) -> Result<&str> {
    let (label, payload) = line
        .split_once(':')
        .ok_or_else(|| HarnessError::malformed(line, "missing ':' separator"))?;

    let expected = RESPONSE_LABELS[index];
    if strict_labels && label.trim() != expected {
        return Err(HarnessError::malformed(
            line,
            format!("expected label {expected:?}, found {:?}", label.trim()),
        ));
    }
    Ok(payload)
}

// NaN and infinities are never valid device output.
fn parse_number(line: &str, token: &str) -> Result<f64> {
    let token = token.trim();
    let value = token
        .parse::<f64>()
        .map_err(|e| HarnessError::malformed(line, format!("invalid number {token:?}: {e}")))?;
    if !value.is_finite() {
        return Err(HarnessError::malformed(line, format!("non-finite number {token:?}")));
    }
    Ok(value)
}
