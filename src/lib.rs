//! # Hardware-in-the-Loop Validation Harness
//!
//! This library drives a microcontroller/FPGA device over a serial link with
//! test vectors, reads back the results it computes, and scores each trial
//! against a precomputed golden reference.
//!
//! A run looks like this:
//!
//! ```no_run
//! use hil::{open_serial, GoldenReference, HarnessConfig, LineTransport, TrialRunner};
//! use hil::transport::PORT_READ_TIMEOUT;
//!
//! # fn main() -> hil::Result<()> {
//! let config = HarnessConfig::default();
//! let reference = GoldenReference::load("goldenReference.dat", 10_000)?;
//! let port = open_serial("/dev/ttyUSB0", 115_200, PORT_READ_TIMEOUT)?;
//! let mut runner = TrialRunner::new(LineTransport::new(port, config.transport), config.run);
//! let report = runner.run(&reference)?;
//! println!("{} failures", report.failures);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod decoder;
pub mod error;
pub mod reference;
pub mod runner;
pub mod scoring;
pub mod transport;

#[cfg(test)]
mod mock;

pub use capture::capture_responses;
pub use config::{HarnessConfig, RunConfig, TransportConfig};
pub use decoder::{decode_trial, receive_trial, TrialResult};
pub use error::{HarnessError, Result};
pub use reference::{ExpectedOutput, GoldenReference};
pub use runner::{RunReport, TrialOutcome, TrialRunner};
pub use scoring::{mse, MeanSquaredError, Scorer, TrialScore};
pub use transport::{list_ports, open_serial, LineTransport};
