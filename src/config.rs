//! Harness configuration.
//!
//! Every tunable that the device protocol or the pass/fail rule depends on
//! lives here with its default, rather than inline in the logic.

use std::time::Duration;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Timing of the line transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Pause after each transmitted value. The device has no hardware
    /// handshaking, so this keeps its input buffer from overrunning.
    pub inter_element_delay: Duration,
    /// Sleep before retrying after an empty line or an empty read.
    pub poll_interval: Duration,
    /// Upper bound on the wait for one non-empty line. `None` waits forever.
    pub response_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            inter_element_delay: Duration::from_millis(10),
            poll_interval: Duration::from_millis(200),
            response_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Scoring and accumulation settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// A trial fails when either MSE is strictly greater than this.
    pub threshold: f64,
    /// The run stops as soon as the failure count exceeds this.
    pub failure_cap: usize,
    /// Device clock cycles per millisecond, used to convert elapsed cycles.
    pub cycles_per_ms: f64,
    /// Require the response labels to be exactly `elapsed`, `u`, `x`.
    pub strict_labels: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            failure_cap: 50,
            cycles_per_ms: 325e3,
            strict_labels: false,
        }
    }
}

/// Complete harness configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessConfig {
    /// Serial line timing.
    pub transport: TransportConfig,
    /// Scoring and early-stop settings.
    pub run: RunConfig,
}
