//! Raw response capture.
//!
//! Records what the device sends for a number of trials without scoring it,
//! so new golden references can be built from a known-good device.

use std::io::{Read, Write};

use crate::decoder::RESPONSE_LABELS;
use crate::error::Result;
use crate::transport::LineTransport;

/// Sends the initial conditions, then copies `trials` worth of response
/// lines to `out`, one per line. Returns the number of lines written.
pub fn capture_responses<C, W>(
    transport: &mut LineTransport<C>,
    initial_conditions: &[f64],
    trials: usize,
    out: &mut W,
) -> Result<usize>
where
    C: Read + Write,
    W: Write,
{
    transport.send_vector(initial_conditions)?;

    let total = trials * RESPONSE_LABELS.len();
    for written in 0..total {
        let line = transport.receive_line()?;
        writeln!(out, "{line}")?;
        if (written + 1) % (RESPONSE_LABELS.len() * 100) == 0 {
            tracing::info!(
                "Captured {} of {} trials",
                (written + 1) / RESPONSE_LABELS.len(),
                trials
            );
        }
    }
    out.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::error::HarnessError;
    use crate::mock::ScriptedChannel;
    use std::time::Duration;

    fn transport(lines: &[&str]) -> LineTransport<ScriptedChannel> {
        let config = TransportConfig {
            inter_element_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            response_timeout: Some(Duration::from_millis(100)),
        };
        LineTransport::new(ScriptedChannel::with_lines(lines), config)
    }

    #[test]
    fn captures_three_lines_per_trial() {
        let mut transport = transport(&[
            "elapsed:10", "", "u:0.5", "x:1;2", "elapsed:11  ", "u:0.6", "x:1;3", "extra:1",
        ]);
        let mut out = Vec::new();
        let written = capture_responses(&mut transport, &[0.8, -0.4], 2, &mut out).unwrap();

        assert_eq!(written, 6);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "elapsed:10\nu:0.5\nx:1;2\nelapsed:11\nu:0.6\nx:1;3\n"
        );
        assert_eq!(transport.channel().written_text(), "0.8\n-0.4\n");
    }

    #[test]
    fn short_capture_times_out() {
        let mut transport = transport(&["elapsed:10", "u:0.5"]);
        let mut out = Vec::new();
        let err = capture_responses(&mut transport, &[0.0], 1, &mut out).unwrap_err();
        assert!(matches!(err, HarnessError::ResponseTimeout { .. }));
    }

    #[test]
    fn capture_to_file() {
        let mut transport = transport(&["elapsed:1", "u:2", "x:3"]);
        let mut file = tempfile::tempfile().unwrap();
        capture_responses(&mut transport, &[], 1, &mut file).unwrap();

        use std::io::{Seek, SeekFrom};
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, "elapsed:1\nu:2\nx:3\n");
    }
}
