//! Line-oriented transport over the serial link.
//!
//! Host to device: one decimal number per line. Device to host: ASCII lines,
//! with stray empty lines in between that the receiver skips.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::TransportConfig;
use crate::error::{HarnessError, Result};

/// Read timeout handed to the serial driver. Short, so the response
/// deadline is checked often.
pub const PORT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Longest response line accepted before the stream is treated as garbage.
pub const MAX_LINE_LEN: usize = 4096;

/// Opens a serial port for the harness.
pub fn open_serial(
    port_name: &str,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<Box<dyn serialport::SerialPort>> {
    let port = serialport::new(port_name, baud_rate)
        .timeout(read_timeout)
        .open()?;
    tracing::info!("Opened {} at {} baud", port_name, baud_rate);
    Ok(port)
}

/// Names of the serial ports present on this machine.
pub fn list_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|port| port.port_name)
        .collect())
}

/// Exclusive owner of the device channel.
pub struct LineTransport<C> {
    channel: C,
    config: TransportConfig,
    // Bytes read past the last returned line.
    pending: Vec<u8>,
}

impl<C: Read + Write> LineTransport<C> {
    pub fn new(channel: C, config: TransportConfig) -> Self {
        Self {
            channel,
            config,
            pending: Vec::new(),
        }
    }

    /// Writes each value on its own line, pausing between values.
    pub fn send_vector(&mut self, values: &[f64]) -> Result<()> {
        for value in values {
            let token = format!("{value}\n");
            self.channel.write_all(token.as_bytes())?;
            self.channel.flush()?;
            tracing::debug!("-> {}", value);
            if !self.config.inter_element_delay.is_zero() {
                thread::sleep(self.config.inter_element_delay);
            }
        }
        Ok(())
    }

    /// Blocks until a non-empty line arrives and returns it trimmed.
    ///
    /// Fails with [`HarnessError::ResponseTimeout`] once the configured
    /// response timeout has elapsed without one.
    pub fn receive_line(&mut self) -> Result<String> {
        let started = Instant::now();
        let deadline = self
            .config
            .response_timeout
            .map(|timeout| started + timeout);
        let mut buf = [0u8; 128];

        loop {
            if let Some(line) = self.take_pending_line()? {
                if !line.is_empty() {
                    tracing::debug!("<- {}", line);
                    return Ok(line);
                }
                self.wait(started, deadline)?;
                continue;
            }

            match self.channel.read(&mut buf) {
                Ok(0) => self.wait(started, deadline)?,
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    if !self.pending.contains(&b'\n') {
                        self.check_line_length()?;
                        check_deadline(started, deadline)?;
                    }
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    check_deadline(started, deadline)?
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Releases the channel. Dropping a serial port closes it.
    pub fn into_inner(self) -> C {
        self.channel
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn take_pending_line(&mut self) -> Result<Option<String>> {
        let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        if !raw.is_ascii() {
            let text = String::from_utf8_lossy(&raw).trim().to_string();
            return Err(HarnessError::malformed(text, "non-ASCII bytes on the line"));
        }
        // ASCII is always valid UTF-8.
        let text = String::from_utf8_lossy(&raw);
        Ok(Some(text.trim().to_string()))
    }

    // A device babbling at the wrong baud rate never sends a terminator.
    fn check_line_length(&mut self) -> Result<()> {
        if self.pending.len() <= MAX_LINE_LEN {
            return Ok(());
        }
        let head: String = String::from_utf8_lossy(&self.pending).chars().take(64).collect();
        let len = self.pending.len();
        self.pending.clear();
        Err(HarnessError::malformed(
            head,
            format!("no line terminator within {len} bytes"),
        ))
    }

    fn wait(&self, started: Instant, deadline: Option<Instant>) -> Result<()> {
        check_deadline(started, deadline)?;
        thread::sleep(self.config.poll_interval);
        Ok(())
    }
}

fn check_deadline(started: Instant, deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(HarnessError::ResponseTimeout {
            waited_ms: started.elapsed().as_millis() as u64,
        }),
        _ => Ok(()),
    }
}
