//! Scripted in-memory serial channel for unit tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

/// One scripted result for a `read` call.
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Bytes handed back by the next read.
    Data(Vec<u8>),
    /// The port's own read timeout fires.
    Idle,
    /// The read fails with this error kind.
    Fail(io::ErrorKind),
}

/// A serial stand-in that replays scripted reads and records every write.
///
/// Once the script is exhausted every read behaves like an idle port,
/// unless a repeating payload was set with [`ScriptedChannel::repeat_forever`].
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    script: VecDeque<ReadStep>,
    repeat: Option<(Vec<u8>, Duration)>,
    pub written: Vec<u8>,
    pub flushes: usize,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues each line, newline-terminated, as its own read.
    pub fn with_lines(lines: &[&str]) -> Self {
        let mut channel = Self::new();
        for line in lines {
            channel.push_data(format!("{line}\n"));
        }
        channel
    }

    pub fn push_data(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.script.push_back(ReadStep::Data(data.into()));
        self
    }

    pub fn push(&mut self, step: ReadStep) -> &mut Self {
        self.script.push_back(step);
        self
    }

    /// After the script runs out, every read returns `data` after `delay`.
    pub fn repeat_forever(&mut self, data: impl Into<Vec<u8>>, delay: Duration) -> &mut Self {
        self.repeat = Some((data.into(), delay));
        self
    }

    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.script.is_empty() {
            if let Some((data, delay)) = &self.repeat {
                if !delay.is_zero() {
                    thread::sleep(*delay);
                }
                self.script.push_back(ReadStep::Data(data.clone()));
            }
        }
        match self.script.pop_front() {
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.script.push_front(ReadStep::Data(data.split_off(n)));
                }
                Ok(n)
            }
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(ReadStep::Idle) | None => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out"))
            }
        }
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
