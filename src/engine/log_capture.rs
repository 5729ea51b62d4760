//! Logger that prints through `env_logger` and mirrors every accepted record
//! into a channel the editor console drains.

use std::collections::VecDeque;
use std::sync::OnceLock;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Lines kept by the editor console.
pub const CONSOLE_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

static LOG_RECEIVER: OnceLock<Receiver<LogLine>> = OnceLock::new();

/// A receiving end of the captured log, or `None` when `install` was never
/// called (tests, embedders with their own logger).
pub fn subscribe() -> Option<Receiver<LogLine>> {
    LOG_RECEIVER.get().cloned()
}

struct LogCapture {
    inner: env_logger::Logger,
    sender: Sender<LogLine>,
}

impl log::Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.enabled(record.metadata()) {
            return;
        }
        self.inner.log(record);

        // Nobody listening is fine.
        let _ = self.sender.send(LogLine {
            level: record.level(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the capturing logger. `RUST_LOG` sets the filter, `info` by
/// default. Fails if a logger is already installed.
pub fn install() -> Result<(), log::SetLoggerError> {
    let inner =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let max_level = inner.filter();
    let (sender, receiver) = unbounded();

    log::set_boxed_logger(Box::new(LogCapture { inner, sender }))?;
    log::set_max_level(max_level);
    let _ = LOG_RECEIVER.set(receiver);
    Ok(())
}

/// Bounded history shown by the console window.
#[derive(Debug)]
pub struct ConsoleBuffer {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(CONSOLE_CAPACITY)
    }
}

impl ConsoleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: LogLine) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Moves everything waiting on `receiver` into the buffer.
    pub fn drain(&mut self, receiver: &Receiver<LogLine>) -> usize {
        let mut count = 0;
        for line in receiver.try_iter() {
            self.push(line);
            count += 1;
        }
        count
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
