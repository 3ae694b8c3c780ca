use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Writes `log` records to standard error.
pub struct StderrLogger {
  max_level: LevelFilter,
}

impl StderrLogger {
  #[must_use]
  pub const fn new(max_level: LevelFilter) -> Self {
    Self { max_level }
  }

  /// Installs the logger. Call this once, before the first heap is created.
  pub fn init(self) -> Result<(), SetLoggerError> {
    let max_level = self.max_level;

    log::set_logger(Box::leak(Box::new(self)))?;
    log::set_max_level(max_level);
    Ok(())
  }
}

impl Log for StderrLogger {
  fn enabled(
    &self,
    metadata: &Metadata,
  ) -> bool {
    metadata.level() <= self.max_level
  }

  fn log(
    &self,
    record: &Record,
  ) {
    if !self.enabled(record.metadata()) {
      return;
    }

    // Format: "[LEVEL] target: message"
    let _ = writeln!(
      std::io::stderr().lock(),
      "[{}] {}: {}",
      record.level(),
      record.target(),
      record.args()
    );
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}
