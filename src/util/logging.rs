use env_logger::Builder;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::config::{LogLevel, LogShippingConfig};
use crate::util::shipper::ElasticShipper;

/// Build the console logger with the exporter's line format
fn console_logger(level: LevelFilter) -> env_logger::Logger {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);
    builder.build()
}

/// Initialize the logging system.
///
/// When shipping is enabled this must run inside a tokio runtime, since the
/// shipper spawns its drain task.
pub fn init(level: &LogLevel, shipping: &LogShippingConfig) -> Result<(), SetLoggerError> {
    let filter = level.to_level_filter();
    let mut composed = ComposedLogger::new()
        .with_logger(Box::new(console_logger(filter)))
        .with_global_level(filter);

    if shipping.enabled {
        composed = composed.with_logger(Box::new(ElasticShipper::spawn(shipping, filter)));
    }

    composed.init()
}

/// Fans each record out to every enabled inner logger
pub struct ComposedLogger {
    loggers: Vec<Box<dyn Log>>,
    global_filter: Option<LevelFilter>,
}

impl ComposedLogger {
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
            global_filter: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn Log>) -> Self {
        self.loggers.push(logger);
        self
    }

    pub fn with_global_level(mut self, filter: LevelFilter) -> Self {
        self.global_filter = Some(filter);
        self
    }

    pub fn init(self) -> Result<(), SetLoggerError> {
        let global_filter = self.global_filter.unwrap_or(LevelFilter::Info);
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(global_filter);
        Ok(())
    }
}

impl Default for ComposedLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for ComposedLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        if let Some(filter) = self.global_filter {
            if metadata.level() > filter {
                return false;
            }
        }
        self.loggers.iter().any(|logger| logger.enabled(metadata))
    }

    fn log(&self, record: &Record<'_>) {
        if let Some(filter) = self.global_filter {
            if record.level() > filter {
                return;
            }
        }
        for logger in &self.loggers {
            if logger.enabled(record.metadata()) {
                logger.log(record);
            }
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct CapturingLogger {
        min_level: Level,
        captured: Arc<Mutex<Vec<Level>>>,
    }

    impl CapturingLogger {
        fn new(min_level: Level) -> Self {
            Self {
                min_level,
                captured: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn levels(&self) -> Vec<Level> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl Log for CapturingLogger {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= self.min_level
        }

        fn log(&self, record: &Record<'_>) {
            self.captured.lock().unwrap().push(record.level());
        }

        fn flush(&self) {}
    }

    fn dispatch(logger: &ComposedLogger, level: Level) {
        logger.log(
            &Record::builder()
                .args(format_args!("scrape"))
                .level(level)
                .target("azure_exporter")
                .build(),
        );
    }

    #[test]
    fn test_each_logger_keeps_its_own_threshold() {
        let verbose = CapturingLogger::new(Level::Debug);
        let quiet = CapturingLogger::new(Level::Error);
        let composed = ComposedLogger::new()
            .with_logger(Box::new(verbose.clone()))
            .with_logger(Box::new(quiet.clone()));

        dispatch(&composed, Level::Info);
        dispatch(&composed, Level::Error);
        dispatch(&composed, Level::Trace);

        assert_eq!(verbose.levels(), vec![Level::Info, Level::Error]);
        assert_eq!(quiet.levels(), vec![Level::Error]);
    }

    #[test]
    fn test_global_level_blocks_below_threshold() {
        let verbose = CapturingLogger::new(Level::Trace);
        let composed = ComposedLogger::new()
            .with_logger(Box::new(verbose.clone()))
            .with_global_level(LevelFilter::Warn);

        dispatch(&composed, Level::Info);
        dispatch(&composed, Level::Warn);

        assert_eq!(verbose.levels(), vec![Level::Warn]);
        let info = Metadata::builder().level(Level::Info).build();
        assert!(!composed.enabled(&info));
    }
}
