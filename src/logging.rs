//! `log` backend for the browser console.
//!
//! Installed by the wasm start function. Native builds (and tests) never
//! install it, so library users keep whatever logger they already have.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

/// Forwards `log` records to `console.debug/info/warn/error`.
pub struct ConsoleLogger {
    level: LevelFilter,
}

static LOGGER: ConsoleLogger = ConsoleLogger {
    level: if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    },
};

impl ConsoleLogger {
    /// `[target] message`
    pub fn format(record: &Record<'_>) -> String {
        format!("[{}] {}", record.target(), record.args())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&Self::format(record));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install [`ConsoleLogger`] as the global logger. Returns false when some
/// logger was already installed.
pub fn init_logging() -> bool {
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(LOGGER.level);
            true
        }
        Err(_) => false,
    }
}
