// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bridge to forward logs from the `log` crate to named loggers.
//!
//! The target of a `log` record selects the logger by name, so `log::warn!(target: "svc", ...)`
//! goes to the logger registered as `svc`. Records for unknown targets are dropped.

use crate::Level;
use crate::Registry;
use crate::call_site::Anchor;

struct LogCrateProxy {
    registry: &'static Registry,
}

impl log::Log for LogCrateProxy {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.registry
            .get(metadata.target())
            .is_some_and(|logger| Level::from(metadata.level()) >= logger.level())
    }

    fn log(&self, record: &log::Record) {
        let Some(logger) = self.registry.get(record.target()) else {
            return;
        };

        let anchor = Anchor {
            file: record.file().unwrap_or("???"),
            line: record.line().unwrap_or_default(),
        };
        logger.emit(record.level().into(), record.args(), anchor);
    }

    fn flush(&self) {}
}

/// Set up the log crate global logger, forwarding to [`Registry::global`].
///
/// This should be called early in the execution of a Rust program. Any log events that occur
/// before initialization will be ignored.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// if let Err(err) = namedlog::bridge::try_setup_log_crate() {
///     eprintln!("failed to setup log crate: {err}");
/// }
/// ```
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    try_setup_log_crate_for(Registry::global())
}

/// Set up the log crate global logger, forwarding to `registry`.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate_for(registry: &'static Registry) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogCrateProxy { registry }))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger, forwarding to [`Registry::global`].
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// namedlog::bridge::setup_log_crate();
/// namedlog::Registry::global().register("app").unwrap();
/// log::info!(target: "app", "hello");
/// ```
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "namedlog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}
