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

use std::fmt;
use std::fmt::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use jiff::Zoned;

use crate::Error;
use crate::Level;
use crate::call_site;
use crate::call_site::Anchor;
use crate::call_site::CallSite;
use crate::registry::Shared;
use crate::registry::SharedFileSink;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S.%3f";

/// Which parts a logger writes and where it writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Prefix records with the local date, `2024-08-10`.
    pub include_date: bool,
    /// Prefix records with the local time, `17:12:52.123`.
    pub include_time: bool,
    /// Attribute records to the `file:line` that logged them.
    pub include_call_site: bool,
    /// Write records to the shared console.
    pub to_console: bool,
    /// Write records to the logger's rotating file.
    pub to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_date: true,
            include_time: true,
            include_call_site: false,
            to_console: true,
            to_file: false,
        }
    }
}

/// The outcome of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// The record was below the logger's threshold and nothing was written.
    Filtered,
    /// The record was dispatched to the enabled sinks.
    Emitted,
    /// A fatal record was dispatched. The caller is expected to stop.
    Fatal,
}

impl Emit {
    /// Return whether the record reached the sinks.
    pub fn is_emitted(&self) -> bool {
        matches!(self, Emit::Emitted | Emit::Fatal)
    }

    /// Return whether a fatal record was dispatched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Emit::Fatal)
    }
}

#[derive(Debug)]
struct State {
    threshold: Level,
    config: Config,
    call_depth: usize,
    trim_offset: usize,
    file: Option<SharedFileSink>,
    detached: bool,
}

/// A named logger.
///
/// Loggers are created by [`Registry::register`](crate::Registry::register) and shared as
/// `Arc<Logger>`. Each record is written as
///
/// ```text
/// console: <colored level> <name> [<date>] [<time>] [<file:line>] <message>
/// file:    <level> [<date>] [<time>] [<file:line>] <message>
/// ```
///
/// # Examples
///
/// ```
/// use namedlog::Level;
/// use namedlog::Registry;
///
/// let registry = Registry::new();
/// let logger = registry.register("svc").unwrap();
/// logger.set_level(Level::Warn);
///
/// assert!(!logger.info("dropped").is_emitted());
/// assert!(logger.warn("kept").is_emitted());
/// ```
pub struct Logger {
    name: String,
    shared: Arc<Shared>,
    state: Mutex<State>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl Logger {
    pub(crate) fn new(name: String, shared: Arc<Shared>) -> Self {
        Self {
            name,
            shared,
            state: Mutex::new(State {
                threshold: Level::Debug,
                config: Config::default(),
                call_depth: 0,
                trim_offset: 0,
                file: None,
                detached: false,
            }),
        }
    }

    /// The unique name of this logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The minimum level this logger emits.
    pub fn level(&self) -> Level {
        self.lock_state().threshold
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.lock_state().config
    }

    /// How many frames above the logging call the call site is taken from.
    pub fn call_depth(&self) -> usize {
        self.lock_state().call_depth
    }

    /// Log a message at `level`.
    ///
    /// Sink failures are not returned; they are reported to the registry's
    /// [`Trap`](crate::trap::Trap).
    #[track_caller]
    #[must_use = "a fatal record returns `Emit::Fatal` and expects the caller to stop"]
    pub fn log(&self, level: Level, message: impl fmt::Display) -> Emit {
        self.emit(level, &message, Location::caller().into())
    }

    /// Log a message at the debug level.
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) -> Emit {
        self.emit(Level::Debug, &message, Location::caller().into())
    }

    /// Log a message at the info level.
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) -> Emit {
        self.emit(Level::Info, &message, Location::caller().into())
    }

    /// Log a message at the warn level.
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) -> Emit {
        self.emit(Level::Warn, &message, Location::caller().into())
    }

    /// Log a message at the error level.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) -> Emit {
        self.emit(Level::Error, &message, Location::caller().into())
    }

    /// Log a message at the fatal level.
    ///
    /// A fatal record is never filtered. This always returns [`Emit::Fatal`] once the record has
    /// been dispatched, and the caller decides how to terminate.
    #[track_caller]
    #[must_use = "a fatal record expects the caller to stop"]
    pub fn fatal(&self, message: impl fmt::Display) -> Emit {
        self.emit(Level::Fatal, &message, Location::caller().into())
    }

    pub(crate) fn emit(&self, level: Level, message: &dyn fmt::Display, anchor: Anchor<'_>) -> Emit {
        let now = Zoned::now();
        let mut record = String::new();

        let (capture, depth, trim_offset) = {
            let state = self.lock_state();
            if level < state.threshold {
                return Emit::Filtered;
            }

            let config = state.config;
            if config.include_date {
                push_part(&mut record, now.strftime(DATE_FORMAT));
            }
            if config.include_time {
                push_part(&mut record, now.strftime(TIME_FORMAT));
            }
            (config.include_call_site, state.call_depth, state.trim_offset)
        };

        // Resolving the stack is costly, so it runs unlocked. Concurrent calls on this logger may
        // overlap here; each keeps its own call site, and the final writes below stay exclusive.
        if capture {
            push_part(&mut record, CallSite::capture(anchor, depth, trim_offset));
        }
        push_part(&mut record, message);
        if !record.ends_with('\n') {
            record.push('\n');
        }

        // Traps may log again, so failures are handed over once every lock is released.
        let mut failures = Vec::new();
        {
            let state = self.lock_state();
            if state.config.to_console {
                let text = format!("{} {record}", self.name);
                if let Err(err) = self.shared.console.write(level, &text) {
                    failures.push(err);
                }
            }
            if state.config.to_file {
                if let Some(sink) = &state.file {
                    let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Err(err) = sink.write(level.tag(), &record) {
                        failures.push(err);
                    }
                }
            }
        }
        for err in failures {
            self.trap(err);
        }

        if level == Level::Fatal {
            Emit::Fatal
        } else {
            Emit::Emitted
        }
    }

    /// Set the minimum level this logger emits.
    pub fn set_level(&self, level: Level) {
        self.lock_state().threshold = level;
    }

    /// Enable or disable writing to the shared console.
    pub fn set_console_output(&self, enabled: bool) {
        self.lock_state().config.to_console = enabled;
    }

    /// Enable or disable the date part of records.
    pub fn set_include_date(&self, enabled: bool) {
        self.lock_state().config.include_date = enabled;
    }

    /// Enable or disable the time part of records.
    pub fn set_include_time(&self, enabled: bool) {
        self.lock_state().config.include_time = enabled;
    }

    /// Set how many frames above the logging call the call site is taken from.
    ///
    /// Zero attributes a record to the line that called the logger; one to the caller of that
    /// function, and so on.
    pub fn set_call_depth(&self, depth: usize) {
        self.lock_state().call_depth = depth;
    }

    /// Enable or disable call-site capture.
    ///
    /// Enabling computes the path-trim offset once, from the path of the file calling this
    /// method: captured paths are cut at the position of its first `src` directory.
    #[track_caller]
    pub fn set_call_site(&self, enabled: bool) {
        let offset = if enabled {
            call_site::trim_offset(Location::caller().into())
        } else {
            0
        };
        self.apply_call_site(enabled, offset);
    }

    pub(crate) fn apply_call_site(&self, enabled: bool, trim_offset: usize) {
        let mut state = self.lock_state();
        state.config.include_call_site = enabled;
        if enabled {
            state.trim_offset = trim_offset;
        }
    }

    /// Write records to `<dir>/<name>.log`, or stop writing to a file if `dir` is empty.
    ///
    /// The file sink of a logger is created once and reused. Pointing it at another directory
    /// keeps its byte counter.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::WriteFailure`](crate::ErrorKind::WriteFailure) if the file cannot be created,
    /// and [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) if the logger was removed by
    /// [`Registry::clear`](crate::Registry::clear).
    pub fn set_file_output(&self, dir: impl AsRef<Path>) -> Result<(), Error> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return self.disable_file_output();
        }

        if self.lock_state().detached {
            return Err(self.detached_error());
        }
        let sink = self.shared.bind_file_sink(&self.name, dir)?;

        let mut state = self.lock_state();
        // a clear between binding and here has already closed and dropped the sink
        if state.detached {
            return Err(self.detached_error());
        }
        state.file = Some(sink);
        state.config.to_file = true;
        Ok(())
    }

    /// Stop writing to a file and close the bound file sink.
    ///
    /// The sink stays registered, so enabling file output again continues its byte counter.
    pub fn disable_file_output(&self) -> Result<(), Error> {
        let mut state = self.lock_state();
        state.config.to_file = false;
        match state.file.take() {
            Some(sink) => sink.lock().unwrap_or_else(PoisonError::into_inner).close(),
            None => Ok(()),
        }
    }

    /// Unbind from the registry: file output is disabled for good.
    pub(crate) fn detach(&self) -> Result<(), Error> {
        let mut state = self.lock_state();
        state.detached = true;
        state.config.to_file = false;
        match state.file.take() {
            Some(sink) => sink.lock().unwrap_or_else(PoisonError::into_inner).close(),
            None => Ok(()),
        }
    }

    fn detached_error(&self) -> Error {
        Error::not_found(&self.name).with_context("reason", "removed by clear")
    }

    fn trap(&self, err: Error) {
        self.shared.trap.trap(&err.with_context("logger", &self.name));
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_part(record: &mut String, part: impl fmt::Display) {
    if !record.is_empty() {
        record.push(' ');
    }
    // writing to a string never fails
    let _ = write!(record, "{part}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    fn quiet_logger(registry: &Registry, name: &str) -> Arc<Logger> {
        let logger = registry.register(name).unwrap();
        logger.set_console_output(false);
        logger
    }

    #[test]
    fn test_defaults() {
        let registry = Registry::new();
        let logger = registry.register("svc").unwrap();

        assert_eq!(logger.name(), "svc");
        assert_eq!(logger.level(), Level::Debug);
        assert_eq!(logger.call_depth(), 0);
        assert_eq!(logger.config(), Config::default());
        assert!(logger.config().to_console);
        assert!(!logger.config().to_file);
    }

    #[test]
    fn test_threshold_gates_records() {
        let registry = Registry::new();
        let logger = quiet_logger(&registry, "svc");
        logger.set_level(Level::Error);

        assert_eq!(logger.debug("a"), Emit::Filtered);
        assert_eq!(logger.info("b"), Emit::Filtered);
        assert_eq!(logger.warn("c"), Emit::Filtered);
        assert_eq!(logger.error("d"), Emit::Emitted);
    }

    #[test]
    fn test_fatal_ignores_threshold() {
        let registry = Registry::new();
        let logger = quiet_logger(&registry, "svc");
        logger.set_level(Level::Fatal);

        assert_eq!(logger.error("d"), Emit::Filtered);
        let emit = logger.fatal("boom");
        assert!(emit.is_fatal());
        assert!(emit.is_emitted());
    }

    #[test]
    fn test_log_at_fatal_reports_fatal() {
        let registry = Registry::new();
        let logger = quiet_logger(&registry, "svc");
        logger.set_level(Level::Fatal);

        assert_eq!(logger.log(Level::Warn, "a"), Emit::Filtered);
        assert_eq!(logger.log(Level::Fatal, "b"), Emit::Fatal);
    }

    #[test]
    fn test_push_part_separates_with_spaces() {
        let mut record = String::new();
        push_part(&mut record, "2024-08-10");
        push_part(&mut record, "svc.rs:3");
        push_part(&mut record, "hello");
        assert_eq!(record, "2024-08-10 svc.rs:3 hello");
    }

    #[test]
    fn test_call_site_toggle() {
        let registry = Registry::new();
        let logger = quiet_logger(&registry, "svc");

        logger.set_call_site(true);
        assert!(logger.config().include_call_site);
        logger.set_call_depth(2);
        assert_eq!(logger.call_depth(), 2);
        logger.set_call_site(false);
        assert!(!logger.config().include_call_site);
    }
}
