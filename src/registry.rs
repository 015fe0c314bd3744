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

//! The registry of named loggers and the sinks they share.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Error;
use crate::ErrorKind;
use crate::Level;
use crate::Logger;
use crate::Palette;
use crate::call_site;
use crate::env::LevelDirectives;
use crate::sink::ConsoleSink;
use crate::sink::RotatingFileSink;
use crate::sink::rotating_file::DEFAULT_MAX_SIZE;
use crate::sink::rotating_file::LOG_EXTENSION;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// The name that addresses every registered logger in the `*_by_name` operations.
pub const WILDCARD: &str = "*";

/// A file sink shared between the registry and the logger bound to it.
pub type SharedFileSink = Arc<Mutex<RotatingFileSink>>;

/// State shared by a registry and all of its loggers.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) console: ConsoleSink,
    pub(crate) trap: Box<dyn Trap>,
    sinks: Mutex<HashMap<String, SharedFileSink>>,
    max_file_size: u64,
}

impl Shared {
    /// Bind the file sink of the logger `name` to `<dir>/<name>.log`.
    ///
    /// The first binding opens the file, moving a stale file aside. Later bindings only retarget
    /// the existing sink; it reopens lazily and keeps counting from where it was.
    pub(crate) fn bind_file_sink(&self, name: &str, dir: &Path) -> Result<SharedFileSink, Error> {
        let filename = dir.join(format!("{name}.{LOG_EXTENSION}"));

        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sink) = sinks.get(name) {
            let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.filename() != filename {
                guard.close()?;
                guard.set_filename(filename);
            }
            drop(guard);
            return Ok(sink.clone());
        }

        let sink = RotatingFileSink::open(filename, self.max_file_size)
            .map_err(|err| err.with_context("logger", name))?;
        let sink = Arc::new(Mutex::new(sink));
        sinks.insert(name.to_string(), sink.clone());
        Ok(sink)
    }
}

/// A builder for [`Registry`].
///
/// # Examples
///
/// ```
/// use namedlog::Palette;
/// use namedlog::Registry;
///
/// let registry = Registry::builder()
///     .console_writer(std::io::sink())
///     .palette(Palette::plain())
///     .max_file_size(1024 * 1024)
///     .build();
/// assert!(registry.is_empty());
/// ```
pub struct RegistryBuilder {
    writer: Option<Box<dyn Write + Send>>,
    palette: Option<Palette>,
    trap: Box<dyn Trap>,
    max_file_size: u64,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("palette", &self.palette)
            .field("trap", &self.trap)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            writer: None,
            palette: None,
            trap: Box::new(DefaultTrap::default()),
            max_file_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl RegistryBuilder {
    /// Write console records to `writer` instead of stdout.
    #[must_use]
    pub fn console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Color console level tags with `palette`.
    ///
    /// Without this, colors are used when the terminal supports them.
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Report sink failures to `trap`.
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Rotate file sinks created by this registry once they reach `max_file_size` bytes.
    ///
    /// Default to 100 MiB.
    #[must_use]
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Build the registry.
    pub fn build(self) -> Registry {
        let palette = self.palette.unwrap_or_else(Palette::detect);
        let console = match self.writer {
            Some(writer) => ConsoleSink::new(writer, palette),
            None => ConsoleSink::stdout(palette),
        };

        Registry {
            loggers: RwLock::new(HashMap::new()),
            shared: Arc::new(Shared {
                console,
                trap: self.trap,
                sinks: Mutex::new(HashMap::new()),
                max_file_size: self.max_file_size,
            }),
        }
    }
}

/// A set of uniquely named loggers sharing one console and a table of file sinks.
///
/// Most programs use the process-wide [`Registry::global`]. Independent registries are useful
/// for tests and embedding.
///
/// Lock order: the logger table, then a logger's state, then a file sink. The sink table is
/// never taken while a logger's state is held.
#[derive(Debug)]
pub struct Registry {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    shared: Arc<Shared>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Registry {
    /// Create a registry writing to stdout with default settings.
    pub fn new() -> Registry {
        Registry::builder().build()
    }

    /// Create a registry builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);
        &GLOBAL
    }

    /// Register a new logger called `name`.
    ///
    /// The logger starts at [`Level::Debug`], writes to the console with date and time, and
    /// has no file output.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::DuplicateName`] if `name` is taken, [`ErrorKind::InvalidConfig`] if `name` is
    /// empty or the wildcard.
    pub fn register(&self, name: impl Into<String>) -> Result<Arc<Logger>, Error> {
        let name = name.into();
        if name.is_empty() || name == WILDCARD {
            return Err(Error::new(ErrorKind::InvalidConfig, "invalid logger name")
                .with_context("name", name));
        }

        let mut loggers = self.write_loggers();
        if loggers.contains_key(&name) {
            return Err(Error::new(ErrorKind::DuplicateName, "logger already registered")
                .with_context("name", name));
        }

        let logger = Arc::new(Logger::new(name.clone(), self.shared.clone()));
        loggers.insert(name, logger.clone());
        Ok(logger)
    }

    /// Look up the logger called `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.read_loggers().get(name).cloned()
    }

    /// The number of registered loggers.
    pub fn len(&self) -> usize {
        self.read_loggers().len()
    }

    /// Return `true` if no logger is registered.
    pub fn is_empty(&self) -> bool {
        self.read_loggers().is_empty()
    }

    /// The names of all registered loggers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self.read_loggers().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Apply `f` to the logger called `name`, or to every registered logger for [`WILDCARD`].
    ///
    /// Loggers registered afterwards are not affected.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotFound`] if no logger is called `name`.
    pub fn visit<F>(&self, name: &str, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&Logger),
    {
        let loggers = self.read_loggers();
        if name == WILDCARD {
            loggers.values().for_each(|logger| f(logger));
            return Ok(());
        }

        match loggers.get(name) {
            Some(logger) => {
                f(logger);
                Ok(())
            }
            None => Err(Error::not_found(name)),
        }
    }

    /// Bind the file sink for the logger `name` to `<dir>/<name>.log`, creating it on first use.
    ///
    /// The sink is created even if no logger of that name is registered yet. Binding an existing
    /// sink to another directory closes it and keeps its byte counter.
    pub fn bind_file_sink(&self, name: &str, dir: impl AsRef<Path>) -> Result<SharedFileSink, Error> {
        self.shared.bind_file_sink(name, dir.as_ref())
    }

    /// Enable or disable the shared console for all loggers.
    pub fn enable_console(&self, enabled: bool) {
        self.shared.console.set_enabled(enabled);
    }

    /// The shared console sink.
    pub fn console(&self) -> &ConsoleSink {
        &self.shared.console
    }

    /// Set the threshold of the logger `name`, or of all loggers.
    pub fn set_level_by_name(&self, name: &str, level: Level) -> Result<(), Error> {
        self.visit(name, |logger| logger.set_level(level))
    }

    /// Set the threshold of the logger `name`, or of all loggers, from a level name.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidConfig`] if `level` is not a level name; no logger is changed then.
    pub fn set_level_by_str(&self, name: &str, level: &str) -> Result<(), Error> {
        let level = level.parse::<Level>()?;
        self.set_level_by_name(name, level)
    }

    /// Enable or disable console output of the logger `name`, or of all loggers.
    pub fn set_console_output_by_name(&self, name: &str, enabled: bool) -> Result<(), Error> {
        self.visit(name, |logger| logger.set_console_output(enabled))
    }

    /// Enable or disable the date part for the logger `name`, or for all loggers.
    pub fn set_include_date_by_name(&self, name: &str, enabled: bool) -> Result<(), Error> {
        self.visit(name, |logger| logger.set_include_date(enabled))
    }

    /// Enable or disable the time part for the logger `name`, or for all loggers.
    pub fn set_include_time_by_name(&self, name: &str, enabled: bool) -> Result<(), Error> {
        self.visit(name, |logger| logger.set_include_time(enabled))
    }

    /// Set the call-site depth of the logger `name`, or of all loggers.
    pub fn set_call_depth_by_name(&self, name: &str, depth: usize) -> Result<(), Error> {
        self.visit(name, |logger| logger.set_call_depth(depth))
    }

    /// Enable or disable call-site capture for the logger `name`, or for all loggers.
    ///
    /// See [`Logger::set_call_site`] for how captured paths are trimmed.
    #[track_caller]
    pub fn set_call_site_by_name(&self, name: &str, enabled: bool) -> Result<(), Error> {
        let offset = if enabled {
            call_site::trim_offset(Location::caller().into())
        } else {
            0
        };
        self.visit(name, |logger| logger.apply_call_site(enabled, offset))
    }

    /// Point file output of the logger `name`, or of all loggers, at `dir`; an empty `dir`
    /// disables file output.
    ///
    /// Every addressed logger is attempted. The first failure is returned.
    pub fn set_file_output_by_name(&self, name: &str, dir: impl AsRef<Path>) -> Result<(), Error> {
        let dir = dir.as_ref();
        let mut result = Ok(());
        self.visit(name, |logger| {
            if let Err(err) = logger.set_file_output(dir) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        })?;
        result
    }

    /// Set each logger's threshold from `directives`, matching directive targets against logger
    /// names.
    pub fn apply_directives(&self, directives: &LevelDirectives) {
        let loggers = self.read_loggers();
        for logger in loggers.values() {
            logger.set_level(directives.threshold_for(logger.name()));
        }
    }

    /// Remove all loggers and close and drop all file sinks.
    ///
    /// Loggers still held elsewhere keep working on the console. Their file output is disabled
    /// and cannot be enabled again. Close failures are reported to the trap once the registry is
    /// unlocked.
    pub fn clear(&self) {
        let mut failures = Vec::new();
        {
            let mut loggers = self.write_loggers();
            for logger in loggers.values() {
                if let Err(err) = logger.detach() {
                    failures.push(err.with_context("logger", logger.name()));
                }
            }

            let mut sinks = self.shared.sinks.lock().unwrap_or_else(PoisonError::into_inner);
            for (name, sink) in sinks.iter() {
                let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(err) = sink.close() {
                    failures.push(err.with_context("logger", name));
                }
            }
            sinks.clear();
            loggers.clear();
        }

        for err in failures {
            self.shared.trap.trap(&err);
        }
    }

    fn read_loggers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Logger>>> {
        self.loggers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_loggers(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Logger>>> {
        self.loggers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
