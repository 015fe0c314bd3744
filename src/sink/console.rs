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
use std::io;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::Level;
use crate::color::Palette;

/// The console destination shared by every logger of a registry.
///
/// Each line is written while holding a single lock, so lines coming from different loggers are
/// never interleaved.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    palette: Palette,
    enabled: AtomicBool,
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("palette", &self.palette)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        ConsoleSink::stdout(Palette::detect())
    }
}

impl ConsoleSink {
    /// Create a console sink that writes to stdout.
    pub fn stdout(palette: Palette) -> Self {
        ConsoleSink::new(io::stdout(), palette)
    }

    /// Create a console sink that writes to the given writer.
    pub fn new(writer: impl Write + Send + 'static, palette: Palette) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            palette,
            enabled: AtomicBool::new(true),
        }
    }

    /// Enable or disable console output for every logger.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Return whether console output is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Return the palette used to color level tags.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Write `<colored level tag> <text>`.
    ///
    /// When the console is disabled this is a no-op that succeeds.
    pub fn write(&self, level: Level, text: &str) -> Result<(), Error> {
        let mut writer = self.writer.lock().unwrap_or_else(|err| err.into_inner());
        if !self.is_enabled() {
            return Ok(());
        }

        let line = format!("{} {text}", self.palette.colorize(level));
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(Error::from_io_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_write_prefixes_colored_tag() {
        let buffer = Buffer::default();
        let console = ConsoleSink::new(buffer.clone(), Palette::default());

        console.write(Level::Warn, "svc careful\n").unwrap();
        assert_eq!(buffer.contents(), "\x1b[33m[WARN ]\x1b[0m svc careful\n");
    }

    #[test]
    fn test_disabled_console_writes_nothing() {
        let buffer = Buffer::default();
        let console = ConsoleSink::new(buffer.clone(), Palette::plain());

        console.set_enabled(false);
        console.write(Level::Error, "svc dropped\n").unwrap();
        assert_eq!(buffer.contents(), "");

        console.set_enabled(true);
        console.write(Level::Error, "svc kept\n").unwrap();
        assert_eq!(buffer.contents(), "[ERROR] svc kept\n");
    }
}
