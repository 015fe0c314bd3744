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

//! Color utilities.

use colored::Color;

use crate::Level;

const RESET: &str = "\x1b[0m";

/// Colors for different log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelColor {
    /// Color for debug level logs.
    pub debug: Color,
    /// Color for info level logs.
    pub info: Color,
    /// Color for warning level logs.
    pub warn: Color,
    /// Color for error level logs.
    pub error: Color,
    /// Color for fatal level logs.
    pub fatal: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            debug: Color::White,
            info: Color::Green,
            warn: Color::Yellow,
            error: Color::Red,
            fatal: Color::Magenta,
        }
    }
}

impl LevelColor {
    fn color(&self, level: Level) -> Color {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
            Level::Fatal => self.fatal,
        }
    }
}

/// An immutable table of escape sequences used to color level tags on the console.
///
/// The table is computed once, either explicitly or by [`Palette::detect`], and then handed to
/// the console sink. Formatting a tag never consults global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    prefixes: [String; 5],
    suffix: &'static str,
}

impl Default for Palette {
    fn default() -> Self {
        Palette::colored(LevelColor::default())
    }
}

impl Palette {
    /// Detect whether the current process should emit colors.
    ///
    /// This honors `NO_COLOR`, `CLICOLOR` and `CLICOLOR_FORCE`, and whether stdout is a
    /// terminal.
    pub fn detect() -> Palette {
        if colored::control::SHOULD_COLORIZE.should_colorize() {
            Palette::default()
        } else {
            Palette::plain()
        }
    }

    /// A palette that leaves level tags uncolored.
    pub fn plain() -> Palette {
        Palette {
            prefixes: Default::default(),
            suffix: "",
        }
    }

    /// A palette that colors each level tag with the given colors.
    pub fn colored(colors: LevelColor) -> Palette {
        let prefixes =
            Level::ALL.map(|level| format!("\x1b[{}m", colors.color(level).to_fg_str()));
        Palette {
            prefixes,
            suffix: RESET,
        }
    }

    /// Return whether this palette emits escape sequences.
    pub fn is_colored(&self) -> bool {
        !self.suffix.is_empty()
    }

    /// The escape sequence written before the tag of `level`.
    pub fn prefix(&self, level: Level) -> &str {
        &self.prefixes[level as usize]
    }

    /// The escape sequence written after every tag.
    pub fn suffix(&self) -> &'static str {
        self.suffix
    }

    /// Format the colored tag of `level`.
    pub fn colorize(&self, level: Level) -> String {
        format!("{}{}{}", self.prefix(level), level.tag(), self.suffix)
    }
}
