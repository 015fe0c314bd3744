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

//! Attribute records to the source location that logged them.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use backtrace::Backtrace;

/// The directory name whose position becomes the cached path-trim offset.
const TRIM_MARKER: &str = "src";

/// The source position of a logging call, as reported by the caller itself.
///
/// Usually this is a [`Location`] obtained through `#[track_caller]`, or the file and line of a
/// `log` crate record. It marks the frame from which the call-site depth is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Anchor<'a> {
    pub(crate) file: &'a str,
    pub(crate) line: u32,
}

impl<'a> From<&'a Location<'a>> for Anchor<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Anchor {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// A `file:line` pair attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    file: String,
    line: u32,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl CallSite {
    /// The source file, trimmed by the logger's path offset.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The source line, or zero when it is unknown.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Capture the call site `depth` frames above `anchor`.
    ///
    /// This walks and resolves the whole stack, so it is comparatively costly and must not run
    /// while a logger lock is held.
    pub(crate) fn capture(anchor: Anchor<'_>, depth: usize, trim_offset: usize) -> CallSite {
        match resolve(anchor, depth) {
            Some((file, line)) => {
                let file = file.display().to_string();
                CallSite {
                    file: trim(&file, trim_offset).to_string(),
                    line,
                }
            }
            // without debug info the anchor is the best we know about the call itself
            None if depth == 0 => CallSite {
                file: anchor.file.to_string(),
                line: anchor.line,
            },
            None => CallSite {
                file: "???".to_string(),
                line: 0,
            },
        }
    }
}

/// Compute the path-trim offset from the resolved path of `anchor`.
///
/// The offset is the position of the first `src` in that path, or zero.
pub(crate) fn trim_offset(anchor: Anchor<'_>) -> usize {
    match resolve(anchor, 0) {
        Some((file, _)) => file
            .display()
            .to_string()
            .find(TRIM_MARKER)
            .unwrap_or_default(),
        None => 0,
    }
}

fn trim(file: &str, offset: usize) -> &str {
    if offset < file.len() && file.is_char_boundary(offset) {
        &file[offset..]
    } else {
        file
    }
}

fn resolve(anchor: Anchor<'_>, depth: usize) -> Option<(PathBuf, u32)> {
    let backtrace = Backtrace::new();

    // inlined functions show up as extra symbols of one frame, so count symbols
    let symbols = backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| (symbol.filename().map(PathBuf::from), symbol.lineno()))
        .collect::<Vec<_>>();

    let position = symbols.iter().position(|(file, line)| {
        *line == Some(anchor.line)
            && file
                .as_deref()
                .is_some_and(|file| file.ends_with(anchor.file))
    })?;

    match symbols.get(position + depth) {
        Some((Some(file), Some(line))) => Some((file.clone(), *line)),
        _ => None,
    }
}
