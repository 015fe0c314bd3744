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

//! A log file rotated by size.
//!
//! # Example
//!
//! ```
//! use namedlog::sink::RotatingFileSink;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut sink = RotatingFileSink::open(dir.path().join("svc.log"), 1024 * 1024).unwrap();
//! sink.write("[INFO ]", "service started\n").unwrap();
//! ```

pub use rotating::RotatingFileSink;

mod backup;
mod clock;
mod rotating;

/// The default size limit of a log file, 100 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

/// The extension of the active log file of a logger.
pub const LOG_EXTENSION: &str = "log";
