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

//! Namedlog is a registry of named, leveled loggers with colored console output and size-rotated
//! log files.
//!
//! # Overview
//!
//! Each logger is registered once under a unique name and configured on its own: a minimum
//! level, console output, file output into `<dir>/<name>.log`, and optional date, time and
//! `file:line` parts. Configuration can also be applied by name, or to every logger at once
//! with the `"*"` wildcard. A file rotates when the next record would push it past its size
//! limit; the old file is kept beside it with a millisecond timestamp in its name.
//!
//! # Examples
//!
//! ```
//! use namedlog::Level;
//! use namedlog::Registry;
//!
//! let registry = Registry::global();
//! let logger = registry.register("svc").unwrap();
//! logger.set_level(Level::Info);
//! logger.set_call_site(true);
//!
//! logger.debug("dropped");
//! logger.info("listening");
//! ```
//!
//! Writing to files, configured by name:
//!
//! ```
//! use namedlog::Registry;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let registry = Registry::new();
//! registry.register("db").unwrap();
//!
//! registry.set_console_output_by_name("*", false).unwrap();
//! registry.set_file_output_by_name("db", dir.path()).unwrap();
//! registry.get("db").unwrap().warn("slow query");
//!
//! assert!(dir.path().join("db.log").exists());
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod sink;
pub mod trap;

mod call_site;
mod color;
mod env;
mod error;
mod level;
mod logger;
mod registry;

pub use call_site::CallSite;
pub use color::LevelColor;
pub use color::Palette;
pub use env::DEFAULT_FILTER_ENV;
pub use env::LevelDirectives;
pub use error::Error;
pub use error::ErrorKind;
pub use level::Level;
pub use logger::Config;
pub use logger::Emit;
pub use logger::Logger;
pub use registry::Registry;
pub use registry::RegistryBuilder;
pub use registry::SharedFileSink;
pub use registry::WILDCARD;
pub use trap::DefaultTrap;
pub use trap::Trap;
