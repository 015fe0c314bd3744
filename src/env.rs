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

//! Provides [`env_filter`](https://crates.io/crates/env_filter) based level directives for
//! loggers.

use std::borrow::Cow;
use std::str::FromStr;

use log::Metadata;

use crate::Error;
use crate::ErrorKind;
use crate::Level;

/// The default environment variable for level directives.
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// One or more comma-separated directives, matched against logger names.
///
/// The syntax is that of [`env_logger`](https://docs.rs/env_logger/#enabling-logging):
/// `"svc=warn,db=off,info"` sets `svc` to warn, turns `db` down to fatal records only, and puts
/// every other logger at info. A directive matches every logger whose name starts with its
/// target. Without any directive only errors and fatal records are enabled.
///
/// # Examples
///
/// ```
/// use namedlog::Level;
/// use namedlog::LevelDirectives;
///
/// let directives = LevelDirectives::parse("svc=warn,info").unwrap();
/// assert_eq!(directives.threshold_for("svc"), Level::Warn);
/// assert_eq!(directives.threshold_for("db"), Level::Info);
/// ```
#[derive(Debug)]
pub struct LevelDirectives(env_filter::Filter);

impl LevelDirectives {
    /// Parse a directive string.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidConfig`] if any directive is malformed.
    pub fn parse(directives: &str) -> Result<Self, Error> {
        let mut builder = env_filter::Builder::new();
        builder.try_parse(directives).map_err(|err| {
            Error::new(ErrorKind::InvalidConfig, "failed to parse level directives")
                .with_context("directives", directives)
                .with_source(err)
        })?;
        Ok(LevelDirectives(builder.build()))
    }

    /// Parse directives from the environment variable `RUST_LOG`.
    ///
    /// Return `Ok(None)` if the variable is not set.
    pub fn from_default_env() -> Result<Option<Self>, Error> {
        LevelDirectives::from_env(DEFAULT_FILTER_ENV)
    }

    /// Parse directives from the environment variable `name`.
    ///
    /// Return `Ok(None)` if the variable is not set.
    pub fn from_env<'a, E>(name: E) -> Result<Option<Self>, Error>
    where
        E: Into<Cow<'a, str>>,
    {
        let name = name.into();
        match std::env::var(&*name) {
            Ok(s) => LevelDirectives::parse(&s)
                .map(Some)
                .map_err(|err| err.with_context("env", name)),
            Err(_) => Ok(None),
        }
    }

    /// The threshold these directives give the logger `name`.
    ///
    /// That is the most verbose level enabled for `name` as a target, with `trace` counting as
    /// debug. If nothing is enabled, only fatal records pass.
    pub fn threshold_for(&self, name: &str) -> Level {
        const VERBOSE_FIRST: [log::Level; 5] = [
            log::Level::Trace,
            log::Level::Debug,
            log::Level::Info,
            log::Level::Warn,
            log::Level::Error,
        ];

        VERBOSE_FIRST
            .into_iter()
            .find(|&level| {
                let metadata = Metadata::builder().target(name).level(level).build();
                self.0.enabled(&metadata)
            })
            .map_or(Level::Fatal, Level::from)
    }
}

impl FromStr for LevelDirectives {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LevelDirectives::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_per_target() {
        let directives = LevelDirectives::parse("svc=warn,db=off,net=trace,info").unwrap();

        assert_eq!(directives.threshold_for("svc"), Level::Warn);
        assert_eq!(directives.threshold_for("db"), Level::Fatal);
        assert_eq!(directives.threshold_for("net"), Level::Debug);
        assert_eq!(directives.threshold_for("other"), Level::Info);
    }

    #[test]
    fn test_default_without_directives() {
        let directives = LevelDirectives::parse("").unwrap();
        assert_eq!(directives.threshold_for("svc"), Level::Error);
    }

    #[test]
    fn test_invalid_directives() {
        let err = "svc=loud".parse::<LevelDirectives>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_unset_env_is_none() {
        let directives = LevelDirectives::from_env("NAMEDLOG_TEST_SURELY_UNSET_VARIABLE").unwrap();
        assert!(directives.is_none());
    }
}
