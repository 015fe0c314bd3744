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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::sink::rotating_file::DEFAULT_MAX_SIZE;
use crate::sink::rotating_file::backup::BackupStamp;
use crate::sink::rotating_file::backup::backup_name;
use crate::sink::rotating_file::clock::Clock;

/// A log file that is moved aside once it would grow past a size limit.
///
/// The sink counts the bytes written since the last rotation. When the next line would push the
/// count past [`max_size`](RotatingFileSink::max_size), the current file is renamed to a backup
/// with a local-time timestamp between its base name and extension, and a fresh file is created
/// at the original path. The crossing line becomes the first line of the new file.
///
/// The sink has no lock of its own. Every write takes `&mut self`; a registry shares it as a
/// [`SharedFileSink`](crate::SharedFileSink).
#[derive(Debug)]
pub struct RotatingFileSink {
    filename: PathBuf,
    max_size: u64,
    written: u64,
    file: Option<File>,
    stamp: BackupStamp,
    clock: Clock,
}

impl RotatingFileSink {
    /// Open a sink at `filename`, moving any existing file at that path aside first.
    pub fn open(filename: impl Into<PathBuf>, max_size: u64) -> Result<Self, Error> {
        let mut sink = RotatingFileSink::new(filename.into(), max_size, Clock::DefaultClock);
        sink.rotate()?;
        Ok(sink)
    }

    /// Open a sink at `filename` with the default size limit of 100 MiB.
    pub fn with_default_size(filename: impl Into<PathBuf>) -> Result<Self, Error> {
        RotatingFileSink::open(filename, DEFAULT_MAX_SIZE)
    }

    fn new(filename: PathBuf, max_size: u64, clock: Clock) -> Self {
        Self {
            filename,
            max_size,
            written: 0,
            file: None,
            stamp: BackupStamp::default(),
            clock,
        }
    }

    /// The path of the active log file.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Point the sink at another path.
    ///
    /// The byte counter is kept, and an open handle keeps writing to the previous file until the
    /// next rotation or reopen.
    pub fn set_filename(&mut self, filename: impl Into<PathBuf>) {
        self.filename = filename.into();
    }

    /// The size in bytes a file may reach before it is rotated.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Set the size in bytes a file may reach before it is rotated.
    pub fn set_max_size(&mut self, max_size: u64) {
        self.max_size = max_size;
    }

    /// The number of bytes written since the last rotation.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Return whether the sink currently holds an open file handle.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Write `<level_tag> <text>` to the active file and return the number of bytes written.
    ///
    /// The file is rotated first if the line would push it past the size limit. A closed sink
    /// reopens its file in append mode.
    pub fn write(&mut self, level_tag: &str, text: &str) -> Result<usize, Error> {
        let line = format!("{level_tag} {text}");

        let projected = self.written + line.len() as u64;
        if projected > self.max_size {
            self.rotate()?;
        }

        let file = match self.file.take() {
            Some(file) => file,
            None => self.open_append()?,
        };
        let file = self.file.insert(file);

        file.write_all(line.as_bytes()).map_err(|err| {
            Error::write_failure("failed to write log file", err)
                .with_context("path", self.filename.display())
        })?;
        self.written += line.len() as u64;
        Ok(line.len())
    }

    /// Close the active file, rename it to a timestamped backup if it exists, and start a fresh
    /// file at the same path.
    pub fn rotate(&mut self) -> Result<(), Error> {
        self.close()?;
        self.create_dir()?;

        if self.filename.exists() {
            let backup = self.next_backup_name();
            fs::rename(&self.filename, &backup).map_err(|err| {
                Error::write_failure("failed to rename log file", err)
                    .with_context("from", self.filename.display())
                    .with_context("to", backup.display())
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.filename)
            .map_err(|err| {
                Error::write_failure("failed to create log file", err)
                    .with_context("path", self.filename.display())
            })?;

        self.file = Some(file);
        self.written = 0;
        Ok(())
    }

    /// Flush and release the file handle. The byte counter is kept.
    pub fn close(&mut self) -> Result<(), Error> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        file.flush().map_err(|err| {
            Error::write_failure("failed to flush log file", err)
                .with_context("path", self.filename.display())
        })
    }

    fn next_backup_name(&mut self) -> PathBuf {
        loop {
            let time = self.stamp.next(self.clock.now());
            let backup = backup_name(&self.filename, &time);
            if !backup.exists() {
                return backup;
            }
        }
    }

    fn create_dir(&self) -> Result<(), Error> {
        let Some(dir) = self.filename.parent() else {
            return Ok(());
        };
        if dir.as_os_str().is_empty() {
            return Ok(());
        }

        fs::create_dir_all(dir).map_err(|err| {
            Error::write_failure("failed to create log directory", err)
                .with_context("path", dir.display())
        })
    }

    fn open_append(&self) -> Result<File, Error> {
        self.create_dir()?;
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.filename)
            .map_err(|err| {
                Error::write_failure("failed to open log file", err)
                    .with_context("path", self.filename.display())
            })
    }
}
