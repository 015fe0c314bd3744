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

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use jiff::Timestamp;
use jiff::Zoned;

/// The timestamp embedded in backup names. Lexical order follows time order.
pub(crate) const BACKUP_TIME_FORMAT: &str = "%Y_%m_%d-%H_%M_%S.%3f";

/// Build the backup name of `filename` by inserting `time` between the base name and the
/// extension, in the same directory.
///
/// `logs/svc.log` becomes `logs/svc-2024_08_10-17_12_52.123.log`.
pub(crate) fn backup_name(filename: &Path, time: &Zoned) -> PathBuf {
    let stamp = time.strftime(BACKUP_TIME_FORMAT).to_string();

    let mut name = OsString::new();
    if let Some(stem) = filename.file_stem() {
        name.push(stem);
    }
    name.push("-");
    name.push(stamp);
    if let Some(ext) = filename.extension() {
        name.push(".");
        name.push(ext);
    }

    filename.with_file_name(name)
}

/// Produces strictly increasing backup times at millisecond resolution.
///
/// Two rotations within the same millisecond would otherwise share a backup name, and the second
/// rename would replace the first backup.
#[derive(Debug, Default)]
pub(crate) struct BackupStamp {
    last_millis: Option<i64>,
}

impl BackupStamp {
    pub(crate) fn next(&mut self, now: Zoned) -> Zoned {
        let mut millis = now.timestamp().as_millisecond();
        if let Some(last) = self.last_millis {
            if millis <= last {
                millis = last + 1;
            }
        }
        self.last_millis = Some(millis);

        match Timestamp::from_millisecond(millis) {
            Ok(ts) => ts.to_zoned(now.time_zone().clone()),
            Err(_) => now,
        }
    }
}
