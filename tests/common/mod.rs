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

#![allow(dead_code)]

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use namedlog::Error;
use namedlog::Palette;
use namedlog::Registry;
use namedlog::Trap;

/// An in-memory console shared with the test.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

/// A trap keeping every error it receives.
#[derive(Clone, Debug, Default)]
pub struct CollectingTrap(Arc<Mutex<Vec<Error>>>);

impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(Error::new(err.kind(), err.to_string()));
    }
}

impl CollectingTrap {
    pub fn errors(&self) -> Vec<Error> {
        self.0.lock().unwrap().drain(..).collect()
    }
}

/// A registry writing plain console records into a buffer.
pub fn buffered_registry() -> (Registry, Buffer) {
    let buffer = Buffer::default();
    let registry = Registry::builder()
        .console_writer(buffer.clone())
        .palette(Palette::plain())
        .build();
    (registry, buffer)
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}
