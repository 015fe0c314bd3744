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

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use namedlog::Error;
use namedlog::ErrorKind;
use namedlog::Level;
use namedlog::Logger;
use namedlog::Palette;
use namedlog::Registry;
use namedlog::Trap;
use tempfile::TempDir;

use crate::common::Buffer;
use crate::common::CollectingTrap;
use crate::common::list_dir;

fn file_registry(max_file_size: u64) -> (Registry, CollectingTrap) {
    let trap = CollectingTrap::default();
    let registry = Registry::builder()
        .console_writer(std::io::sink())
        .palette(Palette::plain())
        .trap(trap.clone())
        .max_file_size(max_file_size)
        .build();
    (registry, trap)
}

fn file_only(registry: &Registry, name: &str) -> Arc<Logger> {
    let logger = registry.register(name).unwrap();
    logger.set_console_output(false);
    logger.set_include_date(false);
    logger.set_include_time(false);
    logger
}

#[test]
fn test_rotation_through_logger() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, trap) = file_registry(50);
    let logger = file_only(&registry, "svc");
    logger.set_file_output(temp_dir.path()).unwrap();

    // "[INFO ] " + 31 characters + "\n" is a 40 byte line
    let message = "m".repeat(30);
    for i in 0..3 {
        logger.info(format_args!("{message}{i}"));
    }

    let files = list_dir(temp_dir.path());
    assert_eq!(files.len(), 3, "{files:?}");
    assert_eq!(files[2], "svc.log");
    assert!(files[..2].iter().all(|f| f.starts_with("svc-") && f.ends_with(".log")));

    let active = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(active, format!("[INFO ] {message}2\n"));
    let first = fs::read_to_string(temp_dir.path().join(&files[0])).unwrap();
    assert_eq!(first, format!("[INFO ] {message}0\n"));
    assert!(trap.errors().is_empty());
}

#[test]
fn test_file_record_has_no_logger_name() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");
    logger.set_include_time(true);
    logger.set_file_output(temp_dir.path()).unwrap();

    logger.warn("disk low");

    let contents = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert!(contents.starts_with("[WARN ] "), "{contents}");
    assert!(contents.ends_with(" disk low\n"), "{contents}");
    assert!(!contents.contains("svc"), "{contents}");
}

#[test]
fn test_disable_then_enable_keeps_counter() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");
    logger.set_file_output(temp_dir.path()).unwrap();
    logger.info("one");

    logger.set_file_output("").unwrap();
    assert!(!logger.config().to_file);
    logger.info("two");

    let sink = registry.bind_file_sink("svc", temp_dir.path()).unwrap();
    {
        let sink = sink.lock().unwrap();
        assert!(!sink.is_open());
        assert_eq!(sink.written(), "[INFO ] one\n".len() as u64);
    }

    logger.set_file_output(temp_dir.path()).unwrap();
    logger.info("three");

    let contents = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(contents, "[INFO ] one\n[INFO ] three\n");
    assert_eq!(
        sink.lock().unwrap().written(),
        "[INFO ] one\n[INFO ] three\n".len() as u64
    );
    assert_eq!(list_dir(temp_dir.path()), ["svc.log"]);
}

#[test]
fn test_retarget_directory_keeps_counter() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");

    logger.set_file_output(temp_dir.path().join("a")).unwrap();
    logger.info("first");
    logger.set_file_output(temp_dir.path().join("b")).unwrap();
    logger.info("second");

    let a = fs::read_to_string(temp_dir.path().join("a").join("svc.log")).unwrap();
    let b = fs::read_to_string(temp_dir.path().join("b").join("svc.log")).unwrap();
    assert_eq!(a, "[INFO ] first\n");
    assert_eq!(b, "[INFO ] second\n");

    let sink = registry.bind_file_sink("svc", temp_dir.path().join("b")).unwrap();
    assert_eq!(
        sink.lock().unwrap().written(),
        "[INFO ] first\n[INFO ] second\n".len() as u64
    );
}

#[test]
fn test_stale_file_is_moved_aside() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    fs::write(temp_dir.path().join("svc.log"), "from a previous run\n").unwrap();

    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");
    logger.set_file_output(temp_dir.path()).unwrap();
    logger.error("fresh");

    let files = list_dir(temp_dir.path());
    assert_eq!(files.len(), 2, "{files:?}");
    let active = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(active, "[ERROR] fresh\n");
    let backup = fs::read_to_string(temp_dir.path().join(&files[0])).unwrap();
    assert_eq!(backup, "from a previous run\n");
}

#[test]
fn test_write_failure_goes_to_trap() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let dir = temp_dir.path().join("logs");
    let (registry, trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");

    logger.set_file_output(&dir).unwrap();
    logger.disable_file_output().unwrap();
    fs::remove_dir_all(&dir).unwrap();
    fs::write(&dir, "not a directory").unwrap();
    logger.set_file_output(&dir).unwrap();

    assert!(logger.info("lost").is_emitted());

    let errors = trap.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::WriteFailure);
    assert!(errors[0].message().contains("svc"), "{}", errors[0]);
}

#[test]
fn test_unusable_directory_is_returned() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");

    let err = logger.set_file_output(blocker.join("logs")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WriteFailure);
    assert!(!logger.config().to_file);
}

#[test]
fn test_file_output_by_name() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let a = file_only(&registry, "a");
    let b = file_only(&registry, "b");

    registry.set_file_output_by_name("*", temp_dir.path()).unwrap();
    a.info("from a");
    b.info("from b");
    assert_eq!(list_dir(temp_dir.path()), ["a.log", "b.log"]);

    let err = registry.set_file_output_by_name("c", temp_dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_clear_closes_files() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");
    logger.set_file_output(temp_dir.path()).unwrap();
    logger.info("before");

    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.get("svc").is_none());

    logger.info("after");
    let contents = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(contents, "[INFO ] before\n");
    assert!(trap.errors().is_empty());

    let again = file_only(&registry, "svc");
    again.set_file_output(temp_dir.path()).unwrap();
    assert_eq!(list_dir(temp_dir.path()).len(), 2);
}

#[test]
fn test_filtered_record_leaves_file_empty() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");
    logger.set_level(Level::Info);
    logger.set_file_output(temp_dir.path()).unwrap();

    assert!(!logger.debug("too verbose").is_emitted());

    let contents = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(contents, "");
    let sink = registry.bind_file_sink("svc", temp_dir.path()).unwrap();
    assert_eq!(sink.lock().unwrap().written(), 0);
}

#[test]
fn test_cleared_logger_cannot_enable_file_output() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let (registry, _trap) = file_registry(1024);
    let logger = file_only(&registry, "svc");

    registry.clear();

    let err = logger.set_file_output(temp_dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!logger.config().to_file);
    assert!(list_dir(temp_dir.path()).is_empty());

    let again = file_only(&registry, "svc");
    again.set_file_output(temp_dir.path()).unwrap();
    again.info("fresh");
    logger.info("console only");
    let contents = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
    assert_eq!(contents, "[INFO ] fresh\n");
}

/// Reacts to a failure by turning file output off and logging through the same logger.
#[derive(Clone, Debug, Default)]
struct FallbackTrap {
    logger: Arc<OnceLock<Arc<Logger>>>,
    kinds: Arc<Mutex<Vec<ErrorKind>>>,
}

impl Trap for FallbackTrap {
    fn trap(&self, err: &Error) {
        self.kinds.lock().unwrap().push(err.kind());
        if let Some(logger) = self.logger.get() {
            logger.disable_file_output().unwrap();
            logger.error("file output disabled");
        }
    }
}

#[test]
fn test_trap_may_use_the_failing_logger() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let dir = temp_dir.path().join("logs");
    let buffer = Buffer::default();
    let trap = FallbackTrap::default();
    let registry = Registry::builder()
        .console_writer(buffer.clone())
        .palette(Palette::plain())
        .trap(trap.clone())
        .build();

    let logger = registry.register("svc").unwrap();
    logger.set_include_date(false);
    logger.set_include_time(false);
    logger.set_file_output(&dir).unwrap();
    logger.disable_file_output().unwrap();
    fs::remove_dir_all(&dir).unwrap();
    fs::write(&dir, "not a directory").unwrap();
    logger.set_file_output(&dir).unwrap();
    trap.logger.set(logger.clone()).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let worker = logger.clone();
    thread::spawn(move || {
        worker.info("boom");
        done_tx.send(()).unwrap();
    });
    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("logging with a re-entrant trap never finished");

    assert_eq!(*trap.kinds.lock().unwrap(), [ErrorKind::WriteFailure]);
    assert!(!logger.config().to_file);
    assert_eq!(
        buffer.lines(),
        ["[INFO ] svc boom", "[ERROR] svc file output disabled"]
    );
}
