//! Advisory locking between handles
//!
//! Run serially: the tests time lock contention and a busy machine running
//! other tests in parallel makes the timings flaky.

#[path = "testutils/mod.rs"]
mod testutils;

use rmfstore::{FileHandle, LockConfig, NodeType, StoreConfig};
use std::time::{Duration, Instant};
use testutils::store_fixture::StoreFixture;

fn quick_lock() -> LockConfig {
    LockConfig {
        retry_interval_ms: 10,
        max_attempts: 3,
    }
}

#[test]
#[serial_test::serial]
fn test_lock_is_exclusive() {
    let fixture = StoreFixture::flat();
    let file = fixture.file();
    let guard = file.lock().unwrap();
    assert!(guard.path().exists());
    assert!(guard.path().to_string_lossy().ends_with(".rmf.lock"));

    let other = FileHandle::open(fixture.path()).unwrap();
    assert!(other.try_lock().unwrap().is_none());
    let err = other.lock_with(&quick_lock()).unwrap_err();
    assert!(err.is_io());

    let lock_path = guard.path().to_path_buf();
    drop(guard);
    assert!(!lock_path.exists());
    assert!(other.try_lock().unwrap().is_some());
    assert!(!lock_path.exists());
}

#[test]
#[serial_test::serial]
fn test_waiter_gets_lock_after_release() {
    let fixture = StoreFixture::flat();
    let path = fixture.path().to_path_buf();
    let guard = fixture.file().lock().unwrap();

    let waiter = std::thread::spawn(move || {
        let file = FileHandle::open(&path).unwrap();
        let started = Instant::now();
        let config = LockConfig {
            retry_interval_ms: 20,
            max_attempts: 100,
        };
        let guard = file.lock_with(&config).unwrap();
        let waited = started.elapsed();
        drop(guard);
        waited
    });

    std::thread::sleep(Duration::from_millis(150));
    drop(guard);
    let waited = waiter.join().unwrap();
    assert!(waited >= Duration::from_millis(100), "waited {:?}", waited);
}

#[test]
#[serial_test::serial]
fn test_release_leaves_flush_to_caller() {
    let fixture = StoreFixture::flat();
    let file = fixture.file();
    {
        let guard = file.lock().unwrap();
        guard
            .file()
            .get_root_node()
            .add_child("written under lock", NodeType::Custom)
            .unwrap();
    }
    let reader = FileHandle::open_read_only(fixture.path()).unwrap();
    assert_eq!(reader.get_number_of_nodes(), 1);

    file.flush().unwrap();
    reader.reload().unwrap();
    assert_eq!(reader.get_number_of_nodes(), 2);

    let guard = reader.lock().unwrap();
    drop(guard);
    assert_eq!(file.get_number_of_nodes(), 2);
}

#[test]
#[serial_test::serial]
fn test_lock_uses_configured_poller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.rmf");
    let config = StoreConfig {
        lock: quick_lock(),
        ..StoreConfig::flat()
    };
    let holder = FileHandle::create_with_config(&path, &config).unwrap();
    let _guard = holder.lock().unwrap();

    let contender = FileHandle::open_with_config(&path, &config).unwrap();
    let started = Instant::now();
    assert!(contender.lock().unwrap_err().is_io());
    // three attempts, two sleeps
    assert!(started.elapsed() < Duration::from_secs(2));
}

fn columnar_store(dir: &tempfile::TempDir) -> (std::path::PathBuf, FileHandle) {
    let path = dir.path().join("columnar.rmf");
    let file = FileHandle::create(&path).unwrap();
    file.get_root_node().add_child("held", NodeType::Custom).unwrap();
    file.flush().unwrap();
    (path, file)
}

#[test]
#[serial_test::serial]
fn test_columnar_open_times_out_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let (path, holder) = columnar_store(&dir);
    let config = StoreConfig {
        lock: quick_lock(),
        ..StoreConfig::default()
    };

    let started = Instant::now();
    let err = FileHandle::open_with_config(&path, &config).unwrap_err();
    assert!(err.is_io(), "{}", err);
    assert!(started.elapsed() < Duration::from_secs(2));

    drop(holder);
    let reopened = FileHandle::open_with_config(&path, &config).unwrap();
    assert_eq!(reopened.get_number_of_nodes(), 2);
}

#[test]
#[serial_test::serial]
fn test_columnar_open_waits_for_release() {
    let dir = tempfile::tempdir().unwrap();
    let (path, holder) = columnar_store(&dir);

    let waiter = std::thread::spawn(move || {
        let config = StoreConfig {
            lock: LockConfig {
                retry_interval_ms: 20,
                max_attempts: 100,
            },
            ..StoreConfig::default()
        };
        let started = Instant::now();
        let file = FileHandle::open_with_config(&path, &config).unwrap();
        let waited = started.elapsed();
        let guard = file.lock().unwrap();
        let nodes = guard.file().get_number_of_nodes();
        drop(guard);
        (waited, nodes)
    });

    std::thread::sleep(Duration::from_millis(150));
    drop(holder);
    let (waited, nodes) = waiter.join().unwrap();
    assert!(waited >= Duration::from_millis(100), "waited {:?}", waited);
    assert_eq!(nodes, 2);
}

#[test]
#[serial_test::serial]
fn test_columnar_lock_is_exclusive_between_clones() {
    let fixture = StoreFixture::columnar();
    let file = fixture.file();
    let guard = file.lock().unwrap();
    assert!(guard.path().to_string_lossy().ends_with(".rmf.lock"));

    let clone = file.clone();
    assert!(clone.try_lock().unwrap().is_none());
    assert!(clone.lock_with(&quick_lock()).unwrap_err().is_io());
    drop(guard);
    assert!(clone.try_lock().unwrap().is_some());
}
