//! Opening, detection, buffers and read-only access

#[path = "testutils/mod.rs"]
mod testutils;

use rmfstore::backend::detect_backend;
use rmfstore::{Arity, BackendType, FileHandle, NodeId, NodeType, StoreConfig};
use tempfile::TempDir;
use testutils::init_logging;

/// Writes one node with one static value and closes the file
fn write_sample(file: FileHandle) {
    let node = file
        .get_root_node()
        .add_child("sample", NodeType::Representation)
        .unwrap();
    let category = file.add_category(Arity::NODE, "info").unwrap();
    let key = file.add_key::<String>(category, "label", false).unwrap();
    node.set_value(key, None, "hello".to_string()).unwrap();
    file.set_producer("persistence tests").unwrap();
    file.flush().unwrap();
}

fn read_label(file: &FileHandle) -> String {
    let category = file.get_category(Arity::NODE, "info").unwrap().unwrap();
    let key = file
        .get_key::<String>(category, "label", false)
        .unwrap()
        .unwrap();
    file.get_node_from_id(NodeId(1))
        .unwrap()
        .get_value(key, None)
        .unwrap()
}

#[test]
fn test_backend_is_detected_on_open() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let columnar = dir.path().join("columnar.rmf");
    let flat = dir.path().join("flat.rmf");
    write_sample(FileHandle::create(&columnar).unwrap());
    write_sample(FileHandle::create_with_config(&flat, &StoreConfig::flat()).unwrap());

    assert_eq!(detect_backend(&columnar).unwrap(), BackendType::Columnar);
    assert_eq!(detect_backend(&flat).unwrap(), BackendType::Flat);

    // the configured backend only applies to new files
    let file = FileHandle::open_with_config(&flat, &StoreConfig::default()).unwrap();
    assert_eq!(file.backend_type(), BackendType::Flat);
    assert_eq!(file.config().backend, BackendType::Flat);
    assert_eq!(read_label(&file), "hello");
    assert_eq!(file.get_producer().unwrap(), "persistence tests");
    drop(file);

    let file = FileHandle::open_with_config(&columnar, &StoreConfig::flat()).unwrap();
    assert_eq!(file.backend_type(), BackendType::Columnar);
    assert_eq!(read_label(&file), "hello");
    assert_eq!(file.path().as_deref(), Some(columnar.as_path()));
}

#[test]
fn test_open_rejects_foreign_files() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "not an rmf file").unwrap();
    assert!(FileHandle::open(&text).unwrap_err().is_io());
    assert!(FileHandle::open(dir.path().join("missing.rmf"))
        .unwrap_err()
        .is_io());
    // creating over a foreign file must not clobber it
    assert!(FileHandle::create(&text).unwrap_err().is_io());
    assert_eq!(std::fs::read_to_string(&text).unwrap(), "not an rmf file");
}

#[test]
fn test_create_replaces_existing_store() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.rmf");
    write_sample(FileHandle::create_with_config(&path, &StoreConfig::flat()).unwrap());
    assert!(path.is_file());

    let file = FileHandle::create(&path).unwrap();
    assert_eq!(file.get_number_of_nodes(), 1);
    file.flush().unwrap();
    drop(file);
    assert_eq!(detect_backend(&path).unwrap(), BackendType::Columnar);

    let file = FileHandle::create_with_config(&path, &StoreConfig::flat()).unwrap();
    assert_eq!(file.get_number_of_nodes(), 1);
    drop(file);
    assert_eq!(detect_backend(&path).unwrap(), BackendType::Flat);
}

#[test]
fn test_corrupt_flat_file_is_an_io_error() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flat.rmf");
    write_sample(FileHandle::create_with_config(&path, &StoreConfig::flat()).unwrap());

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();
    assert!(FileHandle::open(&path).unwrap_err().is_io());

    std::fs::write(&path, &bytes[..10]).unwrap();
    assert!(FileHandle::open(&path).unwrap_err().is_io());
}

#[test]
fn test_read_only_rejects_writes() {
    init_logging();
    let dir = TempDir::new().unwrap();
    for (name, config) in [
        ("columnar.rmf", StoreConfig::default()),
        ("flat.rmf", StoreConfig::flat()),
    ] {
        let path = dir.path().join(name);
        write_sample(FileHandle::create_with_config(&path, &config).unwrap());

        let file = FileHandle::open_read_only(&path).unwrap();
        assert!(file.is_read_only());
        assert_eq!(read_label(&file), "hello");
        let root = file.get_root_node();
        assert!(root
            .add_child("new", NodeType::Custom)
            .unwrap_err()
            .is_usage());
        assert!(file.set_description("nope").unwrap_err().is_usage());
        assert!(file
            .add_category(Arity::NODE, "fresh")
            .unwrap_err()
            .is_usage());
        let category = file.get_category(Arity::NODE, "info").unwrap().unwrap();
        let key = file
            .get_key::<String>(category, "label", false)
            .unwrap()
            .unwrap();
        assert!(root
            .set_value(key, None, "changed".to_string())
            .unwrap_err()
            .is_usage());
        // looking up existing keys still works
        assert_eq!(
            file.get_key_always::<String>(category, "label", false)
                .unwrap(),
            key
        );
        file.flush().unwrap();
    }
}

#[test]
fn test_buffer_round_trip() {
    init_logging();
    let file = FileHandle::create_in_buffer().unwrap();
    assert_eq!(file.path(), None);
    write_sample(file.clone());
    let bytes = file.to_buffer().unwrap();
    assert!(bytes.starts_with(b"RMFFLAT"));

    let copy = FileHandle::open_from_buffer(&bytes).unwrap();
    assert_eq!(read_label(&copy), "hello");
    copy.get_root_node()
        .add_child("extra", NodeType::Custom)
        .unwrap();
    assert_eq!(copy.get_number_of_nodes(), 3);
    assert_eq!(file.get_number_of_nodes(), 2);

    let frozen = FileHandle::open_buffer_read_only(&bytes).unwrap();
    assert!(frozen
        .get_root_node()
        .add_child("extra", NodeType::Custom)
        .unwrap_err()
        .is_usage());
    assert!(FileHandle::open_from_buffer(b"garbage").unwrap_err().is_io());
    assert!(file.lock().unwrap_err().is_usage());
}

#[test]
fn test_flat_file_exports_buffer_and_columnar_does_not() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let flat = FileHandle::create_with_config(dir.path().join("f.rmf"), &StoreConfig::flat())
        .unwrap();
    write_sample(flat.clone());
    let from_file = FileHandle::open_from_buffer(&flat.to_buffer().unwrap()).unwrap();
    assert_eq!(read_label(&from_file), "hello");

    let columnar = FileHandle::create_with_config(dir.path().join("c"), &StoreConfig::in_memory())
        .unwrap();
    assert!(columnar.to_buffer().unwrap_err().is_usage());
}

#[test]
fn test_reload_sees_flushed_state() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flat.rmf");
    let writer = FileHandle::create_with_config(&path, &StoreConfig::flat()).unwrap();
    writer.flush().unwrap();
    let reader = FileHandle::open_read_only(&path).unwrap();
    assert_eq!(reader.get_number_of_nodes(), 1);

    write_sample(writer);
    assert_eq!(reader.get_number_of_nodes(), 1);
    reader.reload().unwrap();
    assert_eq!(reader.get_number_of_nodes(), 2);
    assert_eq!(read_label(&reader), "hello");
}

#[test]
fn test_config_from_json() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("store.json");
    std::fs::write(
        &config_path,
        r#"{ "backend": "flat", "frames_hint": 8, "lock": { "max_attempts": 3 } }"#,
    )
    .unwrap();
    let config = StoreConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.backend, BackendType::Flat);
    assert_eq!(config.lock.max_attempts, 3);
    assert_eq!(config.lock.retry_interval_ms, 100);

    let file = FileHandle::create_with_config(dir.path().join("s.rmf"), &config).unwrap();
    assert_eq!(file.backend_type(), BackendType::Flat);
    assert!(StoreConfig::from_json_file(dir.path().join("absent.json"))
        .unwrap_err()
        .is_io());
}

#[test]
fn test_frames_hint_does_not_change_frame_counts() {
    init_logging();
    let config = StoreConfig {
        frames_hint: 32,
        ..StoreConfig::in_memory()
    };
    let file = FileHandle::create_with_config("hinted", &config).unwrap();
    let category = file.add_category(Arity::NODE, "physics").unwrap();
    let x = file.add_key::<f64>(category, "x", true).unwrap();
    let root = file.get_root_node();
    root.set_value(x, Some(1), 0.5).unwrap();
    assert_eq!(file.get_number_of_frames_for(x).unwrap(), 2);
    assert_eq!(file.get_number_of_frames().unwrap(), 2);
    assert!(!root.get_has_value(x, Some(20)).unwrap());
    assert!(file.footprint().unwrap() > 0);
}
