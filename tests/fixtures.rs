#![allow(dead_code)]
use std::path::PathBuf;

use std::sync::Once;

use yang_json::Schema;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}

pub fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .canonicalize()
        .unwrap()
}

pub fn example_schema_path() -> PathBuf {
    samples_dir().join("example-schema.json")
}

pub fn example_schema() -> Schema {
    Schema::from_path(example_schema_path()).expect("example schema loads")
}

/// A pretty-printed document covering every member shape.
pub fn system_json() -> PathBuf {
    samples_dir().join("system.json")
}

/// Compact, canonically ordered XML of a `system` container.
pub fn system_xml() -> PathBuf {
    samples_dir().join("system.xml")
}

/// XML of a `system` container with children out of schema order.
pub fn unsorted_xml() -> PathBuf {
    samples_dir().join("unsorted.xml")
}

pub fn read_sample(path: PathBuf) -> String {
    std::fs::read_to_string(path).expect("sample is readable")
}
