//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use modelhub_converter::{ArchiveExtractor, ConversionChain};
use modelhub_core::config::{CommandSpec, ConverterConfig};
use modelhub_database::{MemoryModelStore, ModelStore};
use modelhub_service::{AnnotationService, IngestService, ModelLayout};

/// Converter that copies its input to the output path.
pub const COPY_CONVERTER: &str = r#"cp "$1" "$2""#;

/// Converter that reports success without writing anything.
pub const SILENT_CONVERTER: &str = "exit 0";

/// Converter that fails outright.
pub const FAILING_CONVERTER: &str = "echo 'unsupported mesh' >&2; exit 1";

/// Converter that also emits a buffer and a texture next to the scene.
pub const ASSET_CONVERTER: &str = r#"cp "$1" "$2"; d=$(dirname "$2"); printf bin > "$d/model.bin"; mkdir -p "$d/textures"; printf png > "$d/textures/wood.png""#;

/// Copy converter that appends a line to `counter` on every run.
pub fn counting_converter(counter: &Path) -> String {
    format!(r#"echo run >> '{}'; cp "$1" "$2""#, counter.display())
}

/// Services over a scratch directory and an in-memory store.
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<MemoryModelStore>,
    pub layout: ModelLayout,
    pub ingest: IngestService,
    pub annotation: AnnotationService,
}

impl TestEnv {
    /// Environment whose primary converter runs `script` under `sh -c`.
    pub fn new(script: &str) -> Self {
        let store = Arc::new(MemoryModelStore::new());
        Self::with_store(script, store.clone(), store)
    }

    /// Environment whose services talk to `services_store`; `store` is the
    /// memory store behind it, kept for assertions.
    pub fn with_store(
        script: &str,
        services_store: Arc<dyn ModelStore>,
        store: Arc<MemoryModelStore>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = ModelLayout::new(dir.path().join("raw"), dir.path().join("partnet"));
        let ingest = IngestService::new(
            services_store.clone(),
            layout.clone(),
            ArchiveExtractor::default(),
            ConversionChain::new(fake_converter(script)),
            2,
        );
        let annotation = AnnotationService::new(services_store, layout.clone());
        Self {
            dir,
            store,
            layout,
            ingest,
            annotation,
        }
    }

    /// Identity directories under the raw root.
    pub fn raw_identities(&self) -> Vec<String> {
        identity_dirs(self.layout.raw_root())
    }

    /// Identity directories under the working root.
    pub fn working_identities(&self) -> Vec<String> {
        identity_dirs(self.layout.working_root())
    }
}

/// Converter config running `script` with `$1` = input, `$2` = output.
pub fn fake_converter(script: &str) -> ConverterConfig {
    ConverterConfig {
        primary: CommandSpec {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                script.to_string(),
                "converter".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            format_args: vec![],
        },
        preconversions: vec![],
        timeout_seconds: 30,
        min_output_bytes: 1,
    }
}

/// Build a zip archive in memory.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// An archive holding one small OBJ model plus a readme.
pub fn chair_archive() -> Vec<u8> {
    zip_bytes(&[
        ("chair/", b""),
        ("chair/chair.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"),
        ("chair/README.txt", b"a chair"),
    ])
}

/// Non-hidden directory names under `root`, sorted.
pub fn identity_dirs(root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}
