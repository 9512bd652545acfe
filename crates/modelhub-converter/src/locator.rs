//! Picks the single model file out of an extracted archive.

use crate::archive::ArchiveEntry;
use crate::error::ConversionError;
use crate::formats::ModelFormat;

/// Find the one file entry with a recognized model extension.
///
/// Directories and other files are ignored. Zero matches is
/// `NoModelFileFound`; a second match is `AmbiguousModelFile`.
pub fn locate_model_file(
    entries: &[ArchiveEntry],
) -> Result<(&ArchiveEntry, ModelFormat), ConversionError> {
    let mut found: Option<(&ArchiveEntry, ModelFormat)> = None;

    for entry in entries.iter().filter(|e| !e.is_dir) {
        let Some(format) = ModelFormat::from_path(&entry.path) else {
            continue;
        };
        if let Some((first, _)) = found {
            return Err(ConversionError::AmbiguousModelFile {
                first: first.path.clone(),
                second: entry.path.clone(),
            });
        }
        found = Some((entry, format));
    }

    found.ok_or(ConversionError::NoModelFileFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(path: &str) -> ArchiveEntry {
        ArchiveEntry {
            path: PathBuf::from(path),
            is_dir: false,
            size: 1,
        }
    }

    fn dir(path: &str) -> ArchiveEntry {
        ArchiveEntry {
            path: PathBuf::from(path),
            is_dir: true,
            size: 0,
        }
    }

    #[test]
    fn test_single_model_among_clutter() {
        let entries = vec![
            dir("scene"),
            file("scene/readme.txt"),
            file("scene/scene.bin"),
            file("scene/Scene.GLTF"),
            file("scene/textures/wood.png"),
        ];
        let (entry, format) = locate_model_file(&entries).unwrap();
        assert_eq!(entry.path, PathBuf::from("scene/Scene.GLTF"));
        assert_eq!(format, ModelFormat::Gltf);
    }

    #[test]
    fn test_no_model() {
        let entries = vec![file("readme.txt"), dir("model.obj")];
        assert!(matches!(
            locate_model_file(&entries),
            Err(ConversionError::NoModelFileFound)
        ));
    }

    #[test]
    fn test_two_models_is_ambiguous() {
        let entries = vec![file("a.obj"), file("b.obj")];
        match locate_model_file(&entries) {
            Err(ConversionError::AmbiguousModelFile { first, second }) => {
                assert_eq!(first, PathBuf::from("a.obj"));
                assert_eq!(second, PathBuf::from("b.obj"));
            }
            other => panic!("expected AmbiguousModelFile, got {other:?}"),
        }
    }
}
