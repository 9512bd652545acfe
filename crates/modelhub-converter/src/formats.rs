//! Recognized 3D model formats.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

macro_rules! define_model_formats {
    ($($variant:ident => $ext:literal),* $(,)?) => {
        static EXTENSION_MAP: LazyLock<HashMap<&'static str, ModelFormat>> = LazyLock::new(|| {
            HashMap::from([$(($ext, ModelFormat::$variant),)*])
        });

        impl ModelFormat {
            /// All extensions accepted as a model file.
            pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &[$($ext,)*];

            /// The canonical extension of this format.
            pub fn extension(&self) -> &'static str {
                match self {
                    $(Self::$variant => $ext,)*
                }
            }
        }
    };
}

define_model_formats! {
    Obj  => "obj",
    Dae  => "dae",
    Glb  => "glb",
    Gltf => "gltf",
    Stl  => "stl",
    Ply  => "ply",
    Fbx  => "fbx",
}

/// A 3D model format the converter chain accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// Wavefront OBJ.
    Obj,
    /// COLLADA.
    Dae,
    /// Binary glTF.
    Glb,
    /// glTF.
    Gltf,
    /// Stereolithography.
    Stl,
    /// Polygon File Format.
    Ply,
    /// Autodesk FBX.
    Fbx,
}

impl ModelFormat {
    /// Detect the format from a file name, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let (_, ext) = lower.rsplit_once('.')?;
        EXTENSION_MAP.get(ext).copied()
    }

    /// Detect the format from a path's final component.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
