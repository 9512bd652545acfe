//! External converter command configuration.
//!
//! Argument templates may contain the placeholders `{input}`, `{output}`
//! and `{format}`; they are substituted per invocation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Converter chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConverterConfig {
    /// The primary converter that must produce the glTF scene.
    #[validate(nested)]
    pub primary: CommandSpec,
    /// Best-effort pre-conversion steps keyed by source extension.
    #[validate(nested)]
    pub preconversions: Vec<PreconversionSpec>,
    /// Per-process timeout in seconds.
    #[validate(range(min = 1, max = 86400))]
    pub timeout_seconds: u64,
    /// Minimum size in bytes for the produced scene to count as output.
    pub min_output_bytes: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            primary: CommandSpec::default(),
            preconversions: vec![PreconversionSpec::default()],
            timeout_seconds: 600,
            min_output_bytes: 1,
        }
    }
}

/// A single external program invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommandSpec {
    /// Executable name or path.
    #[validate(length(min = 1))]
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
    /// Extra arguments appended only when a format hint is supplied.
    pub format_args: Vec<String>,
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self {
            program: "blender".to_string(),
            args: vec![
                "--background".to_string(),
                "--python".to_string(),
                "convert_gltf.py".to_string(),
                "--".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            format_args: vec!["{format}".to_string()],
        }
    }
}

/// A best-effort conversion run before the primary converter.
///
/// When it succeeds, its output (`<input>.<output_extension>`) replaces the
/// input for the primary step. When it fails the original input is kept.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PreconversionSpec {
    /// Stage name used in logs and error messages.
    #[validate(length(min = 1))]
    pub name: String,
    /// Lowercase source extensions this step applies to.
    pub extensions: Vec<String>,
    /// Executable name or path.
    #[validate(length(min = 1))]
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
    /// Extension appended to the input path to form the output path.
    #[validate(length(min = 1))]
    pub output_extension: String,
}

impl Default for PreconversionSpec {
    fn default() -> Self {
        Self {
            name: "assimp-dae".to_string(),
            extensions: vec!["dae".to_string()],
            program: "assimp".to_string(),
            args: vec![
                "export".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
                "-f".to_string(),
                "gltf2".to_string(),
            ],
            output_extension: "gltf".to_string(),
        }
    }
}

impl PreconversionSpec {
    /// Returns `true` if this step applies to the given extension.
    pub fn applies_to(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain() {
        let config = ConverterConfig::default();
        assert_eq!(config.primary.program, "blender");
        assert_eq!(config.preconversions.len(), 1);
        assert!(config.preconversions[0].applies_to("DAE"));
        assert!(!config.preconversions[0].applies_to("obj"));
    }

    #[test]
    fn test_empty_program_rejected() {
        let mut config = ConverterConfig::default();
        config.primary.program.clear();
        assert!(config.validate().is_err());
    }
}
