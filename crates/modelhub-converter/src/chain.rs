//! The ordered converter chain producing the canonical glTF scene.
//!
//! Pre-conversion strategies matching the input extension run first and are
//! best-effort: a failure is logged and the chain moves on with the input it
//! had. The primary converter then runs against whatever input survived,
//! and its output is checked on disk independently of its exit code.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use modelhub_core::config::{ConverterConfig, PreconversionSpec};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::ConversionError;
use crate::executor::{ProcessExecutor, substitute_args};

/// Stage name used for the primary converter in errors and logs.
pub const PRIMARY_STAGE: &str = "primary";

/// What the chain did for one conversion.
#[derive(Debug)]
pub struct ConversionReport {
    /// The file the primary converter was given.
    pub converted_from: PathBuf,
    /// The pre-conversion stage whose output was used, if any.
    pub preconverted_by: Option<String>,
    /// Pre-conversion failures that were skipped over.
    pub skipped: Vec<ConversionError>,
    /// Size of the produced scene.
    pub output_bytes: u64,
    /// Wall time of the whole chain.
    pub duration_ms: u64,
}

/// Converter chain built from [`ConverterConfig`].
#[derive(Debug, Clone)]
pub struct ConversionChain {
    config: ConverterConfig,
    executor: ProcessExecutor,
}

impl ConversionChain {
    /// Build the chain.
    pub fn new(config: ConverterConfig) -> Self {
        let executor = ProcessExecutor::new(Duration::from_secs(config.timeout_seconds));
        Self { config, executor }
    }

    /// The configuration in force.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert `input` into a scene at `output`.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ConversionReport, ConversionError> {
        let start = Instant::now();
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut current = input.to_path_buf();
        let mut preconverted_by = None;
        let mut skipped = Vec::new();

        for spec in self
            .config
            .preconversions
            .iter()
            .filter(|s| s.applies_to(&extension))
        {
            match self.preconvert(spec, &current, cancel).await {
                Ok(intermediate) => {
                    info!(stage = %spec.name, output = %intermediate.display(), "Pre-conversion succeeded");
                    current = intermediate;
                    preconverted_by = Some(spec.name.clone());
                    break;
                }
                Err(ConversionError::Cancelled) => return Err(ConversionError::Cancelled),
                Err(e) => {
                    warn!(stage = %spec.name, error = %e, "Pre-conversion failed, continuing with original input");
                    skipped.push(e);
                }
            }
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let primary = &self.config.primary;
        let mut template = primary.args.clone();
        if format_hint.is_some() {
            template.extend(primary.format_args.iter().cloned());
        }
        let args = substitute_args(&template, &current, output, format_hint);

        let result = self
            .executor
            .run(PRIMARY_STAGE, &primary.program, &args, cancel)
            .await?;
        if !result.success() {
            return Err(ConversionError::PrimaryConversionFailed {
                stage: PRIMARY_STAGE.to_string(),
                code: result.exit_code.unwrap_or(-1),
                stderr: result.stderr,
            });
        }

        let output_bytes = self.verify_output(output).await?;

        Ok(ConversionReport {
            converted_from: current,
            preconverted_by,
            skipped,
            output_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Run one pre-conversion strategy, returning the intermediate file.
    async fn preconvert(
        &self,
        spec: &PreconversionSpec,
        input: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ConversionError> {
        let mut intermediate = input.as_os_str().to_owned();
        intermediate.push(".");
        intermediate.push(&spec.output_extension);
        let intermediate = PathBuf::from(intermediate);

        let args = substitute_args(&spec.args, input, &intermediate, None);
        let failed = |reason: String| ConversionError::PreconversionFailed {
            stage: spec.name.clone(),
            reason,
        };

        let result = match self.executor.run(&spec.name, &spec.program, &args, cancel).await {
            Ok(result) => result,
            Err(ConversionError::Cancelled) => return Err(ConversionError::Cancelled),
            Err(e) => return Err(failed(e.to_string())),
        };
        if !result.success() {
            return Err(failed(format!(
                "exit code {}: {}",
                result.exit_code.unwrap_or(-1),
                result.stderr
            )));
        }
        if !tokio::fs::try_exists(&intermediate).await.unwrap_or(false) {
            return Err(failed(format!(
                "no output produced at {}",
                intermediate.display()
            )));
        }
        Ok(intermediate)
    }

    /// Check that the primary converter really wrote its output.
    async fn verify_output(&self, output: &Path) -> Result<u64, ConversionError> {
        let no_output = || ConversionError::ConversionProducedNoOutput {
            path: output.to_path_buf(),
        };
        let metadata = match tokio::fs::metadata(output).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(no_output()),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() || metadata.len() < self.config.min_output_bytes {
            return Err(no_output());
        }
        Ok(metadata.len())
    }
}
