use crate::ast::{FlatMap, TokenDocument};
use crate::config::{BuildOptions, OutputFormat};
use crate::error::{ConfigError, ShiftError};
use crate::format::{self, FormatContext};
use crate::loader::{load_documents, FsLoader, SourceLoader};
use crate::parser::Parser;
use crate::pipeline::PipelineRegistry;
use crate::resolver::resolve_documents;
use std::path::{Path, PathBuf};

/// One rendered output file, not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub format: OutputFormat,
    pub file_name: &'static str,
    pub contents: String,
}

/// The in-memory result of a build: the final token map and every requested
/// artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub tokens: FlatMap,
    pub artifacts: Vec<Artifact>,
}

impl Compilation {
    #[must_use]
    pub fn artifact(&self, format: OutputFormat) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.format == format)
    }
}

/// What [`build`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub inputs: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub token_count: usize,
}

/// Runs the whole pipeline in memory: load, resolve, transform, render.
///
/// Sources are read only through `loader`; nothing is written.
///
/// # Errors
///
/// Returns the first failure of any stage. An unknown pipeline name is
/// reported before any source is read.
pub fn compile(
    entries: &[PathBuf],
    options: &BuildOptions,
    loader: &dyn SourceLoader,
    registry: &PipelineRegistry,
) -> Result<Compilation, ShiftError> {
    let pipeline = registry.get(options.pipeline_name())?;

    let documents = load_documents(entries, loader)?;
    log::debug!("loaded {} documents", documents.len());

    let resolved = resolve_documents(&documents)?;
    let tokens = pipeline.run(&resolved)?;

    let context = FormatContext::new(options.themes.clone(), options.breakpoints.clone());
    let artifacts = options
        .formats
        .iter()
        .map(|&format| {
            let contents = format::render(format, &tokens, &context)?;
            Ok(Artifact {
                format,
                file_name: format.file_name(),
                contents,
            })
        })
        .collect::<Result<Vec<_>, ShiftError>>()?;

    Ok(Compilation { tokens, artifacts })
}

/// Expands the input glob into a sorted list of files.
///
/// # Errors
///
/// Fails on a malformed pattern, an unreadable match, or when nothing matches.
pub fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>, ShiftError> {
    let matches = glob::glob(pattern).map_err(|err| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })?;
    let mut inputs = Vec::new();
    for entry in matches {
        let path = entry.map_err(|err| ShiftError::Io {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        if path.is_file() {
            inputs.push(path);
        }
    }
    if inputs.is_empty() {
        return Err(ConfigError::NoInputs {
            pattern: pattern.to_string(),
        }
        .into());
    }
    inputs.sort();
    Ok(inputs)
}

/// Creates `out_dir` and writes every artifact into it.
///
/// # Errors
///
/// Returns [`ShiftError::Io`] naming the directory or file that failed.
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, ShiftError> {
    std::fs::create_dir_all(out_dir).map_err(|source| ShiftError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    artifacts
        .iter()
        .map(|artifact| {
            let path = out_dir.join(artifact.file_name);
            std::fs::write(&path, &artifact.contents).map_err(|source| ShiftError::Io {
                path: path.clone(),
                source,
            })?;
            log::debug!("wrote {}", path.display());
            Ok(path)
        })
        .collect()
}

/// Builds from the filesystem: expands `options.input`, compiles with the
/// built-in pipelines and writes the artifacts to `options.out_dir`.
///
/// The output directory is only touched once every stage has succeeded.
///
/// # Errors
///
/// Returns the first failure; in that case no file has been written.
pub fn build(options: &BuildOptions) -> Result<BuildReport, ShiftError> {
    let inputs = expand_inputs(&options.input)?;
    log::debug!("{} input files match `{}`", inputs.len(), options.input);

    let compilation = compile(&inputs, options, &FsLoader, &PipelineRegistry::default())?;
    let written = write_artifacts(&options.out_dir, &compilation.artifacts)?;

    log::info!(
        "built {} tokens from {} files into {} ({} artifacts)",
        compilation.tokens.len(),
        inputs.len(),
        options.out_dir.display(),
        written.len()
    );
    Ok(BuildReport {
        inputs,
        written,
        token_count: compilation.tokens.len(),
    })
}

/// The result of analysing a single in-memory document.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub document: TokenDocument,
    pub tokens: FlatMap,
}

impl AnalysisResult {
    /// The resolved tokens as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.tokens)
    }
}

/// Parses and resolves one document from a string. Its `imports` are recorded
/// but not followed, so aliases must target tokens in the same document.
///
/// # Errors
///
/// Returns a `ShiftError` if parsing or resolution fails.
pub fn analyze(source: &str, file_name: &str) -> Result<AnalysisResult, ShiftError> {
    let document = Parser::new_with_name(source, file_name).parse_document()?;
    let tokens = resolve_documents(std::slice::from_ref(&document))?;
    Ok(AnalysisResult { document, tokens })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::loader::MemoryLoader;

    #[test]
    fn test_analyze_to_json() {
        let source = r##"
props:
  COLORS__PRIMARY:
    value: "#0066ff"
    type: color
  BUTTON__BACKGROUND: "{COLORS__PRIMARY}"
"##;
        let result = analyze(source, "tokens.yaml").unwrap();
        assert_eq!(result.document.props.len(), 2);

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "colors.primary": { "value": "#0066ff", "type": "color" },
                "button.background": {
                    "value": "#0066ff",
                    "type": "color",
                    "aliasOf": "colors.primary"
                }
            })
        );
    }

    #[test]
    fn test_compile_only_renders_requested_formats() {
        let loader = MemoryLoader::new().with(
            "tokens.yaml",
            "props:\n  SPACE:\n    value: {value: 4, unit: px}\n    type: dimension\n",
        );
        let mut options = BuildOptions::default();
        options.formats = vec![OutputFormat::Css, OutputFormat::Vars];

        let compilation = compile(
            &[PathBuf::from("tokens.yaml")],
            &options,
            &loader,
            &PipelineRegistry::default(),
        )
        .unwrap();
        assert_eq!(compilation.artifacts.len(), 2);
        assert_eq!(
            compilation.artifact(OutputFormat::Css).unwrap().contents,
            ":root {\n  --space: 4px;\n}\n"
        );
        assert!(compilation.artifact(OutputFormat::Json).is_none());
    }

    #[test]
    fn test_unknown_pipeline_fails_before_loading() {
        let mut options = BuildOptions::default();
        options.pipeline = Some("p3".to_string());
        let err = compile(
            &[PathBuf::from("missing.yaml")],
            &options,
            &MemoryLoader::new(),
            &PipelineRegistry::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::Pipeline(PipelineError::UnknownPipeline { ref name, .. }) if name == "p3"
        ));
    }
}
