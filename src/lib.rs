pub mod api;
pub mod ast;
pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod utils;
mod serialization;

pub use api::{analyze, build, compile, expand_inputs, write_artifacts, AnalysisResult, Artifact, BuildReport, Compilation};
pub use ast::{FlatMap, ResolvedToken, TokenType, TokenValue};
pub use config::{BreakpointConfig, BuildOptions, OutputFormat, ThemeConfig};
pub use error::ShiftError;
pub use pipeline::{Pipeline, PipelineRegistry, Stage};
