//! Renderers from a final [`FlatMap`] to output text.
//!
//! Formatters never resolve aliases or transform values; they print what the
//! earlier stages produced.

pub mod css;
pub mod json;
pub mod typescript;

use crate::ast::FlatMap;
use crate::config::{BreakpointConfig, OutputFormat, ThemeConfig};
use crate::error::FormatError;

/// Caller-supplied configuration the formatters may consult.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatContext {
    pub themes: ThemeConfig,
    pub breakpoints: BreakpointConfig,
}

impl FormatContext {
    pub fn new(themes: ThemeConfig, breakpoints: BreakpointConfig) -> Self {
        Self {
            themes,
            breakpoints,
        }
    }
}

/// Renders `tokens` in the given output format.
pub fn render(
    format: OutputFormat,
    tokens: &FlatMap,
    context: &FormatContext,
) -> Result<String, FormatError> {
    match format {
        OutputFormat::Css => Ok(css::format(tokens, context)),
        OutputFormat::Json => json::format(tokens),
        OutputFormat::TypeScript => typescript::declarations(tokens),
        OutputFormat::Vars => typescript::variables(tokens),
    }
}
