use crate::error::ConfigError;
use crate::pipeline::DEFAULT_PIPELINE;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Theme name -> CSS selector, e.g. `dark` -> `:root .dark`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeConfig(IndexMap<String, String>);

/// Breakpoint name -> media query condition, e.g. `md` -> `(min-width: 768px)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointConfig(IndexMap<String, String>);

fn parse_named_map(text: &str) -> Result<IndexMap<String, String>, String> {
    let map: IndexMap<String, String> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if let Some((name, _)) = map.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(format!("`{name}` has an empty value"));
    }
    Ok(map)
}

impl ThemeConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        parse_named_map(text)
            .map(Self)
            .map_err(|reason| ConfigError::InvalidThemes { reason })
    }

    pub fn insert(&mut self, theme: impl Into<String>, selector: impl Into<String>) -> &mut Self {
        self.0.insert(theme.into(), selector.into());
        self
    }

    pub fn selector(&self, theme: &str) -> Option<&str> {
        self.0.get(theme).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl BreakpointConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        parse_named_map(text)
            .map(Self)
            .map_err(|reason| ConfigError::InvalidBreakpoints { reason })
    }

    pub fn insert(&mut self, name: impl Into<String>, condition: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), condition.into());
        self
    }

    pub fn condition(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An output artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Css,
    Json,
    #[serde(rename = "ts")]
    TypeScript,
    Vars,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Css,
        OutputFormat::Json,
        OutputFormat::TypeScript,
        OutputFormat::Vars,
    ];

    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Css => "tokens.css",
            OutputFormat::Json => "tokens.json",
            OutputFormat::TypeScript => "tokens.ts",
            OutputFormat::Vars => "vars.ts",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Css => "css",
            OutputFormat::Json => "json",
            OutputFormat::TypeScript => "ts",
            OutputFormat::Vars => "vars",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == name || (name == "typescript" && *format == OutputFormat::TypeScript))
            .ok_or_else(|| ConfigError::UnknownFormat {
                name: s.to_string(),
            })
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a build needs besides the token sources themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Glob pattern selecting the entry documents.
    pub input: String,
    pub out_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
    pub themes: ThemeConfig,
    pub breakpoints: BreakpointConfig,
    /// Transform pipeline name; `None` runs the default pipeline.
    pub pipeline: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            input: "tokens/**/*.yaml".to_string(),
            out_dir: PathBuf::from("dist"),
            formats: OutputFormat::ALL.to_vec(),
            themes: ThemeConfig::default(),
            breakpoints: BreakpointConfig::default(),
            pipeline: None,
        }
    }
}

impl BuildOptions {
    pub fn new(input: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        self.pipeline.as_deref().unwrap_or(DEFAULT_PIPELINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_config_keeps_order() {
        let themes = ThemeConfig::from_json(r#"{"light": ":root .light", "dark": ":root .dark"}"#).unwrap();
        assert_eq!(
            themes.iter().collect::<Vec<_>>(),
            vec![("light", ":root .light"), ("dark", ":root .dark")]
        );
        assert_eq!(themes.selector("dark"), Some(":root .dark"));
    }

    #[test]
    fn test_malformed_configs() {
        assert!(matches!(
            ThemeConfig::from_json(r#"["dark"]"#).unwrap_err(),
            ConfigError::InvalidThemes { .. }
        ));
        assert!(matches!(
            ThemeConfig::from_json(r#"{"dark": 1}"#).unwrap_err(),
            ConfigError::InvalidThemes { .. }
        ));
        assert!(matches!(
            BreakpointConfig::from_json(r#"{"md": "  "}"#).unwrap_err(),
            ConfigError::InvalidBreakpoints { .. }
        ));
        let breakpoints = BreakpointConfig::from_json(r#"{"md": "(min-width: 768px)"}"#).unwrap();
        assert_eq!(breakpoints.condition("md"), Some("(min-width: 768px)"));
    }

    #[test]
    fn test_output_formats() {
        assert_eq!("css".parse::<OutputFormat>().unwrap(), OutputFormat::Css);
        assert_eq!("TS".parse::<OutputFormat>().unwrap(), OutputFormat::TypeScript);
        assert_eq!("typescript".parse::<OutputFormat>().unwrap(), OutputFormat::TypeScript);
        assert_eq!(OutputFormat::Vars.file_name(), "vars.ts");
        assert!(matches!(
            "scss".parse::<OutputFormat>().unwrap_err(),
            ConfigError::UnknownFormat { ref name } if name == "scss"
        ));
    }

    #[test]
    fn test_default_pipeline_name() {
        let mut options = BuildOptions::new("tokens/*.yaml", "out");
        assert_eq!(options.pipeline_name(), "default");
        options.pipeline = Some("oklch".to_string());
        assert_eq!(options.pipeline_name(), "oklch");
    }
}
