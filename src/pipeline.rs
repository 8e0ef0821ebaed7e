use crate::ast::{ColorValue, FlatMap, TokenType, TokenValue};
use crate::color::{self, Rgba};
use crate::error::{PipelineError, TransformError};
use indexmap::IndexMap;
use serde::Serialize;

/// Name of the pipeline used when none is requested.
pub const DEFAULT_PIPELINE: &str = "default";

/// One value-rewriting step. Stages are plain descriptors so a registry can be
/// listed or serialized without running anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    /// Rewrites sRGB color values (and their overrides) as `oklch(...)`.
    Oklch,
}

impl Stage {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Oklch => "oklch",
        }
    }

    /// Applies the stage, producing a new map. The input is never modified.
    pub fn apply(&self, tokens: &FlatMap) -> Result<FlatMap, TransformError> {
        match self {
            Stage::Oklch => tokens
                .iter()
                .map(|(path, token)| {
                    let mut token = token.clone();
                    if token.kind == TokenType::Color {
                        token.value = self.convert_color(path, &token.value)?;
                        for value in token
                            .theme_values
                            .values_mut()
                            .chain(token.breakpoint_values.values_mut())
                        {
                            value.value = self.convert_color(path, &value.value)?;
                        }
                    }
                    Ok::<_, TransformError>((path.clone(), token))
                })
                .collect(),
        }
    }

    fn convert_color(&self, path: &str, value: &TokenValue) -> Result<TokenValue, TransformError> {
        let converted = match value {
            TokenValue::Color(ColorValue::Literal(text)) => color::to_oklch_string(text),
            TokenValue::Color(ColorValue::Components {
                color_space,
                components: [r, g, b],
                alpha,
            }) if color_space.eq_ignore_ascii_case("srgb") => {
                Some(Rgba::new(*r, *g, *b, alpha.unwrap_or(1.0)).to_oklch().to_string())
            }
            _ => None,
        };
        match converted {
            // Unsupported notations are left as they are.
            None => Ok(value.clone()),
            Some(text) if text.is_empty() => Err(TransformError::EmptyOutput {
                stage: self.name().to_string(),
                token: path.to_string(),
            }),
            Some(text) => Ok(TokenValue::Color(ColorValue::Literal(text))),
        }
    }
}

/// A named, ordered sequence of stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    pub name: String,
    pub description: String,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, description: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            stages,
        }
    }

    pub fn run(&self, tokens: &FlatMap) -> Result<FlatMap, TransformError> {
        let mut current = tokens.clone();
        for stage in &self.stages {
            log::debug!("pipeline `{}`: running stage `{}`", self.name, stage.name());
            current = stage.apply(&current)?;
        }
        Ok(current)
    }
}

/// Lookup table of pipelines by name.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PipelineRegistry {
    pipelines: IndexMap<String, Pipeline>,
}

impl Default for PipelineRegistry {
    /// The built-in pipelines: `default` (no stages) and `oklch`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Pipeline::new(
            DEFAULT_PIPELINE,
            "Emit values as written",
            Vec::new(),
        ));
        registry.register(Pipeline::new(
            "oklch",
            "Convert sRGB colors to OKLCH",
            vec![Stage::Oklch],
        ));
        registry
    }
}

impl PipelineRegistry {
    pub fn empty() -> Self {
        Self {
            pipelines: IndexMap::new(),
        }
    }

    /// Adds a pipeline, replacing and returning any previous one of the same name.
    pub fn register(&mut self, pipeline: Pipeline) -> Option<Pipeline> {
        self.pipelines.insert(pipeline.name.clone(), pipeline)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.values()
    }

    pub fn get(&self, name: &str) -> Result<&Pipeline, PipelineError> {
        self.pipelines
            .get(name)
            .ok_or_else(|| PipelineError::UnknownPipeline {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Dimension, OverrideValue, ResolvedToken};

    fn token(path: &str, kind: TokenType, value: TokenValue) -> (String, ResolvedToken) {
        (
            path.to_string(),
            ResolvedToken {
                path: path.to_string(),
                raw_path: path.split('.').map(str::to_string).collect(),
                value,
                kind,
                alias_of: None,
                description: None,
                category: None,
                theme_values: IndexMap::new(),
                breakpoint_values: IndexMap::new(),
            },
        )
    }

    fn literal(text: &str) -> TokenValue {
        TokenValue::Color(ColorValue::Literal(text.to_string()))
    }

    #[test]
    fn test_oklch_stage_converts_colors_and_overrides() {
        let (path, mut surface) = token("surface", TokenType::Color, literal("#ffffff"));
        surface.theme_values.insert(
            "dark".to_string(),
            OverrideValue {
                value: literal("#0066ff"),
                alias_of: Some("colors.primary".to_string()),
            },
        );
        let tokens: FlatMap = [(path, surface)].into_iter().collect();

        let converted = Stage::Oklch.apply(&tokens).unwrap();
        assert_eq!(converted["surface"].value, literal("oklch(1 0 0)"));
        let dark = &converted["surface"].theme_values["dark"];
        assert_eq!(dark.value, literal("oklch(0.5635 0.2408 260.82)"));
        assert_eq!(dark.alias_of.as_deref(), Some("colors.primary"));
        // input untouched
        assert_eq!(tokens["surface"].value, literal("#ffffff"));
    }

    #[test]
    fn test_oklch_stage_passes_through() {
        let tokens: FlatMap = [
            token("a", TokenType::Color, literal("oklch(0.5 0.1 200)")),
            token("b", TokenType::Color, literal("var(--brand)")),
            token("c", TokenType::Color, literal("rebeccapurple")),
            token("d", TokenType::String, TokenValue::String("#0066ff".to_string())),
            token(
                "e",
                TokenType::Dimension,
                TokenValue::Dimension(Dimension { value: 4.0, unit: "px".to_string() }),
            ),
            token(
                "f",
                TokenType::Color,
                TokenValue::Color(ColorValue::Components {
                    color_space: "display-p3".to_string(),
                    components: [0.0, 0.4, 1.0],
                    alpha: None,
                }),
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(Stage::Oklch.apply(&tokens).unwrap(), tokens);
    }

    #[test]
    fn test_oklch_stage_converts_srgb_components() {
        let tokens: FlatMap = [token(
            "accent",
            TokenType::Color,
            TokenValue::Color(ColorValue::Components {
                color_space: "srgb".to_string(),
                components: [1.0, 0.0, 0.0],
                alpha: None,
            }),
        )]
        .into_iter()
        .collect();
        let converted = Stage::Oklch.apply(&tokens).unwrap();
        assert_eq!(converted["accent"].value, literal("oklch(0.628 0.2577 29.23)"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = PipelineRegistry::default();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["default", "oklch"]);
        assert_eq!(registry.get("oklch").unwrap().stages, vec![Stage::Oklch]);

        match registry.get("hsluv").unwrap_err() {
            PipelineError::UnknownPipeline { name, available } => {
                assert_eq!(name, "hsluv");
                assert_eq!(available, "default, oklch");
            }
        }
    }

    #[test]
    fn test_default_pipeline_is_identity() {
        let tokens: FlatMap = [token("a", TokenType::Color, literal("#0066ff"))]
            .into_iter()
            .collect();
        let registry = PipelineRegistry::default();
        assert_eq!(registry.get(DEFAULT_PIPELINE).unwrap().run(&tokens).unwrap(), tokens);
    }

    #[test]
    fn test_register_custom_pipeline() {
        let mut registry = PipelineRegistry::empty();
        assert!(registry
            .register(Pipeline::new("web", "first", vec![]))
            .is_none());
        let previous = registry.register(Pipeline::new("web", "second", vec![Stage::Oklch]));
        assert_eq!(previous.unwrap().description, "first");
        assert_eq!(registry.pipelines().count(), 1);
    }

    #[test]
    fn test_registry_serializes_for_help_output() {
        let json = serde_json::to_value(PipelineRegistry::default()).unwrap();
        assert_eq!(json["oklch"]["stages"], serde_json::json!([{ "stage": "oklch" }]));
    }
}
