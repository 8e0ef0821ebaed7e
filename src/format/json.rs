use crate::ast::{FlatMap, OverrideValue, ResolvedToken, TokenType};
use crate::error::FormatError;
use crate::parser::decode_literal;
use indexmap::IndexMap;
use serde::Deserialize;

/// Pretty-printed JSON object keyed by dot path.
pub fn format(tokens: &FlatMap) -> Result<String, FormatError> {
    let mut text = serde_json::to_string_pretty(tokens)?;
    text.push('\n');
    Ok(text)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonToken {
    value: serde_json::Value,
    #[serde(rename = "type")]
    kind: String,
    alias_of: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[serde(default)]
    themes: IndexMap<String, JsonOverride>,
    #[serde(default)]
    breakpoints: IndexMap<String, JsonOverride>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonOverride {
    value: serde_json::Value,
    alias_of: Option<String>,
}

/// Reads back the output of [`format`]. `raw_path` is rebuilt from the dot path
/// since the JSON form does not carry source spellings.
pub fn parse(text: &str) -> Result<FlatMap, FormatError> {
    let entries: IndexMap<String, JsonToken> = serde_json::from_str(text)?;
    entries
        .into_iter()
        .map(|(path, entry)| {
            let kind: TokenType = entry.kind.parse().map_err(|()| FormatError::InvalidJson {
                reason: format!("`{path}` has unknown type `{}`", entry.kind),
            })?;
            let token = ResolvedToken {
                raw_path: path.split('.').map(str::to_string).collect(),
                value: decode_value(&path, kind, &entry.value)?,
                kind,
                alias_of: entry.alias_of,
                description: entry.description,
                category: entry.category,
                theme_values: decode_overrides(&path, kind, entry.themes)?,
                breakpoint_values: decode_overrides(&path, kind, entry.breakpoints)?,
                path: path.clone(),
            };
            Ok((path, token))
        })
        .collect()
}

fn decode_overrides(
    path: &str,
    kind: TokenType,
    overrides: IndexMap<String, JsonOverride>,
) -> Result<IndexMap<String, OverrideValue>, FormatError> {
    overrides
        .into_iter()
        .map(|(scope, entry)| {
            let value = decode_value(path, kind, &entry.value)?;
            Ok((
                scope,
                OverrideValue {
                    value,
                    alias_of: entry.alias_of,
                },
            ))
        })
        .collect()
}

fn decode_value(
    path: &str,
    kind: TokenType,
    value: &serde_json::Value,
) -> Result<crate::ast::TokenValue, FormatError> {
    let yaml = serde_yaml::to_value(value).map_err(|e| FormatError::InvalidJson {
        reason: format!("`{path}`: {e}"),
    })?;
    decode_literal(kind, &yaml).map_err(|e| FormatError::InvalidJson {
        reason: format!("`{path}`: {e}"),
    })
}
