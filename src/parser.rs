use crate::ast::*;
use crate::error::ParserError;
use crate::utils::{alias_target, split_flat_key};
use indexmap::IndexMap;
use miette::{NamedSource, SourceSpan};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

const TOP_LEVEL_KEYS: [&str; 3] = ["props", "imports", "global"];
const TOKEN_FIELDS: [&str; 6] = [
    "value",
    "type",
    "description",
    "category",
    "themes",
    "breakpoints",
];
const COLOR_FIELDS: [&str; 4] = ["hex", "colorSpace", "components", "alpha"];
const FONT_WEIGHT_KEYWORDS: [&str; 4] = ["normal", "bold", "lighter", "bolder"];
const DURATION_UNITS: [&str; 2] = ["ms", "s"];

/// Validates one YAML token source and builds its [`TokenDocument`].
///
/// The parser is a pure function of the text: imports are recorded but not
/// followed (see [`crate::loader::DocumentLoader`]), and flat keys are kept
/// as written. Translation to dot paths happens during resolution.
#[derive(Debug)]
pub struct Parser<'a> {
    source_text: &'a str,
    path: PathBuf,
    file: String,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "tokens.yaml")
    }

    pub fn new_with_name(source_text: &'a str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source_text,
            file: path.to_string_lossy().to_string(),
            path,
        }
    }

    //    Document ::= { props: Props, imports?: [Path], global?: Defaults }
    pub fn parse_document(&self) -> Result<TokenDocument, ParserError> {
        let root: Value =
            serde_yaml::from_str(self.source_text).map_err(|err| self.yaml_error(&err))?;
        let Value::Mapping(root) = root else {
            return Err(ParserError::RootNotMapping {
                file: self.file.clone(),
            });
        };

        for key in root.keys() {
            let key = key_name(key);
            if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
                return Err(ParserError::UnexpectedTopLevelKey {
                    file: self.file.clone(),
                    key,
                });
            }
        }

        let global = match root.get("global") {
            None | Some(Value::Null) => GlobalDefaults::default(),
            Some(Value::Mapping(global)) => self.parse_global(global)?,
            Some(_) => return Err(self.invalid_field("global", "a mapping")),
        };
        let imports = match root.get("imports") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => self.parse_imports(items)?,
            Some(_) => return Err(self.invalid_field("imports", "a list of relative paths")),
        };
        let props = match root.get("props") {
            None => {
                return Err(ParserError::MissingKey {
                    file: self.file.clone(),
                    key: "props".to_string(),
                })
            }
            Some(Value::Null) => IndexMap::new(),
            Some(Value::Mapping(props)) => self.parse_props(props, &global)?,
            Some(_) => return Err(self.invalid_field("props", "a mapping of token definitions")),
        };

        Ok(TokenDocument {
            path: self.path.clone(),
            props,
            imports,
            global,
        })
    }

    fn parse_global(&self, global: &Mapping) -> Result<GlobalDefaults, ParserError> {
        let mut defaults = GlobalDefaults::default();
        for (key, value) in global {
            match key_name(key).as_str() {
                "type" => defaults.kind = Some(self.token_type("global", value)?),
                "category" => {
                    defaults.category = Some(self.string_field("global", "category", value)?)
                }
                other => {
                    return Err(ParserError::UnknownGlobalField {
                        file: self.file.clone(),
                        field: other.to_string(),
                    })
                }
            }
        }
        Ok(defaults)
    }

    fn parse_imports(&self, items: &[Value]) -> Result<Vec<String>, ParserError> {
        items
            .iter()
            .map(|item| {
                let import = item
                    .as_str()
                    .ok_or_else(|| self.invalid_field("imports", "a list of relative paths"))?;
                if is_absolute_import(import) {
                    return Err(ParserError::AbsoluteImport {
                        file: self.file.clone(),
                        import: import.to_string(),
                    });
                }
                Ok(import.to_string())
            })
            .collect()
    }

    fn parse_props(
        &self,
        props: &Mapping,
        global: &GlobalDefaults,
    ) -> Result<IndexMap<String, RawToken>, ParserError> {
        let mut tokens = IndexMap::with_capacity(props.len());
        for (key, value) in props {
            let name = key_name(key);
            if split_flat_key(&name).is_none() {
                return Err(ParserError::InvalidTokenName {
                    file: self.file.clone(),
                    name,
                });
            }
            let token = self.parse_token(&name, value, global)?;
            tokens.insert(name, token);
        }
        Ok(tokens)
    }

    fn parse_token(
        &self,
        name: &str,
        definition: &Value,
        global: &GlobalDefaults,
    ) -> Result<RawToken, ParserError> {
        let fields = match definition {
            Value::Mapping(fields) => fields,
            Value::Null => return Err(self.missing_value(name)),
            // `NAME: <value>` is shorthand for `NAME: { value: <value> }`.
            shorthand => {
                return Ok(RawToken {
                    value: self.raw_value(name, global.kind, shorthand)?,
                    kind: global.kind,
                    description: None,
                    category: global.category.clone(),
                    themes: IndexMap::new(),
                    breakpoints: IndexMap::new(),
                })
            }
        };

        let Some(value) = fields.get("value") else {
            let is_group = fields.values().any(Value::is_mapping)
                && !fields
                    .keys()
                    .any(|key| TOKEN_FIELDS.contains(&key_name(key).as_str()));
            return Err(if is_group {
                ParserError::GroupedDefinition {
                    file: self.file.clone(),
                    token: name.to_string(),
                }
            } else {
                self.missing_value(name)
            });
        };

        for key in fields.keys() {
            let field = key_name(key);
            if !TOKEN_FIELDS.contains(&field.as_str()) {
                return Err(ParserError::UnknownTokenField {
                    file: self.file.clone(),
                    token: name.to_string(),
                    field,
                });
            }
        }

        // Local fields always win over `global`.
        let kind = match fields.get("type") {
            Some(kind) => Some(self.token_type(name, kind)?),
            None => global.kind,
        };
        let description = fields
            .get("description")
            .map(|d| self.string_field(name, "description", d))
            .transpose()?;
        let category = match fields.get("category") {
            Some(c) => Some(self.string_field(name, "category", c)?),
            None => global.category.clone(),
        };

        Ok(RawToken {
            value: self.raw_value(name, kind, value)?,
            kind,
            description,
            category,
            themes: self.parse_overrides(name, kind, fields.get("themes"), "themes")?,
            breakpoints: self.parse_overrides(name, kind, fields.get("breakpoints"), "breakpoints")?,
        })
    }

    fn parse_overrides(
        &self,
        name: &str,
        kind: Option<TokenType>,
        overrides: Option<&Value>,
        field: &str,
    ) -> Result<IndexMap<String, RawValue>, ParserError> {
        let overrides = match overrides {
            None | Some(Value::Null) => return Ok(IndexMap::new()),
            Some(Value::Mapping(overrides)) => overrides,
            Some(_) => {
                return Err(self.invalid_token(
                    name,
                    "token definition",
                    format!("`{field}` must map names to values"),
                ))
            }
        };
        overrides
            .iter()
            .map(|(scope, value)| {
                let raw = match kind {
                    // Typed by the alias target, so decoded during resolution.
                    None if value.as_str().and_then(alias_target).is_none() => {
                        RawValue::Pending(value.clone())
                    }
                    _ => self.raw_value(name, kind, value)?,
                };
                Ok::<_, ParserError>((key_name(scope), raw))
            })
            .collect()
    }

    fn raw_value(
        &self,
        name: &str,
        kind: Option<TokenType>,
        value: &Value,
    ) -> Result<RawValue, ParserError> {
        if let Some(target) = value.as_str().and_then(alias_target) {
            return Ok(RawValue::Alias(target.to_string()));
        }
        let Some(kind) = kind else {
            return Err(ParserError::MissingType {
                file: self.file.clone(),
                token: name.to_string(),
            });
        };
        decode_literal(kind, value)
            .map(RawValue::Literal)
            .map_err(|err| match err {
                LiteralError::Invalid(reason) => self.invalid_token(name, kind.as_str(), reason),
                LiteralError::AmbiguousColor => ParserError::AmbiguousColor {
                    file: self.file.clone(),
                    token: name.to_string(),
                },
                LiteralError::BareDimension(literal) => ParserError::BareDimension {
                    file: self.file.clone(),
                    token: name.to_string(),
                    literal,
                },
            })
    }

    fn token_type(&self, name: &str, value: &Value) -> Result<TokenType, ParserError> {
        let found = value.as_str().map(str::to_string).unwrap_or_else(|| key_name(value));
        found.parse().map_err(|()| ParserError::UnknownType {
            file: self.file.clone(),
            token: name.to_string(),
            found,
        })
    }

    fn string_field(&self, name: &str, field: &str, value: &Value) -> Result<String, ParserError> {
        value.as_str().map(str::to_string).ok_or_else(|| {
            self.invalid_token(name, "token definition", format!("`{field}` must be a string"))
        })
    }

    // === Error helpers ===

    fn yaml_error(&self, err: &serde_yaml::Error) -> ParserError {
        ParserError::Yaml {
            file: self.file.clone(),
            message: err.to_string(),
            src: NamedSource::new(self.file.clone(), self.source_text.to_string()),
            span: err
                .location()
                .map(|loc| SourceSpan::from((loc.index(), 1usize))),
        }
    }

    fn invalid_field(&self, key: &str, expected: &str) -> ParserError {
        ParserError::InvalidField {
            file: self.file.clone(),
            key: key.to_string(),
            expected: expected.to_string(),
        }
    }

    fn invalid_token(&self, name: &str, kind: &str, reason: String) -> ParserError {
        ParserError::InvalidValue {
            file: self.file.clone(),
            token: name.to_string(),
            kind: kind.to_string(),
            reason,
        }
    }

    fn missing_value(&self, name: &str) -> ParserError {
        ParserError::MissingValue {
            file: self.file.clone(),
            token: name.to_string(),
        }
    }
}

/// Why a literal failed its type's shape rules.
#[derive(Debug, PartialEq)]
pub(crate) enum LiteralError {
    Invalid(String),
    AmbiguousColor,
    BareDimension(String),
}

impl std::fmt::Display for LiteralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralError::Invalid(reason) => f.write_str(reason),
            LiteralError::AmbiguousColor => f.write_str("color sets both `hex` and `components`"),
            LiteralError::BareDimension(literal) => {
                write!(f, "`{literal}` must be written as `{{value, unit}}`")
            }
        }
    }
}

fn invalid(reason: impl Into<String>) -> LiteralError {
    LiteralError::Invalid(reason.into())
}

/// Decodes a literal according to the shape rules of `kind`.
pub(crate) fn decode_literal(kind: TokenType, value: &Value) -> Result<TokenValue, LiteralError> {
    match kind {
        TokenType::Color => decode_color(value).map(TokenValue::Color),
        TokenType::Dimension => decode_dimension(value, None),
        TokenType::Duration => decode_dimension(value, Some(&DURATION_UNITS[..])),
        TokenType::FontFamily => match value {
            Value::String(family) => Ok(TokenValue::FontFamily(vec![family.clone()])),
            Value::Sequence(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .filter(|families| !families.is_empty())
                .map(TokenValue::FontFamily)
                .ok_or_else(|| invalid("expected a list of font names")),
            _ => Err(invalid("expected a font name or a list of font names")),
        },
        TokenType::FontWeight => match value {
            Value::Number(_) => match finite(value) {
                Some(weight) if (1.0..=1000.0).contains(&weight) => Ok(TokenValue::Number(weight)),
                _ => Err(invalid("numeric weights must be between 1 and 1000")),
            },
            Value::String(keyword) if FONT_WEIGHT_KEYWORDS.contains(&keyword.as_str()) => {
                Ok(TokenValue::String(keyword.clone()))
            }
            _ => Err(invalid("expected a number or one of normal, bold, lighter, bolder")),
        },
        TokenType::Number => finite(value)
            .map(TokenValue::Number)
            .ok_or_else(|| invalid("expected a finite number")),
        TokenType::String => value
            .as_str()
            .map(|s| TokenValue::String(s.to_string()))
            .ok_or_else(|| invalid("expected a string")),
        TokenType::CubicBezier => {
            let points = value
                .as_sequence()
                .filter(|items| items.len() == 4)
                .and_then(|items| items.iter().map(finite).collect::<Option<Vec<_>>>())
                .ok_or_else(|| invalid("expected a list of four finite numbers"))?;
            if !(0.0..=1.0).contains(&points[0]) || !(0.0..=1.0).contains(&points[2]) {
                return Err(invalid("x coordinates must be between 0 and 1"));
            }
            Ok(TokenValue::CubicBezier([points[0], points[1], points[2], points[3]]))
        }
    }
}

fn decode_color(value: &Value) -> Result<ColorValue, LiteralError> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(invalid("empty color"));
            }
            if text.starts_with('#') || is_hex_digits(text) {
                validate_hex(text)?;
            }
            Ok(ColorValue::Literal(text.to_string()))
        }
        Value::Mapping(fields) => {
            for key in fields.keys() {
                let field = key_name(key);
                if !COLOR_FIELDS.contains(&field.as_str()) {
                    return Err(invalid(format!("unknown color field `{field}`")));
                }
            }
            let hex = fields.get("hex");
            let color_space = fields.get("colorSpace");
            let components = fields.get("components");
            if hex.is_some() && (color_space.is_some() || components.is_some()) {
                return Err(LiteralError::AmbiguousColor);
            }
            if let Some(hex) = hex {
                if fields.contains_key("alpha") {
                    return Err(invalid("`alpha` is only valid with `components`"));
                }
                let hex = hex.as_str().ok_or_else(|| invalid("`hex` must be a string"))?;
                validate_hex(hex)?;
                return Ok(ColorValue::Literal(hex.to_string()));
            }
            let color_space = color_space
                .and_then(Value::as_str)
                .filter(|space| !space.is_empty())
                .ok_or_else(|| invalid("expected `hex` or `colorSpace` with `components`"))?;
            let components = components
                .and_then(Value::as_sequence)
                .filter(|items| items.len() == 3)
                .and_then(|items| items.iter().map(finite).collect::<Option<Vec<_>>>())
                .ok_or_else(|| invalid("`components` must be a list of three finite numbers"))?;
            let alpha = match fields.get("alpha") {
                None => None,
                Some(alpha) => match finite(alpha) {
                    Some(a) if (0.0..=1.0).contains(&a) => Some(a),
                    _ => return Err(invalid("`alpha` must be a number between 0 and 1")),
                },
            };
            Ok(ColorValue::Components {
                color_space: color_space.to_string(),
                components: [components[0], components[1], components[2]],
                alpha,
            })
        }
        _ => Err(invalid(
            "expected a color string, `{hex}` or `{colorSpace, components}`",
        )),
    }
}

fn validate_hex(text: &str) -> Result<(), LiteralError> {
    match text.strip_prefix('#') {
        Some(digits) if is_hex_digits(digits) => Ok(()),
        None if is_hex_digits(text) => Err(invalid(format!("`{text}` is missing its leading `#`"))),
        _ => Err(invalid(format!("`{text}` is not a hex color"))),
    }
}

fn is_hex_digits(text: &str) -> bool {
    matches!(text.len(), 3 | 4 | 6 | 8) && text.chars().all(|c| c.is_ascii_hexdigit())
}

// YAML accepts `.inf` and `.nan` as numbers; token values must be finite.
fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn decode_dimension(value: &Value, units: Option<&[&str]>) -> Result<TokenValue, LiteralError> {
    let fields = match value {
        Value::String(literal) => return Err(LiteralError::BareDimension(literal.clone())),
        Value::Mapping(fields) => fields,
        _ => return Err(invalid("expected `{value, unit}`")),
    };
    if fields.len() != 2 {
        return Err(invalid("expected exactly `value` and `unit`"));
    }
    let amount = fields
        .get("value")
        .and_then(finite)
        .ok_or_else(|| invalid("`value` must be a finite number"))?;
    let unit = fields
        .get("unit")
        .and_then(Value::as_str)
        .filter(|unit| !unit.is_empty() && !unit.contains(char::is_whitespace))
        .ok_or_else(|| invalid("`unit` must be a non-empty string"))?;
    if let Some(allowed) = units {
        if !allowed.contains(&unit) {
            return Err(invalid(format!("unit `{unit}` must be one of {}", allowed.join(", "))));
        }
    }
    Ok(TokenValue::Dimension(Dimension {
        value: amount,
        unit: unit.to_string(),
    }))
}

// Unix, UNC and drive-letter paths are rejected on every host.
fn is_absolute_import(import: &str) -> bool {
    let bytes = import.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    has_drive
        || import.starts_with('/')
        || import.starts_with('\\')
        || Path::new(import).is_absolute()
}

/// Renders a mapping key as text. Non-string keys (numbers, booleans) are
/// accepted by YAML and are rendered as written.
fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_string(),
        other => format!("{other:?}"),
    }
}
