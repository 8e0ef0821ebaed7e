use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

// --- Source documents ---

/// One parsed token source file.
#[derive(Debug, PartialEq, Clone)]
pub struct TokenDocument {
    pub path: PathBuf,
    /// Flat keys (`COLORS__PRIMARY`) in declaration order.
    pub props: IndexMap<String, RawToken>,
    /// Relative paths exactly as written in the file.
    pub imports: Vec<String>,
    pub global: GlobalDefaults,
}

/// The per-document `global` block. Its fields fill in tokens that omit them.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct GlobalDefaults {
    pub kind: Option<TokenType>,
    pub category: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RawToken {
    pub value: RawValue,
    /// `None` only for aliases, which inherit the type of their target.
    pub kind: Option<TokenType>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub themes: IndexMap<String, RawValue>,
    pub breakpoints: IndexMap<String, RawValue>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum RawValue {
    /// The referenced name as written between the braces.
    Alias(String),
    Literal(TokenValue),
    /// An override literal on a token whose type is inherited from its alias
    /// target. It is decoded once that type is known.
    Pending(serde_yaml::Value),
}

// --- Values ---

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Dimension,
    Duration,
    FontFamily,
    FontWeight,
    Number,
    String,
    CubicBezier,
}

impl TokenType {
    pub const ALL: [TokenType; 8] = [
        TokenType::Color,
        TokenType::Dimension,
        TokenType::Duration,
        TokenType::FontFamily,
        TokenType::FontWeight,
        TokenType::Number,
        TokenType::String,
        TokenType::CubicBezier,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Dimension => "dimension",
            TokenType::Duration => "duration",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::Number => "number",
            TokenType::String => "string",
            TokenType::CubicBezier => "cubicBezier",
        }
    }
}

impl FromStr for TokenType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete token value. Aliases never appear here.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenValue {
    String(String),
    Number(f64),
    Color(ColorValue),
    /// Used by both `dimension` and `duration` tokens.
    Dimension(Dimension),
    FontFamily(Vec<String>),
    CubicBezier([f64; 4]),
}

#[derive(Debug, PartialEq, Clone)]
pub enum ColorValue {
    /// Any CSS color text: hex, `rgb()`, `hsl()`, `oklch()`, named colors.
    Literal(String),
    Components {
        color_space: String,
        components: [f64; 3],
        alpha: Option<f64>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct Dimension {
    pub value: f64,
    pub unit: String,
}

// --- Resolved tokens ---

/// The resolved, dot-path keyed token set. Insertion order is emission order.
pub type FlatMap = IndexMap<String, ResolvedToken>;

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    #[serde(skip)]
    pub path: String,
    #[serde(skip)]
    pub raw_path: Vec<String>,
    pub value: TokenValue,
    #[serde(rename = "type")]
    pub kind: TokenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "themes", skip_serializing_if = "IndexMap::is_empty")]
    pub theme_values: IndexMap<String, OverrideValue>,
    #[serde(rename = "breakpoints", skip_serializing_if = "IndexMap::is_empty")]
    pub breakpoint_values: IndexMap<String, OverrideValue>,
}

/// A theme- or breakpoint-scoped replacement for a token's default value.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideValue {
    pub value: TokenValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}
