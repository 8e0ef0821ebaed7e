use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a token build. Each stage fails fast into one of these.
#[derive(Error, Debug, Diagnostic)]
pub enum ShiftError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write {}", path.display())]
    #[diagnostic(
        code(build::io),
        help("Check that the output directory is writable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Invalid YAML in {file}: {message}")]
    #[diagnostic(
        code(parser::yaml),
        help("The token source must be well-formed YAML.")
    )]
    Yaml {
        file: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("{file}: the document root must be a mapping")]
    #[diagnostic(
        code(parser::root_not_mapping),
        help("A token document looks like `{{ props: ..., imports: [...], global: ... }}`.")
    )]
    RootNotMapping { file: String },

    #[error("{file}: unexpected top-level key `{key}`")]
    #[diagnostic(
        code(parser::unexpected_top_level_key),
        help("Only `props`, `imports` and `global` are allowed at the top level.")
    )]
    UnexpectedTopLevelKey { file: String, key: String },

    #[error("{file}: missing required top-level key `{key}`")]
    #[diagnostic(code(parser::missing_key))]
    MissingKey { file: String, key: String },

    #[error("{file}: `{key}` must be {expected}")]
    #[diagnostic(code(parser::invalid_field))]
    InvalidField {
        file: String,
        key: String,
        expected: String,
    },

    #[error("{file}: unknown field `{field}` in `global`")]
    #[diagnostic(
        code(parser::unknown_global_field),
        help("`global` may only set `type` and `category`.")
    )]
    UnknownGlobalField { file: String, field: String },

    #[error("{file}: import `{import}` is an absolute path")]
    #[diagnostic(
        code(parser::absolute_import),
        help("Imports are resolved relative to the importing file; use a relative path.")
    )]
    AbsoluteImport { file: String, import: String },

    #[error("{file}: invalid token name `{name}`")]
    #[diagnostic(
        code(parser::invalid_token_name),
        help("Token names use letters, digits and underscores, with `__` separating segments (e.g. `COLORS__PRIMARY`).")
    )]
    InvalidTokenName { file: String, name: String },

    #[error("{file}: `{token}` groups further definitions; grouped definitions are not permitted in props")]
    #[diagnostic(
        code(parser::grouped_definition),
        help("Flatten the group using `__` in the key, e.g. `COLORS__PRIMARY`.")
    )]
    GroupedDefinition { file: String, token: String },

    #[error("{file}: `{token}` has no `value`")]
    #[diagnostic(code(parser::missing_value))]
    MissingValue { file: String, token: String },

    #[error("{file}: `{token}` has unknown field `{field}`")]
    #[diagnostic(
        code(parser::unknown_token_field),
        help("Allowed fields are `value`, `type`, `description`, `category`, `themes` and `breakpoints`.")
    )]
    UnknownTokenField {
        file: String,
        token: String,
        field: String,
    },

    #[error("{file}: `{token}` has no type")]
    #[diagnostic(
        code(parser::missing_type),
        help("Declare `type` on the token or in the document's `global` block.")
    )]
    MissingType { file: String, token: String },

    #[error("{file}: `{token}` has unknown type `{found}`")]
    #[diagnostic(
        code(parser::unknown_type),
        help("Known types: color, dimension, duration, fontFamily, fontWeight, number, string, cubicBezier.")
    )]
    UnknownType {
        file: String,
        token: String,
        found: String,
    },

    #[error("{file}: `{token}` is not a valid {kind}: {reason}")]
    #[diagnostic(code(parser::invalid_value))]
    InvalidValue {
        file: String,
        token: String,
        kind: String,
        reason: String,
    },

    #[error("{file}: color `{token}` sets both `hex` and `colorSpace`/`components`")]
    #[diagnostic(
        code(parser::ambiguous_color),
        help("A color is either `{{hex}}` or `{{colorSpace, components}}`, never both.")
    )]
    AmbiguousColor { file: String, token: String },

    #[error("{file}: dimension `{token}` is the bare string `{literal}`")]
    #[diagnostic(
        code(parser::bare_dimension),
        help("Write dimensions as `{{value: 16, unit: px}}`.")
    )]
    BareDimension {
        file: String,
        token: String,
        literal: String,
    },

    #[error("{file}: cannot load import `{import}`: {reason}")]
    #[diagnostic(code(parser::module_not_found))]
    ModuleNotFound {
        file: String,
        import: String,
        reason: String,
    },

    #[error("Circular import: {cycle}")]
    #[diagnostic(
        code(parser::circular_import),
        help("Break the cycle by moving shared tokens into a file both can import.")
    )]
    CircularImport { cycle: String },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ResolverError {
    #[error("`{token}` references unknown token `{reference}` ({file})")]
    #[diagnostic(
        code(resolver::unknown_reference),
        help("Check the spelling, or import the document that defines it.")
    )]
    UnknownReference {
        token: String,
        reference: String,
        file: String,
    },

    #[error("Circular alias: {cycle}")]
    #[diagnostic(code(resolver::circular_reference))]
    CircularReference { cycle: String },

    #[error("`{token}` is defined in both {first} and {second}")]
    #[diagnostic(
        code(resolver::duplicate_token),
        help("Each token path may be defined once across all imported documents.")
    )]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },

    #[error("`{token}` has a literal value but no type ({file})")]
    #[diagnostic(code(resolver::missing_type))]
    MissingType { token: String, file: String },

    #[error("`{token}` is declared as {declared} but its alias `{reference}` is a {found}")]
    #[diagnostic(code(resolver::type_mismatch))]
    TypeMismatch {
        token: String,
        reference: String,
        declared: String,
        found: String,
    },

    #[error("{file}: invalid {kind} override for `{token}`: {reason}")]
    #[diagnostic(
        code(resolver::invalid_override),
        help("The override takes the type of the token's alias target.")
    )]
    InvalidOverride {
        file: String,
        token: String,
        kind: String,
        reason: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum TransformError {
    #[error("Stage `{stage}` produced an empty value for `{token}`")]
    #[diagnostic(code(transform::empty_output))]
    EmptyOutput { stage: String, token: String },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PipelineError {
    #[error("Unknown pipeline `{name}`")]
    #[diagnostic(code(pipeline::unknown), help("Available pipelines: {available}"))]
    UnknownPipeline { name: String, available: String },
}

#[derive(Error, Debug, Diagnostic)]
pub enum FormatError {
    #[error("`{first}` and `{second}` both export as `{ident}`")]
    #[diagnostic(
        code(format::identifier_collision),
        help("Rename one of the tokens so their TypeScript names differ.")
    )]
    IdentifierCollision {
        first: String,
        second: String,
        ident: String,
    },

    #[error("Failed to serialize tokens")]
    #[diagnostic(code(format::json))]
    Json(#[from] serde_json::Error),

    #[error("Invalid token JSON: {reason}")]
    #[diagnostic(code(format::invalid_json))]
    InvalidJson { reason: String },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ConfigError {
    #[error("Invalid theme config: {reason}")]
    #[diagnostic(
        code(config::themes),
        help(r#"Expected a JSON object mapping theme names to CSS selectors, e.g. {{"dark": ":root .dark"}}."#)
    )]
    InvalidThemes { reason: String },

    #[error("Invalid breakpoint config: {reason}")]
    #[diagnostic(
        code(config::breakpoints),
        help(r#"Expected a JSON object mapping breakpoint names to media conditions, e.g. {{"md": "(min-width: 768px)"}}."#)
    )]
    InvalidBreakpoints { reason: String },

    #[error("Unknown output format `{name}`")]
    #[diagnostic(code(config::format), help("Use one of: css, json, ts, vars."))]
    UnknownFormat { name: String },

    #[error("Invalid input pattern `{pattern}`: {reason}")]
    #[diagnostic(code(config::glob))]
    InvalidPattern { pattern: String, reason: String },

    #[error("No token files match `{pattern}`")]
    #[diagnostic(code(config::no_inputs))]
    NoInputs { pattern: String },
}
