use crate::ast::{FlatMap, ResolvedToken, TokenType};
use crate::error::FormatError;
use crate::utils::{custom_property, ts_identifier};
use serde::Serialize;
use std::collections::HashMap;

const HEADER: &str = "// Generated by shift. Do not edit.\n";

// Reserved words that cannot name a `const` binding.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "let", "static", "yield", "await",
    "implements", "interface", "package", "private", "protected", "public",
];

/// `tokens.ts`: type declarations plus the whole token set as a typed constant.
pub fn declarations(tokens: &FlatMap) -> Result<String, FormatError> {
    let mut out = String::from(HEADER);
    out.push('\n');

    let kinds: Vec<String> = TokenType::ALL
        .iter()
        .map(|kind| format!("\"{}\"", kind.as_str()))
        .collect();
    out.push_str(&format!("export type TokenType = {};\n\n", kinds.join(" | ")));

    out.push_str(
        "\
export interface TokenOverride<T = unknown> {
  value: T;
  aliasOf?: string;
}

export interface Token<T = unknown> {
  value: T;
  type: TokenType;
  aliasOf?: string;
  description?: string;
  category?: string;
  themes?: Record<string, TokenOverride<T>>;
  breakpoints?: Record<string, TokenOverride<T>>;
}

",
    );

    if tokens.is_empty() {
        out.push_str("export type TokenPath = never;\n\n");
    } else {
        out.push_str("export type TokenPath =\n");
        for path in tokens.keys() {
            out.push_str(&format!("  | {}\n", serde_json::to_string(path)?));
        }
        // replace the trailing newline with the statement terminator
        out.pop();
        out.push_str(";\n\n");
    }

    out.push_str(&format!(
        "export const tokens = {} as const;\n\nexport default tokens;\n",
        serde_json::to_string_pretty(tokens)?
    ));
    Ok(out)
}

#[derive(Serialize)]
struct VarExport<'a> {
    var: String,
    #[serde(flatten)]
    token: &'a ResolvedToken,
}

/// `vars.ts`: one named export per token carrying its `var(--name)` reference.
pub fn variables(tokens: &FlatMap) -> Result<String, FormatError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut out = String::from(HEADER);

    for (path, token) in tokens {
        let ident = export_name(path);
        if let Some(first) = seen.insert(ident.clone(), path) {
            return Err(FormatError::IdentifierCollision {
                first: first.to_string(),
                second: path.clone(),
                ident,
            });
        }

        out.push('\n');
        if let Some(description) = &token.description {
            out.push_str(&format!("/** {} */\n", description.replace("*/", "*\\/")));
        }
        let export = VarExport {
            var: format!("var({})", custom_property(path)),
            token,
        };
        out.push_str(&format!(
            "export const {ident} = {} as const;\n",
            serde_json::to_string_pretty(&export)?
        ));
    }
    Ok(out)
}

fn export_name(path: &str) -> String {
    let ident = ts_identifier(path);
    if RESERVED.contains(&ident.as_str()) {
        format!("_{ident}")
    } else {
        ident
    }
}
