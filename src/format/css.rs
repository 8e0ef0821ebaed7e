use super::FormatContext;
use crate::ast::{ColorValue, FlatMap, OverrideValue, TokenValue};
use crate::utils::{custom_property, format_number};
use std::collections::BTreeSet;

/// Renders custom properties: a `:root` block with every token, one block per
/// configured theme that has overrides, and one `@media` block per configured
/// breakpoint that has overrides.
pub fn format(tokens: &FlatMap, context: &FormatContext) -> String {
    let mut out = String::new();
    let root: Vec<(&str, String)> = tokens
        .iter()
        .map(|(path, token)| {
            (
                path.as_str(),
                reference_or_value(&token.value, token.alias_of.as_deref()),
            )
        })
        .collect();
    write_block(&mut out, ":root", &root, "");

    for (theme, selector) in context.themes.iter() {
        let declarations = overrides(tokens, |token| token.theme_values.get(theme));
        if declarations.is_empty() {
            continue;
        }
        out.push('\n');
        write_block(&mut out, selector, &declarations, "");
    }

    for (breakpoint, condition) in context.breakpoints.iter() {
        let declarations = overrides(tokens, |token| token.breakpoint_values.get(breakpoint));
        if declarations.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("@media {condition} {{\n"));
        write_block(&mut out, ":root", &declarations, "  ");
        out.push_str("}\n");
    }

    warn_unconfigured(tokens, context);
    out
}

/// The CSS text of a concrete value.
pub fn css_value(value: &TokenValue) -> String {
    match value {
        TokenValue::String(s) => s.clone(),
        TokenValue::Number(n) => format_number(*n),
        TokenValue::Color(ColorValue::Literal(text)) => text.clone(),
        TokenValue::Color(ColorValue::Components {
            color_space,
            components,
            alpha,
        }) => {
            let [a, b, c] = components.map(format_number);
            let alpha = alpha
                .map(|alpha| format!(" / {}", format_number(alpha)))
                .unwrap_or_default();
            match color_space.to_ascii_lowercase().as_str() {
                space @ ("hsl" | "hwb" | "lab" | "lch" | "oklab" | "oklch") => {
                    format!("{space}({a} {b} {c}{alpha})")
                }
                space => format!("color({space} {a} {b} {c}{alpha})"),
            }
        }
        TokenValue::Dimension(dimension) => {
            format!("{}{}", format_number(dimension.value), dimension.unit)
        }
        TokenValue::FontFamily(families) => families
            .iter()
            .map(|family| quote_family(family))
            .collect::<Vec<_>>()
            .join(", "),
        TokenValue::CubicBezier(points) => {
            format!("cubic-bezier({})", points.map(format_number).join(", "))
        }
    }
}

fn reference_or_value(value: &TokenValue, alias_of: Option<&str>) -> String {
    match alias_of {
        Some(target) => format!("var({})", custom_property(target)),
        None => css_value(value),
    }
}

fn overrides<'a>(
    tokens: &'a FlatMap,
    select: impl Fn(&'a crate::ast::ResolvedToken) -> Option<&'a OverrideValue>,
) -> Vec<(&'a str, String)> {
    tokens
        .iter()
        .filter_map(|(path, token)| {
            select(token).map(|value| {
                (
                    path.as_str(),
                    reference_or_value(&value.value, value.alias_of.as_deref()),
                )
            })
        })
        .collect()
}

fn write_block(out: &mut String, selector: &str, declarations: &[(&str, String)], indent: &str) {
    out.push_str(&format!("{indent}{selector} {{\n"));
    for (path, value) in declarations {
        out.push_str(&format!("{indent}  {}: {value};\n", custom_property(path)));
    }
    out.push_str(&format!("{indent}}}\n"));
}

// Generic family keywords and single words go out bare; everything else is quoted.
fn quote_family(family: &str) -> String {
    let is_quoted = family.starts_with('"') || family.starts_with('\'');
    let needs_quotes = family.contains(char::is_whitespace)
        || family.starts_with(|c: char| c.is_ascii_digit());
    if needs_quotes && !is_quoted {
        format!("\"{family}\"")
    } else {
        family.to_string()
    }
}

fn warn_unconfigured(tokens: &FlatMap, context: &FormatContext) {
    let themes: BTreeSet<&str> = tokens
        .values()
        .flat_map(|token| token.theme_values.keys())
        .map(String::as_str)
        .filter(|theme| context.themes.selector(theme).is_none())
        .collect();
    let breakpoints: BTreeSet<&str> = tokens
        .values()
        .flat_map(|token| token.breakpoint_values.keys())
        .map(String::as_str)
        .filter(|name| context.breakpoints.condition(name).is_none())
        .collect();
    for theme in themes {
        log::warn!("theme `{theme}` has overrides but no configured selector; skipped in CSS");
    }
    for name in breakpoints {
        log::warn!("breakpoint `{name}` has overrides but no configured media query; skipped in CSS");
    }
}
