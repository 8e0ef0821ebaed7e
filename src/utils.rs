use std::path::{Component, Path, PathBuf};

/// Delimiter between segments of a flat token key (`COLORS__PRIMARY`).
pub const SEGMENT_DELIMITER: &str = "__";

/// Splits a flat key into its segments, or `None` if the name is malformed.
pub fn split_flat_key(key: &str) -> Option<Vec<&str>> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let segments: Vec<&str> = key.split(SEGMENT_DELIMITER).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Canonical dot path for a flat key or alias name: `COLORS__PRIMARY` and
/// `colors.primary` both become `colors.primary`.
pub fn to_dot_path(name: &str) -> String {
    name.split('.')
        .flat_map(|part| part.split(SEGMENT_DELIMITER))
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(".")
}

/// If `text` is exactly `{NAME}`, returns `NAME`.
pub fn alias_target(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    let valid = !inner.is_empty()
        && inner
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    valid.then_some(inner)
}

/// CSS custom property name for a dot path: `colors.primary` -> `--colors-primary`.
pub fn custom_property(path: &str) -> String {
    format!("--{}", path.replace('.', "-"))
}

/// camelCase TypeScript identifier for a dot path: `font_size.lg` -> `fontSizeLg`.
pub fn ts_identifier(path: &str) -> String {
    let mut ident = String::with_capacity(path.len());
    let mut upper_next = false;
    for c in path.chars() {
        match c {
            '.' | '_' | '-' => upper_next = !ident.is_empty(),
            c if upper_next => {
                ident.push(c.to_ascii_uppercase());
                upper_next = false;
            }
            c => ident.push(c),
        }
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Lexically normalises a path, folding `.` and `..` without touching the
/// filesystem so that in-memory and on-disk sources compare the same way.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Formats a number the way CSS and JS print it: no trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_key_segments() {
        assert_eq!(split_flat_key("COLORS__PRIMARY"), Some(vec!["COLORS", "PRIMARY"]));
        assert_eq!(split_flat_key("FONT_SIZE__LG"), Some(vec!["FONT_SIZE", "LG"]));
        assert_eq!(split_flat_key("COLORS__"), None);
        assert_eq!(split_flat_key("colors.primary"), None);
        assert_eq!(split_flat_key(""), None);
    }

    #[test]
    fn test_dot_path() {
        assert_eq!(to_dot_path("BUTTON__BACKGROUND"), "button.background");
        assert_eq!(to_dot_path("colors.primary"), "colors.primary");
        assert_eq!(to_dot_path("SPACING__2"), "spacing.2");
    }

    #[test]
    fn test_alias_target() {
        assert_eq!(alias_target("{COLORS__PRIMARY}"), Some("COLORS__PRIMARY"));
        assert_eq!(alias_target("{colors.primary}"), Some("colors.primary"));
        assert_eq!(alias_target("#0066ff"), None);
        assert_eq!(alias_target("{}"), None);
        assert_eq!(alias_target("{a..b}"), None);
        assert_eq!(alias_target("prefix {A}"), None);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(custom_property("button.background"), "--button-background");
        assert_eq!(ts_identifier("font_size.lg"), "fontSizeLg");
        assert_eq!(ts_identifier("2xl.gap"), "_2xlGap");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("tokens/./a/../base.yaml")), PathBuf::from("tokens/base.yaml"));
        assert_eq!(normalize_path(Path::new("../shared/x.yaml")), PathBuf::from("../shared/x.yaml"));
        assert_eq!(normalize_path(Path::new("../../x.yaml")), PathBuf::from("../../x.yaml"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.25), "-0.25");
    }
}
