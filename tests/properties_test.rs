// Properties every token map and output must satisfy
use pretty_assertions::assert_eq;
use shift_core::error::{ResolverError, ShiftError};
use shift_core::format::{css, json, typescript, FormatContext};
use shift_core::loader::MemoryLoader;
use shift_core::resolver::relink;
use shift_core::{compile, BuildOptions, FlatMap, PipelineRegistry, ThemeConfig};
use std::collections::BTreeSet;
use std::path::PathBuf;

const PALETTE: &str = r##"
global:
  type: color
props:
  COLORS__BLUE: "#0066ff"
  COLORS__RED: "rgb(255 0 0)"
  COLORS__CANVAS: canvas
  COLORS__WASH:
    value: { colorSpace: srgb, components: [1, 1, 1], alpha: 0.5 }
"##;

const SEMANTIC: &str = r##"
imports: [palette.yaml]
props:
  SURFACE:
    value: "#ffffff"
    type: color
    themes:
      dark: "#101010"
  LINK: "{COLORS__BLUE}"
  LINK__HOVER:
    value: "{LINK}"
    description: Hovered link
  RADIUS__SM:
    value: { value: 2, unit: px }
    type: dimension
"##;

fn compile_map(pipeline: &str) -> Result<FlatMap, ShiftError> {
    let loader = MemoryLoader::new()
        .with("tokens/palette.yaml", PALETTE)
        .with("tokens/semantic.yaml", SEMANTIC);
    let mut options = BuildOptions::default();
    options.pipeline = Some(pipeline.to_string());
    compile(
        &[PathBuf::from("tokens/semantic.yaml")],
        &options,
        &loader,
        &PipelineRegistry::default(),
    )
    .map(|compilation| compilation.tokens)
}

fn custom_property_names(css: &str) -> BTreeSet<String> {
    css.lines()
        .filter_map(|line| line.trim().strip_prefix("--"))
        .filter_map(|decl| decl.split_once(':'))
        .map(|(name, _)| name.replace('-', "."))
        .collect()
}

#[test]
fn test_css_property_names_cover_every_path() {
    let tokens = compile_map("default").unwrap();
    let names = custom_property_names(&css::format(&tokens, &FormatContext::default()));
    let paths: BTreeSet<String> = tokens.keys().cloned().collect();
    assert_eq!(names, paths);
}

#[test]
fn test_relink_is_a_no_op_on_resolved_maps() {
    let tokens = compile_map("default").unwrap();
    let relinked = relink(&tokens).unwrap();
    assert_eq!(relinked, tokens);

    let context = FormatContext::default();
    assert_eq!(css::format(&relinked, &context), css::format(&tokens, &context));
    assert_eq!(json::format(&relinked).unwrap(), json::format(&tokens).unwrap());
}

#[test]
fn test_alias_cycle_is_rejected() {
    let loader = MemoryLoader::new().with(
        "cycle.yaml",
        "props:\n  A: \"{B}\"\n  B: \"{C}\"\n  C: \"{A}\"\n",
    );
    let err = compile(
        &[PathBuf::from("cycle.yaml")],
        &BuildOptions::default(),
        &loader,
        &PipelineRegistry::default(),
    )
    .unwrap_err();
    match err {
        ShiftError::Resolver(ResolverError::CircularReference { cycle }) => {
            assert_eq!(cycle, "a -> b -> c -> a");
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn test_theme_block_holds_only_overridden_tokens() {
    let tokens = compile_map("default").unwrap();
    let mut themes = ThemeConfig::default();
    themes.insert("dark", ":root .dark");
    let output = css::format(&tokens, &FormatContext::new(themes, Default::default()));

    let dark = output
        .split(":root .dark {\n")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .unwrap();
    assert_eq!(dark, "  --surface: #101010;\n");
}

#[test]
fn test_json_output_reads_back_losslessly() {
    for pipeline in ["default", "oklch"] {
        let tokens = compile_map(pipeline).unwrap();
        let text = json::format(&tokens).unwrap();
        let parsed = json::parse(&text).unwrap();

        assert_eq!(parsed.keys().collect::<Vec<_>>(), tokens.keys().collect::<Vec<_>>());
        for (path, token) in &tokens {
            let back = &parsed[path];
            assert_eq!(back.value, token.value, "{path}");
            assert_eq!(back.kind, token.kind, "{path}");
            assert_eq!(back.alias_of, token.alias_of, "{path}");
            assert_eq!(back.theme_values, token.theme_values, "{path}");
            assert_eq!(back.description, token.description, "{path}");
        }
        assert_eq!(json::format(&parsed).unwrap(), text);
    }
}

#[test]
fn test_oklch_pipeline_output() {
    let tokens = compile_map("oklch").unwrap();
    let css = css::format(&tokens, &FormatContext::default());
    assert!(css.contains("--colors-blue: oklch(0.5635 0.2408 260.82);"));
    assert!(css.contains("--colors-red: oklch(0.628 0.2577 29.23);"));
    assert!(css.contains("--colors-wash: oklch(1 0 0 / 0.5);"));
    // not a convertible notation
    assert!(css.contains("--colors-canvas: canvas;"));
    assert!(css.contains("--link-hover: var(--link);"));

    let once = serde_json::to_string(&tokens).unwrap();
    let again = serde_json::to_string(&compile_map("oklch").unwrap()).unwrap();
    assert_eq!(once, again);
}

#[test]
fn test_typescript_outputs_cover_every_token() {
    let tokens = compile_map("default").unwrap();
    let vars = typescript::variables(&tokens).unwrap();
    for name in ["colorsBlue", "surface", "link", "linkHover", "radiusSm"] {
        assert!(vars.contains(&format!("export const {name} = {{")), "{name}");
    }
    assert!(vars.contains("/** Hovered link */\n"));

    let declarations = typescript::declarations(&tokens).unwrap();
    assert!(declarations.contains("  | \"link.hover\"\n"));
    assert!(declarations.contains("\"aliasOf\": \"link\""));
}
