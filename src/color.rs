//! CSS color parsing and conversion to OKLCH.
//!
//! Parses the sRGB notations (`#hex`, `rgb()`, `rgba()`, `hsl()`, `hsla()`)
//! and converts them through linear sRGB and OKLab (Björn Ottosson, 2020)
//! to polar OKLCH.

#![allow(clippy::many_single_char_names)]

use std::fmt;

/// An sRGB color with gamma-encoded channels and alpha, all in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub alpha: f64,
}

/// OKLab coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// OKLCH coordinates. Hue is in degrees, `0.0..360.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
    pub alpha: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, alpha: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Converts to OKLab via linear sRGB and the LMS cone space.
    pub fn to_oklab(&self) -> Oklab {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);

        // M1: linear sRGB -> LMS
        let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
        let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
        let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

        let l = l.cbrt();
        let m = m.cbrt();
        let s = s.cbrt();

        // M2: LMS' -> OKLab
        Oklab {
            l: 0.210_454_255_3 * l + 0.793_617_785_0 * m - 0.004_072_046_8 * s,
            a: 1.977_998_495_1 * l - 2.428_592_205_0 * m + 0.450_593_709_9 * s,
            b: 0.025_904_037_1 * l + 0.782_771_766_2 * m - 0.808_675_766_0 * s,
        }
    }

    pub fn to_oklch(&self) -> Oklch {
        let lab = self.to_oklab();
        let c = (lab.a * lab.a + lab.b * lab.b).sqrt();
        let mut h = lab.b.atan2(lab.a).to_degrees();
        if h < 0.0 {
            h += 360.0;
        }
        Oklch {
            l: lab.l,
            c,
            h,
            alpha: self.alpha,
        }
    }
}

impl fmt::Display for Oklch {
    /// `oklch(L C H)` with L and C to 4 decimals and H to 2. Translucent
    /// colors append `/ alpha`. Achromatic colors report hue 0.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = round_to(self.l, 4);
        let c = round_to(self.c, 4);
        let h = if c == 0.0 { 0.0 } else { round_to(self.h, 2) % 360.0 };
        write!(f, "oklch({l} {c} {h}")?;
        if self.alpha < 1.0 {
            write!(f, " / {}", round_to(self.alpha, 4))?;
        }
        write!(f, ")")
    }
}

/// Converts a CSS color string to `oklch(...)` text, or `None` when the
/// input is not one of the supported sRGB notations.
pub fn to_oklch_string(input: &str) -> Option<String> {
    parse_css_color(input).map(|rgba| rgba.to_oklch().to_string())
}

/// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
/// `hsl()` and `hsla()`. Anything else (named colors, `var()`, `oklch()`)
/// yields `None`.
pub fn parse_css_color(input: &str) -> Option<Rgba> {
    let input = input.trim();
    if let Some(hex) = input.strip_prefix('#') {
        return parse_hex(hex);
    }
    let open = input.find('(')?;
    let body = input[open + 1..].strip_suffix(')')?;
    match input[..open].trim().to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => parse_rgb(body),
        "hsl" | "hsla" => parse_hsl(body),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| f64::from(v) / 255.0);
    let short = |i: usize| channel(&hex[i..=i].repeat(2));
    let long = |i: usize| channel(&hex[i * 2..i * 2 + 2]);
    match hex.len() {
        3 => Some(Rgba::new(short(0)?, short(1)?, short(2)?, 1.0)),
        4 => Some(Rgba::new(short(0)?, short(1)?, short(2)?, short(3)?)),
        6 => Some(Rgba::new(long(0)?, long(1)?, long(2)?, 1.0)),
        8 => Some(Rgba::new(long(0)?, long(1)?, long(2)?, long(3)?)),
        _ => None,
    }
}

// Splits `a, b, c[, d]` or `a b c[ / d]` into channel and optional alpha text
fn split_channels(body: &str) -> Option<(Vec<&str>, Option<&str>)> {
    let mut parts: Vec<&str> = if body.contains(',') {
        body.split(',').map(str::trim).collect()
    } else {
        let (channels, alpha) = match body.split_once('/') {
            Some((channels, alpha)) => (channels, Some(alpha.trim())),
            None => (body, None),
        };
        let mut parts: Vec<&str> = channels.split_whitespace().collect();
        if parts.len() != 3 {
            return None;
        }
        parts.extend(alpha);
        parts
    };
    match parts.len() {
        3 => Some((parts, None)),
        4 => {
            let alpha = parts.pop();
            Some((parts, alpha))
        }
        _ => None,
    }
}

fn parse_rgb(body: &str) -> Option<Rgba> {
    let (channels, alpha) = split_channels(body)?;
    let channel = |s: &str| match s.strip_suffix('%') {
        Some(pct) => number(pct).map(|v| v / 100.0),
        None => number(s).map(|v| v / 255.0),
    };
    Some(Rgba::new(
        channel(channels[0])?,
        channel(channels[1])?,
        channel(channels[2])?,
        parse_alpha(alpha)?,
    ))
}

fn parse_hsl(body: &str) -> Option<Rgba> {
    let (channels, alpha) = split_channels(body)?;
    let hue = parse_hue(channels[0])?;
    let percent = |s: &str| {
        number(s.strip_suffix('%').unwrap_or(s)).map(|v| (v / 100.0).clamp(0.0, 1.0))
    };
    let (r, g, b) = hsl_to_rgb(hue, percent(channels[1])?, percent(channels[2])?);
    Some(Rgba::new(r, g, b, parse_alpha(alpha)?))
}

fn parse_hue(text: &str) -> Option<f64> {
    let text = text.trim().to_ascii_lowercase();
    let degrees = if let Some(v) = text.strip_suffix("deg") {
        number(v)?
    } else if let Some(v) = text.strip_suffix("grad") {
        number(v)? * 0.9
    } else if let Some(v) = text.strip_suffix("rad") {
        number(v)?.to_degrees()
    } else if let Some(v) = text.strip_suffix("turn") {
        number(v)? * 360.0
    } else {
        number(&text)?
    };
    Some(degrees.rem_euclid(360.0))
}

fn parse_alpha(alpha: Option<&str>) -> Option<f64> {
    match alpha {
        None => Some(1.0),
        Some(text) => match text.strip_suffix('%') {
            Some(pct) => number(pct).map(|v| v / 100.0),
            None => number(text),
        },
    }
}

// `str::parse` also accepts `inf` and `nan`; neither is a CSS number.
fn number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let (r, g, b) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (r + m, g + m, b + m)
}

/// sRGB gamma decoding.
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    // Adding zero folds -0.0 into 0.0.
    (value * factor).round() / factor + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_values() {
        assert_eq!(to_oklch_string("#0066ff").unwrap(), "oklch(0.5635 0.2408 260.82)");
        assert_eq!(to_oklch_string("#ff0000").unwrap(), "oklch(0.628 0.2577 29.23)");
        assert_eq!(to_oklch_string("#ffffff").unwrap(), "oklch(1 0 0)");
        assert_eq!(to_oklch_string("#000").unwrap(), "oklch(0 0 0)");
    }

    #[test]
    fn test_notations_agree() {
        let expected = to_oklch_string("#0066ff");
        for input in [
            "#06f",
            "#0066FF",
            "rgb(0, 102, 255)",
            "rgb(0 102 255)",
            "rgba(0, 102, 255, 1)",
            "RGB(0%, 40%, 100%)",
        ] {
            assert_eq!(to_oklch_string(input), expected, "{input}");
        }
        assert_eq!(to_oklch_string("hsl(120, 100%, 50%)"), to_oklch_string("#00ff00"));
        assert_eq!(to_oklch_string("hsl(0.5turn 100% 50%)"), to_oklch_string("#00ffff"));
    }

    #[test]
    fn test_alpha() {
        assert_eq!(
            to_oklch_string("rgba(0, 102, 255, 0.5)").unwrap(),
            "oklch(0.5635 0.2408 260.82 / 0.5)"
        );
        assert_eq!(
            to_oklch_string("rgb(0 102 255 / 25%)").unwrap(),
            "oklch(0.5635 0.2408 260.82 / 0.25)"
        );
        let translucent = parse_css_color("#0066ff80").unwrap();
        assert!((translucent.alpha - 128.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsupported_inputs() {
        for input in [
            "oklch(0.5 0.2 260)",
            "var(--colors-primary)",
            "rebeccapurple",
            "#12345",
            "#ggg",
            "rgb(1, 2)",
            "rgb(1 2 3 4)",
            "hsl(10, 20%)",
            "rgb(nan, 0, 0)",
            "rgb(0 inf 0)",
            "hsl(inf, 50%, 50%)",
            "hsl(nan, 50%, 50%)",
            "hsl(120deg, NaN%, 50%)",
            "rgba(0, 102, 255, infinity)",
            "",
        ] {
            assert_eq!(parse_css_color(input), None, "{input}");
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(to_oklch_string("#3388ff"), to_oklch_string("#3388ff"));
    }
}
