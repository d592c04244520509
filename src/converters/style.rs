//! Style/color resolver.
//!
//! Maps the editor's symbolic color-scale vocabulary (Tailwind-like `hue-shade`
//! names, optionally prefixed with `from-`/`via-`/`to-`) and direct CSS colors
//! to concrete RGB values, and decides the text contrast for header bands.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::colors::{Gradient, RgbColor};

/// Fallback for empty or unknown scales: a mid indigo (`indigo-500`).
pub const DEFAULT_COLOR: RgbColor = RgbColor::new(0x63, 0x66, 0xf1);

/// Luma above which a background counts as light (and gets dark text).
pub const LIGHT_LUMA_THRESHOLD: f64 = 160.0;

/// Foreground used on light backgrounds.
pub const DARK_TEXT: RgbColor = RgbColor::new(0x1f, 0x29, 0x37);
/// Foreground used on dark backgrounds.
pub const LIGHT_TEXT: RgbColor = RgbColor::WHITE;

// Anchor shades 100, 300, 500, 700, 900 per hue. Other shades are interpolated.
const PALETTE: &[(&str, [u32; 5])] = &[
    ("slate", [0xf1f5f9, 0xcbd5e1, 0x64748b, 0x334155, 0x0f172a]),
    ("gray", [0xf3f4f6, 0xd1d5db, 0x6b7280, 0x374151, 0x111827]),
    ("red", [0xfee2e2, 0xfca5a5, 0xef4444, 0xb91c1c, 0x7f1d1d]),
    ("orange", [0xffedd5, 0xfdba74, 0xf97316, 0xc2410c, 0x7c2d12]),
    ("amber", [0xfef3c7, 0xfcd34d, 0xf59e0b, 0xb45309, 0x78350f]),
    ("yellow", [0xfef9c3, 0xfde047, 0xeab308, 0xa16207, 0x713f12]),
    ("green", [0xdcfce7, 0x86efac, 0x22c55e, 0x15803d, 0x14532d]),
    ("emerald", [0xd1fae5, 0x6ee7b7, 0x10b981, 0x047857, 0x064e3b]),
    ("teal", [0xccfbf1, 0x5eead4, 0x14b8a6, 0x0f766e, 0x134e4a]),
    ("cyan", [0xcffafe, 0x67e8f9, 0x06b6d4, 0x0e7490, 0x164e63]),
    ("sky", [0xe0f2fe, 0x7dd3fc, 0x0ea5e9, 0x0369a1, 0x0c4a6e]),
    ("blue", [0xdbeafe, 0x93c5fd, 0x3b82f6, 0x1d4ed8, 0x1e3a8a]),
    ("indigo", [0xe0e7ff, 0xa5b4fc, 0x6366f1, 0x4338ca, 0x312e81]),
    ("violet", [0xede9fe, 0xc4b5fd, 0x8b5cf6, 0x6d28d9, 0x4c1d95]),
    ("purple", [0xf3e8ff, 0xd8b4fe, 0xa855f7, 0x7e22ce, 0x581c87]),
    ("pink", [0xfce7f3, 0xf9a8d4, 0xec4899, 0xbe185d, 0x831843]),
    ("rose", [0xffe4e6, 0xfda4af, 0xf43f5e, 0xbe123c, 0x881337]),
];

fn from_u32(rgb: u32) -> RgbColor {
    RgbColor::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// Looks up `hue-shade` (`indigo-500`, `sky-50`, `rose-950`) or a bare hue (shade 500).
fn palette_color(name: &str) -> Option<RgbColor> {
    let (hue, shade) = match name.rsplit_once('-') {
        Some((hue, shade)) => (hue, shade.parse::<u32>().ok()?),
        None => (name, 500),
    };
    let anchors = PALETTE.iter().find(|(h, _)| *h == hue).map(|(_, a)| a)?;
    let anchor = |i: usize| from_u32(anchors[i]);

    match shade {
        50 => Some(anchor(0).mix(RgbColor::WHITE, 0.5)),
        950 => Some(anchor(4).mix(RgbColor::BLACK, 0.3)),
        100..=900 if shade % 100 == 0 => {
            let step = (shade / 100) as usize; // 1..=9
            if step % 2 == 1 {
                Some(anchor(step / 2))
            } else {
                // Even steps sit halfway between their odd neighbours.
                Some(anchor(step / 2 - 1).mix(anchor(step / 2), 0.5))
            }
        }
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<RgbColor> {
    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let v = |i: usize| u8::from_str_radix(&digits[i..=i], 16).map(|d| d * 17).ok();
            Some(RgbColor::new(v(0)?, v(1)?, v(2)?))
        }
        6 => {
            let v = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
            Some(RgbColor::new(v(0)?, v(2)?, v(4)?))
        }
        _ => None,
    }
}

fn parse_rgb_function(text: &str) -> Option<RgbColor> {
    let inner = text
        .strip_prefix("rgba(")
        .or_else(|| text.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v = p.parse::<f64>().ok()?;
        (0.0..=255.0).contains(&v).then(|| v.round() as u8)
    };
    Some(RgbColor::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
    ))
}

/// Parses one direct color: `#rgb`, `#rrggbb`, `rgb(...)`, `white`, `black`,
/// or a palette name with an optional `bg-`/`from-`/`via-`/`to-` prefix.
pub fn parse_color(token: &str) -> Option<RgbColor> {
    let token = token.trim().to_ascii_lowercase();
    if token.starts_with('#') {
        return parse_hex(&token);
    }
    if token.starts_with("rgb") {
        return parse_rgb_function(&token);
    }
    let name = ["bg-", "from-", "via-", "to-"]
        .iter()
        .find_map(|p| token.strip_prefix(p))
        .unwrap_or(&token);
    match name {
        "white" => Some(RgbColor::WHITE),
        "black" => Some(RgbColor::BLACK),
        _ => palette_color(name),
    }
}

/// Resolves a scale spec into its gradient stops.
///
/// Accepts a direct color, a positional list (`"blue-500, indigo-500, purple-600"`)
/// or prefixed stops (`"from-blue-500 via-indigo-500 to-purple-600"`). Unknown
/// tokens are skipped; if nothing resolves the result is the solid [`DEFAULT_COLOR`].
pub fn resolve_scale(spec: &str) -> Gradient {
    let spec = spec.trim();
    if spec.is_empty() {
        return Gradient::solid(DEFAULT_COLOR);
    }
    if let Some(color) = parse_color(spec) {
        return Gradient::solid(color);
    }

    let tokens: Vec<String> = spec
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    let prefixed = tokens
        .iter()
        .any(|t| t.starts_with("from-") || t.starts_with("via-") || t.starts_with("to-"));

    let stops: Vec<RgbColor> = if prefixed {
        let pick = |prefix: &str| {
            tokens
                .iter()
                .filter(|t| t.starts_with(prefix))
                .find_map(|t| parse_color(t))
        };
        [pick("from-"), pick("via-"), pick("to-")]
            .into_iter()
            .flatten()
            .collect()
    } else {
        tokens.iter().filter_map(|t| parse_color(t)).take(3).collect()
    };

    if stops.is_empty() {
        debug!("Unknown color scale '{}', using default", spec);
        Gradient::solid(DEFAULT_COLOR)
    } else {
        Gradient { stops }
    }
}

/// Resolves a scale spec to the single color that represents it (its start stop).
pub fn resolve_color(spec: &str) -> RgbColor {
    resolve_scale(spec).base()
}

/// `luma > 160` ⇒ light background ⇒ dark foreground text.
pub fn is_light(color: RgbColor) -> bool {
    color.luma() > LIGHT_LUMA_THRESHOLD
}

/// Lightness of a raw spec. A spec with no parseable color at all counts as dark,
/// which forces light text.
pub fn is_light_spec(spec: &str) -> bool {
    let spec = spec.trim();
    let parsed_anything = parse_color(spec).is_some()
        || spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .any(|t| parse_color(t).is_some());
    parsed_anything && is_light(resolve_color(spec))
}

/// A resolved colored header band: background scale plus contrast-safe foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub scale: Gradient,
    pub foreground: RgbColor,
    pub light: bool,
}

impl Band {
    /// Resolves a band from a scale spec; contrast is decided for this band alone.
    pub fn from_spec(spec: &str) -> Band {
        let scale = resolve_scale(spec);
        let light = is_light_spec(spec);
        Band {
            foreground: if light { DARK_TEXT } else { LIGHT_TEXT },
            scale,
            light,
        }
    }

    /// Inline CSS for the band element.
    pub fn css(&self) -> String {
        format!(
            "background: {}; color: {};",
            self.scale.css(),
            self.foreground.to_hex()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_unknown_specs_fall_back_to_default() {
        assert_eq!(resolve_color(""), DEFAULT_COLOR);
        assert_eq!(resolve_color("not-a-color"), DEFAULT_COLOR);
        assert_eq!(resolve_color("#zzzzzz"), DEFAULT_COLOR);
    }

    #[test]
    fn default_is_dark_and_deterministic() {
        assert!(!is_light(DEFAULT_COLOR));
        assert_eq!(is_light(DEFAULT_COLOR), is_light(resolve_color("")));
        assert!(!is_light_spec("garbage"));
    }

    #[test]
    fn parses_direct_colors() {
        assert_eq!(resolve_color("#ffffff"), RgbColor::WHITE);
        assert_eq!(resolve_color("#f00"), RgbColor::new(255, 0, 0));
        assert_eq!(resolve_color("rgb(10, 20, 30)"), RgbColor::new(10, 20, 30));
        assert_eq!(resolve_color("indigo-500"), DEFAULT_COLOR);
    }

    #[test]
    fn interpolates_intermediate_shades() {
        let c400 = parse_color("blue-400").unwrap();
        let c300 = parse_color("blue-300").unwrap();
        let c500 = parse_color("blue-500").unwrap();
        assert_eq!(c400, c300.mix(c500, 0.5));
        assert!(parse_color("blue-450").is_none());
    }

    #[test]
    fn prefixed_gradient_with_middle_has_three_stops() {
        let g = resolve_scale("from-blue-500 via-indigo-500 to-purple-700");
        assert_eq!(g.stops.len(), 3);
        assert!(g.css().starts_with("linear-gradient(to right, #3b82f6, #6366f1,"));
    }

    #[test]
    fn gradient_without_middle_has_two_stops() {
        let g = resolve_scale("from-sky-100 to-sky-300");
        assert_eq!(g.stops.len(), 2);
        let positional = resolve_scale("sky-100, sky-300");
        assert_eq!(g, positional);
    }

    #[test]
    fn light_threshold_uses_luma() {
        assert!(!is_light(RgbColor::new(150, 150, 150)));
        assert!(is_light(RgbColor::new(170, 170, 170)));
        // Pure green is bright (luma ~150) but still below the threshold.
        assert!(!is_light(RgbColor::new(0, 255, 0)));
        assert!(is_light(RgbColor::WHITE));
        assert!(!is_light(RgbColor::BLACK));
    }

    #[test]
    fn bands_decide_contrast_independently() {
        let cycle = Band::from_spec("from-indigo-900 to-purple-900");
        let group = Band::from_spec("from-amber-100 to-yellow-100");
        assert_eq!(cycle.foreground, LIGHT_TEXT);
        assert_eq!(group.foreground, DARK_TEXT);
    }
}
