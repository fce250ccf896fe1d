use std::str::FromStr;

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

use crate::data::category::Dimension;

// ---------------------------------------------------------------------------
// Fixed category colours
// ---------------------------------------------------------------------------

/// Colour for labels that have no entry in their dimension's table
/// (e.g. the unknown-code sentinel).
pub const FALLBACK_HEX: &str = "#A6A6A6";

const SEX_COLORS: &[(&str, &str)] = &[("Masculino", "#2E86C1"), ("Feminino", "#E74C3C")];

const RACE_COLORS: &[(&str, &str)] = &[
    ("Não declarado", "#808080"),
    ("Branca", "#E6E6E6"),
    ("Preta", "#2C3E50"),
    ("Parda", "#C4A484"),
    ("Amarela", "#FFD700"),
    ("Indígena", "#8B4513"),
    ("Não dispõe de informação", "#D3D3D3"),
];

const MARITAL_STATUS_COLORS: &[(&str, &str)] = &[
    ("Não informado", "#808080"),
    ("Solteiro(a)", "#3498DB"),
    ("Casado(a)/Mora com companheiro(a)", "#2ECC71"),
    ("Divorciado(a)/Desquitado(a)/Separado(a)", "#E74C3C"),
    ("Viúvo(a)", "#9B59B6"),
];

const AGE_BRACKET_COLORS: &[(&str, &str)] = &[
    ("Menor de 18 anos", "#3498DB"),
    ("Entre 18 e 21 anos", "#2ECC71"),
    ("Entre 22 e 25 anos", "#E74C3C"),
    ("Entre 26 e 30 anos", "#9B59B6"),
    ("Entre 31 e 40 anos", "#F1C40F"),
    ("Entre 41 e 50 anos", "#A569BD"),
    ("Entre 51 e 60 anos", "#5499C7"),
    ("Entre 61 e 70 anos", "#45B39D"),
    ("Maior de 70 anos", "#D35400"),
];

/// Hex colour of `label` within `dimension`.
pub fn category_color(dimension: Dimension, label: &str) -> &'static str {
    let table = match dimension {
        Dimension::Sex => SEX_COLORS,
        Dimension::Race => RACE_COLORS,
        Dimension::MaritalStatus => MARITAL_STATUS_COLORS,
        Dimension::AgeBracket => AGE_BRACKET_COLORS,
    };
    table
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, hex)| *hex)
        .unwrap_or(FALLBACK_HEX)
}

// ---------------------------------------------------------------------------
// Sequential "Reds" scale for the choropleth
// ---------------------------------------------------------------------------

/// ColorBrewer Reds, light to dark.
const REDS: [&str; 9] = [
    "#FFF5F0", "#FEE0D2", "#FCBBA1", "#FC9272", "#FB6A4A", "#EF3B2C", "#CB181D", "#A50F15",
    "#67000D",
];

/// Name of the sequential scale, as reported in chart specs.
pub const SEQUENTIAL_SCALE: &str = "Reds";

/// Colour at position `t` (clamped to 0–1) of the Reds scale, as `#RRGGBB`.
///
/// Stops are interpolated in linear RGB.
pub fn reds(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let segments = (REDS.len() - 1) as f64;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(REDS.len() - 2);
    let frac = (pos - i as f64) as f32;
    if frac <= 0.0 {
        return REDS[i].to_string();
    }
    if frac >= 1.0 {
        return REDS[i + 1].to_string();
    }

    let (Some(a), Some(b)) = (parse_hex(REDS[i]), parse_hex(REDS[i + 1])) else {
        return FALLBACK_HEX.to_string();
    };
    let a: LinSrgb = a.into_format::<f32>().into_linear();
    let b: LinSrgb = b.into_format::<f32>().into_linear();
    let mixed: Srgb<u8> = Srgb::from_linear(a.mix(b, frac));
    to_hex(mixed)
}

/// Scale position of `value` between `min` and `max`. A degenerate range maps
/// everything to the darkest colour.
pub fn scale_position(value: u64, min: u64, max: u64) -> f64 {
    if max <= min {
        return 1.0;
    }
    (value.saturating_sub(min)) as f64 / (max - min) as f64
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

fn parse_hex(hex: &str) -> Option<Srgb<u8>> {
    Srgb::<u8>::from_str(hex).ok()
}

fn to_hex(c: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
}

/// Convert a `#RRGGBB` string to an egui colour; malformed input gives gray.
pub fn to_color32(hex: &str) -> Color32 {
    parse_hex(hex)
        .map(|c| Color32::from_rgb(c.red, c.green, c.blue))
        .unwrap_or(Color32::GRAY)
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 150.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}
