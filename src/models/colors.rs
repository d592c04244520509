use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        RgbColor { red, green, blue }
    }

    /// Perceived brightness, `0.299·R + 0.587·G + 0.114·B`, in the 0–255 range.
    pub fn luma(&self) -> f64 {
        0.299 * f64::from(self.red) + 0.587 * f64::from(self.green) + 0.114 * f64::from(self.blue)
    }

    /// `#rrggbb` form used in CSS and SVG output.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Mixes this color towards `other`; `amount` 0.0 keeps `self`, 1.0 yields `other`.
    pub fn mix(&self, other: RgbColor, amount: f64) -> RgbColor {
        let t = amount.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        RgbColor::new(
            lerp(self.red, other.red),
            lerp(self.green, other.green),
            lerp(self.blue, other.blue),
        )
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A resolved color scale: a solid color (one stop) or a 2- or 3-stop linear gradient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    pub stops: Vec<RgbColor>,
}

impl Gradient {
    pub fn solid(color: RgbColor) -> Self {
        Gradient {
            stops: vec![color],
        }
    }

    /// The color the gradient starts with; it decides the header text contrast.
    pub fn base(&self) -> RgbColor {
        self.stops.first().copied().unwrap_or(RgbColor::BLACK)
    }

    /// True when the scale has more than one stop.
    pub fn is_gradient(&self) -> bool {
        self.stops.len() > 1
    }

    /// CSS `background` value: `linear-gradient(...)` for multi-stop scales, a hex color otherwise.
    pub fn css(&self) -> String {
        if self.is_gradient() {
            let stops: Vec<String> = self.stops.iter().map(RgbColor::to_hex).collect();
            format!("linear-gradient(to right, {})", stops.join(", "))
        } else {
            self.base().to_hex()
        }
    }
}
