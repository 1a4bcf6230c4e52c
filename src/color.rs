use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

use crate::selection::ActiveSelection;

/// Opacity of majors that are not part of the active selection.
pub const DIMMED_OPACITY: f32 = 0.3;

/// Plain 8-bit sRGB triple handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const LIGHT_GRAY: Rgb = Rgb(211, 211, 211);
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Highlight – how one major is drawn under the current selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Highlight {
    pub color: Rgb,
    pub opacity: f32,
}

// ---------------------------------------------------------------------------
// MajorColors: major → colour
// ---------------------------------------------------------------------------

/// Maps every major of the dataset to a stable colour.
#[derive(Debug, Clone)]
pub struct MajorColors {
    mapping: BTreeMap<String, Rgb>,
    default_color: Rgb,
}

impl MajorColors {
    /// Colours are assigned in sorted major order, so they do not depend on
    /// which majors the user has picked.
    pub fn new<S: AsRef<str>>(majors: &[S]) -> Self {
        let mut names: Vec<&str> = majors.iter().map(|m| m.as_ref()).collect();
        names.sort_unstable();
        names.dedup();

        let palette = generate_palette(names.len());
        let mapping = names
            .into_iter()
            .zip(palette)
            .map(|(m, c)| (m.to_string(), c))
            .collect();

        MajorColors {
            mapping,
            default_color: Rgb::LIGHT_GRAY,
        }
    }

    pub fn color_for(&self, major: &str) -> Rgb {
        self.mapping.get(major).copied().unwrap_or(self.default_color)
    }

    /// Full colour for admitted majors, light grey at reduced opacity for the rest.
    pub fn highlight(&self, major: &str, selection: &ActiveSelection) -> Highlight {
        if selection.emphasizes(major) {
            Highlight {
                color: self.color_for(major),
                opacity: 1.0,
            }
        } else {
            Highlight {
                color: Rgb::LIGHT_GRAY,
                opacity: DIMMED_OPACITY,
            }
        }
    }

    /// Legend entries (major → colour) for the renderer.
    pub fn legend_entries(&self) -> Vec<(String, Rgb)> {
        self.mapping.iter().map(|(m, c)| (m.clone(), *c)).collect()
    }
}
