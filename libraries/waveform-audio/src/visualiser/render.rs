//! Drawable output of the visualiser

use std::f32::consts::PI;

/// Straight-alpha RGBA colour, each channel in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Build a colour from its channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Colours the bars are drawn with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPalette {
    /// Bar colour at the centre of the display
    pub base: Rgba,
    /// Colour bars fade towards at the edges
    pub background: Rgba,
}

impl Default for BarPalette {
    fn default() -> Self {
        Self {
            base: Rgba::new(0.21, 0.52, 0.89, 1.0),
            background: Rgba::TRANSPARENT,
        }
    }
}

impl BarPalette {
    /// Colour of a bar at progress `f` across the display
    pub fn colour_at(&self, f: f32, fade_edges: bool) -> Rgba {
        if fade_edges {
            self.base.lerp(self.background, fade_weight(f))
        } else {
            self.base
        }
    }
}

/// Background weight `1 - sin(πf)`: 1 at both edges, 0 in the middle
pub fn fade_weight(f: f32) -> f32 {
    1.0 - (PI * f).sin()
}

/// One bar to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Left edge in pixels
    pub x: u32,
    /// Height in pixels, within `[0, height]` of the render call
    pub height: f32,
    /// Fill colour
    pub colour: Rgba,
}
