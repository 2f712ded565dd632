// Gradient color math for the score indicator.
//
// The indicator's fill color follows a 101-step color ramp built from three
// anchor colors pinned at the score thresholds. All functions here are pure —
// the widget recomputes the scale on reconfiguration and interpolates into
// it on every score change.

use anyhow::{bail, Context, Result};

/// Number of interpolation steps in the color scale. The scale itself has
/// `GRADIENT_POINT_COUNT + 1` entries so both endpoints are exact anchors.
pub const GRADIENT_POINT_COUNT: usize = 100;

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a `#rrggbb` hex string (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            bail!("Invalid hex color {hex:?}: expected 6 hex digits");
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .with_context(|| format!("Invalid hex color {hex:?}"))
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear blend between two colors, `t` in [0,1].
    pub fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Map the three score thresholds onto scale indices, adjusted so the
/// control points are strictly increasing.
///
/// Each threshold lands at `floor(threshold * point_count)`, clipped into
/// `[0, point_count]`. Collisions are resolved from the highest index
/// backward: any point not strictly below its successor is pulled down to
/// `successor - 1`, which can push low control points negative when
/// thresholds are packed near zero. Negative control points are harmless —
/// `build_color_scale` clamps below the first anchor.
pub fn adjusted_control_points(point_count: usize, thresholds: [f64; 3]) -> [i64; 3] {
    let mut points = [0i64; 3];
    for (point, threshold) in points.iter_mut().zip(thresholds) {
        let raw = (threshold * point_count as f64).floor() as i64;
        *point = raw.clamp(0, point_count as i64);
    }
    for i in (0..points.len() - 1).rev() {
        if points[i] >= points[i + 1] {
            points[i] = points[i + 1] - 1;
        }
    }
    points
}

/// Build the full color scale: `point_count + 1` colors, piecewise-linear
/// between the anchors at the adjusted control points, clamped to the first
/// and last anchor outside them.
pub fn build_color_scale(
    anchors: [Rgb; 3],
    control_points: [i64; 3],
    point_count: usize,
) -> Vec<Rgb> {
    let [p0, p1, p2] = control_points;
    let mut scale = Vec::with_capacity(point_count + 1);
    for i in 0..=point_count as i64 {
        let color = if i <= p0 {
            anchors[0]
        } else if i >= p2 {
            anchors[2]
        } else if i <= p1 {
            Rgb::lerp(anchors[0], anchors[1], (i - p0) as f64 / (p1 - p0) as f64)
        } else {
            Rgb::lerp(anchors[1], anchors[2], (i - p1) as f64 / (p2 - p1) as f64)
        };
        scale.push(color);
    }
    scale
}

/// Map a score in [0,1] to a color by blending the two neighboring scale
/// entries at `score * 100` by the fractional offset between them.
pub fn interpolate_color(score: f64, scale: &[Rgb]) -> Rgb {
    if scale.is_empty() {
        return Rgb::default();
    }
    let max_index = scale.len() - 1;
    let position = score * GRADIENT_POINT_COUNT as f64;
    let lower = (position.floor().max(0.0) as usize).min(max_index);
    let upper = (position.ceil().max(0.0) as usize).min(max_index);
    let fraction = position - position.floor();
    Rgb::lerp(scale[lower], scale[upper], fraction)
}
