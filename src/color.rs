//! Integer RGB/HSV color math for frame and hint colors.
//!
//! The editor derives its decoration colors from the terminal's default
//! foreground and background instead of hard-coding a palette: the
//! background-frame band and the dimmed empty-message hint are both the
//! default colors nudged along the value axis. All math is integer 0..=255
//! per channel so repeated conversions stay deterministic.
//!
//! # Examples
//!
//! ```
//! use termline::color::{Rgb, adjust};
//!
//! let fg = Rgb::new(220, 220, 220);
//! let bg = Rgb::new(30, 30, 30);
//!
//! // Dark background: both colors move toward white.
//! let (dim_fg, band_bg) = adjust(fg, bg, 48);
//! assert!(band_bg.r > bg.r);
//! # let _ = dim_fg;
//! ```

/// An RGB color with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Opaque black.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Opaque white.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// An HSV color with 8-bit channels.
///
/// Hue uses the 0..=255 circle (six regions of 43), not degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert an RGB color to HSV.
#[must_use]
pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let rgb_min = rgb.r.min(rgb.g).min(rgb.b);
    let rgb_max = rgb.r.max(rgb.g).max(rgb.b);

    let mut hsv = Hsv {
        h: 0,
        s: 0,
        v: rgb_max,
    };
    if hsv.v == 0 {
        return hsv;
    }

    let span = u32::from(rgb_max - rgb_min);
    hsv.s = (255 * span / u32::from(hsv.v)) as u8;
    if hsv.s == 0 {
        return hsv;
    }

    // Six hue regions of 43 each; the offsets 0/85/171 are the region
    // anchors for max == r/g/b.
    hsv.h = if rgb_max == rgb.r {
        let d = i32::from(rgb.g) - i32::from(rgb.b);
        (43 * d / span as i32) as u8
    } else if rgb_max == rgb.g {
        let d = i32::from(rgb.b) - i32::from(rgb.r);
        (85 + 43 * d / span as i32) as u8
    } else {
        let d = i32::from(rgb.r) - i32::from(rgb.g);
        (171 + 43 * d / span as i32) as u8
    };

    hsv
}

/// Convert an HSV color to RGB.
#[must_use]
pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    if hsv.s == 0 {
        return Rgb::new(hsv.v, hsv.v, hsv.v);
    }

    let region = hsv.h / 43;
    let remainder = u32::from(hsv.h - region * 43) * 6;

    let v = u32::from(hsv.v);
    let s = u32::from(hsv.s);
    let p = (v * (255 - s) >> 8) as u8;
    let q = (v * (255 - (s * remainder >> 8)) >> 8) as u8;
    let t = (v * (255 - (s * (255 - remainder) >> 8)) >> 8) as u8;
    let v = hsv.v;

    match region {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// Shift a foreground/background pair along the value axis.
///
/// With a non-negative `delta`, on a light background (`bg` value >= 128)
/// both colors move toward black; on a dark background they move toward
/// white. A negative `delta` inverts the direction. Values saturate at the
/// channel bounds. The editor uses delta 32 to derive the background-frame
/// colors and delta 48 for the dimmed empty-message foreground.
#[must_use]
pub fn adjust(fg: Rgb, bg: Rgb, delta: i32) -> (Rgb, Rgb) {
    let mut hsv_fg = rgb_to_hsv(fg);
    let mut hsv_bg = rgb_to_hsv(bg);

    let magnitude = delta.unsigned_abs().min(255) as u8;
    let toward_black = (hsv_bg.v >= 128) == (delta >= 0);

    if toward_black {
        hsv_fg.v = hsv_fg.v.saturating_sub(magnitude);
        hsv_bg.v = hsv_bg.v.saturating_sub(magnitude);
    } else {
        hsv_fg.v = hsv_fg.v.saturating_add(magnitude);
        hsv_bg.v = hsv_bg.v.saturating_add(magnitude);
    }

    (hsv_to_rgb(hsv_fg), hsv_to_rgb(hsv_bg))
}
