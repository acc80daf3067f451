// extensions/color.rs
//
// RGB colour helpers: editor hex strings in, linear 0..1 triples out,
// plus HSL round-tripping for hue-cycling effects.

use glam::Vec3;

/// Parse `#rgb` or `#rrggbb` (leading `#` optional).
pub fn parse_hex(text: &str) -> Option<Vec3> {
    let hex = text.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    u32::from_str_radix(&expanded, 16).ok().map(from_u32)
}

/// Unpack `0xRRGGBB`.
pub fn from_u32(packed: u32) -> Vec3 {
    let r = ((packed >> 16) & 0xff) as f32 / 255.0;
    let g = ((packed >> 8) & 0xff) as f32 / 255.0;
    let b = (packed & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

/// Format as `#rrggbb`.
pub fn to_hex(rgb: Vec3) -> String {
    let c = (rgb.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    format!("#{:02x}{:02x}{:02x}", c.x as u8, c.y as u8, c.z as u8)
}

/// Convert RGB to (hue, saturation, lightness), all in [0, 1].
pub fn rgb_to_hsl(rgb: Vec3) -> Vec3 {
    let max = rgb.max_element();
    let min = rgb.min_element();
    let l = (max + min) / 2.0;
    if (max - min).abs() < f32::EPSILON {
        return Vec3::new(0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == rgb.x {
        (rgb.y - rgb.z) / d + if rgb.y < rgb.z { 6.0 } else { 0.0 }
    } else if max == rgb.y {
        (rgb.z - rgb.x) / d + 2.0
    } else {
        (rgb.x - rgb.y) / d + 4.0
    };
    Vec3::new(h / 6.0, s, l)
}

/// Convert (hue, saturation, lightness) to RGB. Hue wraps.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Serde helper: write colours back out in the editor's hex form.
pub fn serialize_hex<S: serde::Serializer>(rgb: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(*rgb))
}
