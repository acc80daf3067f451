use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;

use crate::extensions::color;

/// A parameter value after schema validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Color(#[serde(serialize_with = "color::serialize_hex")] Vec3),
}

/// Validated parameters of one compiled block, keyed by schema name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Typed reads from a [`ParamMap`].
///
/// Maps produced by the compiler hold every schema key with the schema's
/// kind, so the fallbacks only matter for hand-built maps.
pub trait Params {
    fn number(&self, name: &str) -> f64;
    fn text(&self, name: &str) -> &str;
    fn color(&self, name: &str) -> Vec3;

    fn float(&self, name: &str) -> f32 {
        self.number(name) as f32
    }

    fn vec3(&self, x: &str, y: &str, z: &str) -> Vec3 {
        Vec3::new(self.float(x), self.float(y), self.float(z))
    }
}

impl Params for ParamMap {
    fn number(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(ParamValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    fn text(&self, name: &str) -> &str {
        match self.get(name) {
            Some(ParamValue::Text(t)) => t,
            _ => "",
        }
    }

    fn color(&self, name: &str) -> Vec3 {
        match self.get(name) {
            Some(ParamValue::Color(c)) => *c,
            _ => Vec3::ONE,
        }
    }
}

/// World axis selected by an enum parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const LABELS: &'static [&'static str] = &["x", "y", "z"];

    pub fn from_label(label: &str) -> Self {
        match label {
            "x" => Axis::X,
            "z" => Axis::Z,
            _ => Axis::Y,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_fall_back_on_kind_mismatch() {
        let mut map = ParamMap::new();
        map.insert("n".into(), ParamValue::Number(2.5));
        map.insert("t".into(), ParamValue::Text("hi".into()));
        assert_eq!(map.number("n"), 2.5);
        assert_eq!(map.number("t"), 0.0);
        assert_eq!(map.text("t"), "hi");
        assert_eq!(map.text("missing"), "");
    }

    #[test]
    fn colors_serialize_as_hex() {
        let json = serde_json::to_string(&ParamValue::Color(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        assert_eq!(json, r##""#ff0000""##);
    }
}
