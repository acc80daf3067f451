use serde::Serialize;
use serde_json::Value;

use crate::extensions::color;
use crate::program::value::ParamValue;

/// Structural role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    /// Script head; defines the trigger. Valid only at position 0.
    Hat,
    Command,
    /// Produces a value; has no effect as a statement.
    Reporter,
    /// Owns a nested child sequence (loops, conditionals).
    ContainerCommand,
}

/// Palette grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Events,
    Motion,
    Looks,
    Effects,
    Control,
    Variables,
    Sound,
    Ui,
    Objects,
    Game,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Number,
    Text,
    /// One of a fixed set of labels.
    Enum(&'static [&'static str]),
    /// `#rgb`, `#rrggbb` or a packed `0xRRGGBB` number.
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Number(f64),
    Text(&'static str),
    Color(u32),
}

/// One entry of a block's parameter schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamDefault,
}

impl ParamSpec {
    pub const fn number(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Number,
            default: ParamDefault::Number(default),
        }
    }

    pub const fn text(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Text,
            default: ParamDefault::Text(default),
        }
    }

    pub const fn choice(
        name: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Enum(options),
            default: ParamDefault::Text(default),
        }
    }

    pub const fn color(name: &'static str, default: u32) -> Self {
        Self {
            name,
            kind: ParamKind::Color,
            default: ParamDefault::Color(default),
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match self.default {
            ParamDefault::Number(n) => ParamValue::Number(n),
            ParamDefault::Text(t) => ParamValue::Text(t.to_string()),
            ParamDefault::Color(c) => ParamValue::Color(color::from_u32(c)),
        }
    }

    /// Validate a raw editor value against this schema entry.
    /// Anything missing or ill-typed becomes the default.
    pub fn coerce(&self, raw: Option<&Value>) -> ParamValue {
        let coerced = raw.and_then(|raw| match self.kind {
            ParamKind::Number => number_from(raw).map(ParamValue::Number),
            ParamKind::Text => match raw {
                Value::String(s) => Some(ParamValue::Text(s.clone())),
                Value::Number(n) => Some(ParamValue::Text(n.to_string())),
                Value::Bool(b) => Some(ParamValue::Text(b.to_string())),
                _ => None,
            },
            ParamKind::Enum(options) => raw
                .as_str()
                .filter(|s| options.iter().any(|o| o == s))
                .map(|s| ParamValue::Text(s.to_string())),
            ParamKind::Color => match raw {
                Value::String(s) => color::parse_hex(s).map(ParamValue::Color),
                Value::Number(n) => n
                    .as_u64()
                    .filter(|&packed| packed <= 0xff_ffff)
                    .map(|packed| ParamValue::Color(color::from_u32(packed as u32))),
                _ => None,
            },
        });
        coerced.unwrap_or_else(|| self.default_value())
    }
}

/// JSON numbers and numeric strings; non-finite values are rejected.
fn number_from(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Static description of one palette block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockDefinition {
    pub id: &'static str,
    pub category: Category,
    pub kind: BlockKind,
    pub params: &'static [ParamSpec],
    pub opcode: &'static str,
}

impl BlockDefinition {
    pub fn is_hat(&self) -> bool {
        self.kind == BlockKind::Hat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_numeric_strings() {
        let param = ParamSpec::number("x", 1.0);
        assert_eq!(param.coerce(Some(&json!(2.5))), ParamValue::Number(2.5));
        assert_eq!(param.coerce(Some(&json!(" 4 "))), ParamValue::Number(4.0));
        assert_eq!(param.coerce(Some(&json!("abc"))), ParamValue::Number(1.0));
        assert_eq!(param.coerce(Some(&json!(null))), ParamValue::Number(1.0));
        assert_eq!(param.coerce(None), ParamValue::Number(1.0));
    }

    #[test]
    fn enums_reject_unknown_labels() {
        let param = ParamSpec::choice("axis", &["x", "y", "z"], "y");
        assert_eq!(param.coerce(Some(&json!("z"))), ParamValue::Text("z".into()));
        assert_eq!(param.coerce(Some(&json!("w"))), ParamValue::Text("y".into()));
    }

    #[test]
    fn colors_accept_hex_and_packed() {
        let param = ParamSpec::color("color", 0x000000);
        assert_eq!(
            param.coerce(Some(&json!("#00f"))),
            ParamValue::Color(glam::Vec3::new(0.0, 0.0, 1.0))
        );
        assert_eq!(
            param.coerce(Some(&json!(0xff0000))),
            ParamValue::Color(glam::Vec3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(param.coerce(Some(&json!("red"))), ParamValue::Color(glam::Vec3::ZERO));
    }

    #[test]
    fn text_stringifies_numbers() {
        let param = ParamSpec::text("msg", "go");
        assert_eq!(param.coerce(Some(&json!(7))), ParamValue::Text("7".into()));
        assert_eq!(param.coerce(Some(&json!([1]))), ParamValue::Text("go".into()));
    }
}
