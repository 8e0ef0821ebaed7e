use crate::ast::{ColorValue, Dimension, TokenValue};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// Scalars serialize as themselves; structured values become nested objects
// so the JSON and TypeScript outputs keep their shape.
impl Serialize for TokenValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TokenValue::String(s) => serializer.serialize_str(s),
            TokenValue::Number(n) => serialize_number(*n, serializer),
            TokenValue::Color(color) => color.serialize(serializer),
            TokenValue::Dimension(dimension) => dimension.serialize(serializer),
            TokenValue::FontFamily(families) => families.serialize(serializer),
            TokenValue::CubicBezier(points) => points.serialize(serializer),
        }
    }
}

impl Serialize for ColorValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ColorValue::Literal(text) => serializer.serialize_str(text),
            ColorValue::Components {
                color_space,
                components,
                alpha,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("colorSpace", color_space)?;
                map.serialize_entry("components", components)?;
                if let Some(alpha) = alpha {
                    map.serialize_entry("alpha", alpha)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Number(f64);
        impl Serialize for Number {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_number(self.0, serializer)
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("value", &Number(self.value))?;
        map.serialize_entry("unit", &self.unit)?;
        map.end()
    }
}

// Whole numbers go out as integers (`16`, not `16.0`), matching the CSS output.
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}
