use crate::foundation::color::Color;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::model::JsonMap;
use serde_json::Value;

/// Declared type of an App config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line string.
    String,
    /// Multi-line string.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// `true` / `false`.
    Boolean,
    /// Color, normalized to a hex string.
    Color,
    /// One of a fixed list of strings.
    Select,
    /// Arbitrary JSON.
    Json,
}

/// Schema entry for one App config field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name, also the override key in `data.config`.
    pub name: String,
    /// Declared type.
    pub kind: FieldKind,
    /// Value used when the node does not override the field.
    pub default: Option<Value>,
    /// Whether resolution fails when neither an override nor a default exists.
    pub required: bool,
    /// Allowed values for [`FieldKind::Select`].
    pub options: Vec<String>,
}

impl FieldSpec {
    /// Optional field without a default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            options: Vec::new(),
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict a select field to the given options.
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| (*s).to_owned()).collect();
        self
    }
}

/// An App's effective configuration: declared defaults merged with node overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: JsonMap,
}

/// Merge field defaults with a node's overrides.
///
/// An override wins when its key is declared in `fields`; otherwise the declared default is used.
/// Unknown override keys are ignored. Values are coerced to the declared kind (numeric strings to
/// numbers, `"true"`/`"false"` to booleans, colors to hex). A value that cannot be coerced, or a
/// required field with neither override nor default, is a configuration fault.
pub fn resolve_config(fields: &[FieldSpec], overrides: &JsonMap) -> InkframeResult<ResolvedConfig> {
    let mut values = JsonMap::new();
    for field in fields {
        let raw = overrides
            .get(&field.name)
            .filter(|v| !v.is_null())
            .or(field.default.as_ref());
        match raw {
            Some(raw) => {
                let v = coerce(field, raw).map_err(|msg| {
                    InkframeError::config(format!("field '{}': {msg}", field.name))
                })?;
                values.insert(field.name.clone(), v);
            }
            None if field.required => {
                return Err(InkframeError::config(format!(
                    "field '{}' is required and has no default",
                    field.name
                )));
            }
            None => {}
        }
    }
    Ok(ResolvedConfig { values })
}

fn coerce(field: &FieldSpec, raw: &Value) -> Result<Value, String> {
    match field.kind {
        FieldKind::String | FieldKind::Text => match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(format!("expected a string, got {other}")),
        },
        FieldKind::Integer => match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(Value::from(f as i64)),
                _ => Err(format!("expected an integer, got {n}")),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected an integer, got \"{s}\"")),
            other => Err(format!("expected an integer, got {other}")),
        },
        FieldKind::Float => match raw {
            Value::Number(_) => Ok(raw.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a number, got \"{s}\"")),
            other => Err(format!("expected a number, got {other}")),
        },
        FieldKind::Boolean => match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a boolean, got \"{s}\"")),
            },
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            other => Err(format!("expected a boolean, got {other}")),
        },
        FieldKind::Color => {
            let color: Color = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
            Ok(Value::String(color.to_hex()))
        }
        FieldKind::Select => {
            let Value::String(s) = raw else {
                return Err(format!("expected one of {:?}, got {raw}", field.options));
            };
            if field.options.is_empty() || field.options.iter().any(|o| o == s) {
                Ok(raw.clone())
            } else {
                Err(format!("expected one of {:?}, got \"{s}\"", field.options))
            }
        }
        FieldKind::Json => match raw {
            Value::String(s) => Ok(serde_json::from_str(s).unwrap_or_else(|_| raw.clone())),
            _ => Ok(raw.clone()),
        },
    }
}

impl ResolvedConfig {
    /// Build directly from already-resolved values.
    pub fn from_values(values: JsonMap) -> Self {
        Self { values }
    }

    /// Raw value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// All resolved values.
    pub fn values(&self) -> &JsonMap {
        &self.values
    }

    fn missing(name: &str) -> InkframeError {
        InkframeError::config(format!("field '{name}' has no value"))
    }

    /// String field (also accepts text/select/color fields).
    pub fn str(&self, name: &str) -> InkframeResult<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| Self::missing(name))
    }

    /// String field, `None` when unset or empty.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Integer field.
    pub fn i64(&self, name: &str) -> InkframeResult<i64> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| Self::missing(name))
    }

    /// Float field (integers are widened).
    pub fn f64(&self, name: &str) -> InkframeResult<f64> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| Self::missing(name))
    }

    /// Boolean field.
    pub fn bool(&self, name: &str) -> InkframeResult<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| Self::missing(name))
    }

    /// Color field.
    pub fn color(&self, name: &str) -> InkframeResult<Color> {
        let s = self.str(name)?;
        Color::parse(s).map_err(|e| InkframeError::config(format!("field '{name}': {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/apps/config.rs"]
mod tests;
