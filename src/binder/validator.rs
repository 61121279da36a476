use serde::Deserialize;
use serde_json::Value;

use super::BoundArguments;
use crate::error::RouteError;

/// One step of a descriptor's validator pipeline.
///
/// Steps either enrich the bound arguments (coercion, derived values) or
/// reject them with a typed error. They run in the order they were attached.
pub trait ParamValidator: Send + Sync {
    fn validate(&self, args: &mut BoundArguments) -> Result<(), RouteError>;
}

impl<F> ParamValidator for F
where
    F: Fn(&mut BoundArguments) -> Result<(), RouteError> + Send + Sync,
{
    fn validate(&self, args: &mut BoundArguments) -> Result<(), RouteError> {
        self(args)
    }
}

/// Target type for [`Coerce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Number,
    Boolean,
    String,
}

impl ParamType {
    fn convert(self, raw: &str) -> Option<Value> {
        match self {
            ParamType::Integer => raw.parse::<i64>().ok().map(Value::from),
            ParamType::Number => raw.parse::<f64>().ok().map(Value::from),
            ParamType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            ParamType::String => Some(Value::String(raw.to_string())),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::String => "string",
        }
    }
}

/// Convert a string-valued parameter (or each string in an array) to a type.
///
/// Every slot bound under the name is converted, so a rest parameter fails on
/// its first bad segment. Absent parameters and `null` defaults are left alone.
#[derive(Debug, Clone)]
pub struct Coerce {
    name: String,
    ty: ParamType,
}

impl Coerce {
    pub fn new(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }

    fn coerce_one(&self, value: &Value) -> Result<Value, RouteError> {
        match value {
            Value::String(raw) => self.ty.convert(raw).ok_or_else(|| RouteError::InvalidParam {
                name: self.name.clone(),
                reason: format!("'{raw}' is not a valid {}", self.ty.as_str()),
            }),
            other => Ok(other.clone()),
        }
    }
}

impl ParamValidator for Coerce {
    fn validate(&self, args: &mut BoundArguments) -> Result<(), RouteError> {
        for value in args.values_mut(&self.name) {
            let coerced = match &*value {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|v| self.coerce_one(v))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                other => self.coerce_one(other)?,
            };
            *value = coerced;
        }
        Ok(())
    }
}

/// Reject the call unless `name` is bound to a non-null value.
#[derive(Debug, Clone)]
pub struct RequireParam {
    name: String,
}

impl RequireParam {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl ParamValidator for RequireParam {
    fn validate(&self, args: &mut BoundArguments) -> Result<(), RouteError> {
        let mut values = args.values(&self.name).peekable();
        if values.peek().is_some() && values.all(|v| !v.is_null()) {
            return Ok(());
        }
        Err(RouteError::InvalidParam {
            name: self.name.clone(),
            reason: "value is required".to_string(),
        })
    }
}

/// Restrict a bound parameter to a fixed set of values.
#[derive(Debug, Clone)]
pub struct OneOf {
    name: String,
    choices: Vec<Value>,
}

impl OneOf {
    pub fn new<I, V>(name: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.to_string(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl ParamValidator for OneOf {
    fn validate(&self, args: &mut BoundArguments) -> Result<(), RouteError> {
        match args.values(&self.name).find(|v| !self.choices.contains(v)) {
            None => Ok(()),
            Some(v) => Err(RouteError::InvalidParam {
                name: self.name.clone(),
                reason: format!("{v} is not one of {}", Value::Array(self.choices.clone())),
            }),
        }
    }
}
