use serde_json::{json, Value};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use crate::error::RouteError;
use crate::registry::HandlerDescriptor;
use crate::transport::Params;

/// Maximum number of positional arguments before heap allocation.
/// Paths rarely carry more than a handful of parameter segments.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Positional arguments as `(parameter name, value)` in slot order.
pub type ParamVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_PARAMS]>;

/// Concrete argument set for one handler call.
///
/// Produced by [`ParamBinder::bind`] and consumed by value when the handler
/// is invoked, so one set of arguments can only ever feed one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    /// Path segments bound to required/optional/rest slots, in order
    pub positional: ParamVec,
    /// Keyword arguments, including defaults of unfilled optional parameters
    pub keyword: Params,
}

impl BoundArguments {
    /// Look a parameter up by name, positional slots first.
    ///
    /// When a rest parameter collected several segments, the last one wins;
    /// use [`positional_values`](Self::positional_values) for all of them.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.positional
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
            .or_else(|| self.keyword.get(name))
    }

    /// String value of a parameter, if bound and a string
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Values of the positional arguments in order
    pub fn positional_values(&self) -> impl Iterator<Item = &Value> {
        self.positional.iter().map(|(_, v)| v)
    }

    /// Every value bound under `name`: each positional slot, then the keyword.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.positional
            .iter()
            .filter(move |(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
            .chain(self.keyword.get(name))
    }

    /// Mutable form of [`values`](Self::values).
    pub fn values_mut<'a>(&'a mut self, name: &'a str) -> impl Iterator<Item = &'a mut Value> + 'a {
        self.positional
            .iter_mut()
            .filter(move |(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
            .chain(self.keyword.get_mut(name))
    }

    /// Replace the value [`get`](Self::get) would return for `name`.
    ///
    /// Only that one slot changes; other segments collected by a rest
    /// parameter keep their values. Returns `false` when nothing is bound
    /// under that name.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        let slot = self
            .positional
            .iter_mut()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
            .or_else(|| self.keyword.get_mut(name));
        match slot {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// `{"args": [...], "kwargs": {...}}`
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "args": self.positional_values().cloned().collect::<Vec<_>>(),
            "kwargs": self.keyword,
        })
    }
}

/// Stateless binder; all inputs come from the request and the descriptor.
pub struct ParamBinder;

impl ParamBinder {
    /// Overlay body parameters on query parameters; body wins on collision.
    #[must_use]
    pub fn merge(query: &Params, body: &Params) -> Params {
        let mut merged = query.clone();
        merged.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Bind segments and keywords to `descriptor`, then run its validators.
    pub fn bind(
        segments: &[String],
        keywords: Params,
        descriptor: &HandlerDescriptor,
    ) -> Result<BoundArguments, RouteError> {
        let required = descriptor.required_params();
        let optional = descriptor.optional_params();
        let (k, m) = descriptor.arity();
        let n = segments.len();

        if let Some(name) = required.get(n) {
            return Err(RouteError::MissingPathParam {
                name: name.to_string(),
            });
        }
        let rest = descriptor.rest_param();
        if n > k + m && rest.is_none() {
            return Err(RouteError::TooManyPathParams {
                expected: k + m,
                received: n,
            });
        }

        let mut args = BoundArguments::default();
        for (i, segment) in segments.iter().enumerate() {
            let slot = if i < k {
                Arc::clone(&required[i])
            } else if i < k + m {
                Arc::clone(&optional[i - k].name)
            } else if let Some(rest) = rest {
                Arc::clone(rest)
            } else {
                // n <= k + m was checked above
                break;
            };
            args.positional.push((slot, Value::String(segment.clone())));
        }
        let filled_optional = n.saturating_sub(k).min(m);
        let rest_filled = n > k + m;

        for (key, value) in keywords {
            let positional = required.iter().any(|r| r.as_ref() == key)
                || optional[..filled_optional]
                    .iter()
                    .any(|p| p.name.as_ref() == key)
                || (rest_filled && rest.is_some_and(|r| r.as_ref() == key));
            if positional {
                return Err(RouteError::AmbiguousParam { name: key });
            }
            if descriptor.is_optional(&key) || descriptor.accepts_variadic_keyword() {
                args.keyword.insert(key, value);
            } else {
                return Err(RouteError::UnexpectedParam { name: key });
            }
        }

        for param in &optional[filled_optional..] {
            args.keyword
                .entry(param.name.to_string())
                .or_insert_with(|| param.default.clone());
        }

        for validator in descriptor.validators() {
            validator.validate(&mut args)?;
        }

        debug!(
            handler = descriptor.name().unwrap_or("<anonymous>"),
            positional = args.positional.len(),
            keyword = args.keyword.len(),
            "Arguments bound"
        );
        Ok(args)
    }
}
