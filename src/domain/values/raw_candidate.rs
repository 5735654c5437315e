use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An unscored record exactly as a collector produced it.
///
/// Collectors disagree on field names and shapes, so the record stays an
/// untyped JSON value until the normalizer resolves it into a
/// [`PartialLead`](crate::domain::entities::lead::PartialLead). Nothing past
/// the normalizer sees this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCandidate(Value);

impl RawCandidate {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// First non-blank string among `keys`. Numbers are rendered as text.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let obj = self.0.as_object()?;
        keys.iter().find_map(|k| match obj.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// First numeric value among `keys`. Numeric strings are accepted.
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        let obj = self.0.as_object()?;
        keys.iter().find_map(|k| match obj.get(*k)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

impl From<Value> for RawCandidate {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
