//! Payload filters
//!
//! Client filters use a small JSON grammar:
//!
//! ```json
//! {"must": [{"category": "news"}, {"year": {"gte": 2020, "lt": 2024}}]}
//! ```
//!
//! Each key/value pair of a `must` condition becomes one clause. Objects are
//! range clauses over the operators `gte`, `lte`, `gt` and `lt`; any other
//! value is an equality match. Unknown range operators are dropped without
//! error. `should` and `must_not` are accepted but never produce clauses.

use serde_json::{json, Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl RangeOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }

    fn holds(self, actual: f64, bound: f64) -> bool {
        match self {
            Self::Gte => actual >= bound,
            Self::Lte => actual <= bound,
            Self::Gt => actual > bound,
            Self::Lt => actual < bound,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Match { key: String, value: Value },
    Range { key: String, op: RangeOp, value: Value },
}

/// Conjunction of conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub must: Vec<Condition>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    /// Qdrant's native filter JSON.
    pub fn to_qdrant(&self) -> Value {
        if self.must.is_empty() {
            return json!({});
        }

        let must: Vec<Value> = self
            .must
            .iter()
            .map(|condition| match condition {
                Condition::Match { key, value } => json!({"key": key, "match": {"value": value}}),
                Condition::Range { key, op, value } => {
                    let mut range = Map::new();
                    range.insert(op.as_str().to_string(), value.clone());
                    json!({"key": key, "range": range})
                }
            })
            .collect();

        json!({ "must": must })
    }

    /// Evaluate against a payload. Keys may use dots to reach nested fields.
    pub fn matches(&self, payload: &Map<String, Value>) -> bool {
        self.must.iter().all(|condition| match condition {
            Condition::Match { key, value } => lookup(payload, key) == Some(value),
            Condition::Range { key, op, value } => {
                match (lookup(payload, key).and_then(Value::as_f64), value.as_f64()) {
                    (Some(actual), Some(bound)) => op.holds(actual, bound),
                    _ => false,
                }
            }
        })
    }
}

fn lookup<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut current = payload.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Parse a client filter. Returns `None` when the filter is absent, `null` or
/// an empty object.
pub fn build_filter(raw: Option<&Value>) -> Option<Filter> {
    let raw = raw?.as_object().filter(|obj| !obj.is_empty())?;

    let mut filter = Filter::default();

    let conditions = raw.get("must").and_then(Value::as_array);
    for condition in conditions.into_iter().flatten() {
        let Some(condition) = condition.as_object() else {
            continue;
        };

        for (key, value) in condition {
            match value {
                Value::Object(ranges) => {
                    for (op, bound) in ranges {
                        match RangeOp::parse(op) {
                            Some(op) => filter.must.push(Condition::Range {
                                key: key.clone(),
                                op,
                                value: bound.clone(),
                            }),
                            None => debug!("Dropping unknown range operator '{}' on '{}'", op, key),
                        }
                    }
                }
                other => filter.must.push(Condition::Match {
                    key: key.clone(),
                    value: other.clone(),
                }),
            }
        }
    }

    Some(filter)
}
