//! Metadata filter grammar.
//!
//! Clients send a `where` object:
//!
//! ```json
//! {"genre": "dessert", "year": {"$gte": 2020}, "$or": [{"lang": "en"}, {"lang": "fr"}]}
//! ```
//!
//! [`MetadataFilter::parse`] turns it into a tree that the in-process engine evaluates with
//! [`MetadataFilter::matches`] and the Qdrant engine translates with
//! [`MetadataFilter::to_qdrant`].

mod error;
mod qdrant;


pub use error::FilterError;

use serde_json::{Map, Value};

/// Comparable literal inside a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn from_json(field: &str, value: &Value) -> Result<Self, FilterError> {
        match value {
            Value::String(s) => Ok(Scalar::String(s.clone())),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Integer(i)),
                None => n.as_f64().map(Scalar::Float).ok_or_else(|| FilterError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("unsupported number {n}"),
                }),
            },
            Value::Null => Err(FilterError::InvalidValue {
                field: field.to_string(),
                reason: "null is not comparable".to_string(),
            }),
            Value::Array(_) | Value::Object(_) => Err(FilterError::InvalidValue {
                field: field.to_string(),
                reason: "expected a string, number or boolean".to_string(),
            }),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Integer(_) | Scalar::Float(_) => "number",
            Scalar::Bool(_) => "bool",
        }
    }

    /// Equality against a stored metadata value. Numbers compare by value.
    fn matches_json(&self, value: &Value) -> bool {
        match (self, value) {
            (Scalar::String(a), Value::String(b)) => a == b,
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::Integer(_) | Scalar::Float(_), Value::Number(n)) => {
                match (self, n.as_i64()) {
                    (Scalar::Integer(a), Some(b)) => *a == b,
                    _ => self.as_f64() == n.as_f64(),
                }
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn holds(self, value: f64, bound: f64) -> bool {
        match self {
            RangeOp::Gt => value > bound,
            RangeOp::Gte => value >= bound,
            RangeOp::Lt => value < bound,
            RangeOp::Lte => value <= bound,
        }
    }
}

/// Parsed predicate over a document's metadata object.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    Eq { field: String, value: Scalar },
    Ne { field: String, value: Scalar },
    Range { field: String, op: RangeOp, bound: f64 },
    In { field: String, values: Vec<Scalar> },
    Nin { field: String, values: Vec<Scalar> },
    And(Vec<MetadataFilter>),
    Or(Vec<MetadataFilter>),
    Not(Box<MetadataFilter>),
}

impl MetadataFilter {
    /// Parses a `where` object. `{}` matches every document.
    pub fn parse(value: &Value) -> Result<Self, FilterError> {
        let Value::Object(map) = value else {
            return Err(FilterError::NotAnObject);
        };

        let mut clauses = Vec::with_capacity(map.len());
        for (key, operand) in map {
            clauses.push(Self::parse_entry(key, operand)?);
        }

        Ok(Self::conjunction(clauses))
    }

    /// Parses the query-string form (`?where=<json>`).
    pub fn parse_str(raw: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| FilterError::NotAnObject)?;
        Self::parse(&value)
    }

    fn conjunction(mut clauses: Vec<MetadataFilter>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            MetadataFilter::And(clauses)
        }
    }

    fn parse_entry(key: &str, operand: &Value) -> Result<Self, FilterError> {
        match key {
            "$and" | "$or" => {
                let items = match operand {
                    Value::Array(items) if !items.is_empty() => items,
                    _ => {
                        return Err(FilterError::InvalidOperand {
                            operator: key.to_string(),
                            expected: "a non-empty array of filters",
                        });
                    }
                };
                let children = items
                    .iter()
                    .map(Self::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if key == "$and" {
                    MetadataFilter::And(children)
                } else {
                    MetadataFilter::Or(children)
                })
            }
            "$not" => {
                if !operand.is_object() {
                    return Err(FilterError::InvalidOperand {
                        operator: key.to_string(),
                        expected: "a filter object",
                    });
                }
                Ok(MetadataFilter::Not(Box::new(Self::parse(operand)?)))
            }
            op if op.starts_with('$') => Err(FilterError::UnknownOperator {
                operator: op.to_string(),
            }),
            "" => Err(FilterError::EmptyField),
            field => Self::parse_field(field, operand),
        }
    }

    fn parse_field(field: &str, operand: &Value) -> Result<Self, FilterError> {
        let Value::Object(ops) = operand else {
            return Ok(MetadataFilter::Eq {
                field: field.to_string(),
                value: Scalar::from_json(field, operand)?,
            });
        };

        if ops.is_empty() {
            return Err(FilterError::InvalidValue {
                field: field.to_string(),
                reason: "empty operator object".to_string(),
            });
        }

        let mut clauses = Vec::with_capacity(ops.len());
        for (op, value) in ops {
            clauses.push(Self::parse_operator(field, op, value)?);
        }

        Ok(Self::conjunction(clauses))
    }

    fn parse_operator(field: &str, op: &str, value: &Value) -> Result<Self, FilterError> {
        let field_name = field.to_string();
        match op {
            "$eq" => Ok(MetadataFilter::Eq {
                field: field_name,
                value: Scalar::from_json(field, value)?,
            }),
            "$ne" => Ok(MetadataFilter::Ne {
                field: field_name,
                value: Scalar::from_json(field, value)?,
            }),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                let bound = value.as_f64().ok_or_else(|| FilterError::InvalidOperand {
                    operator: op.to_string(),
                    expected: "a number",
                })?;
                let op = match op {
                    "$gt" => RangeOp::Gt,
                    "$gte" => RangeOp::Gte,
                    "$lt" => RangeOp::Lt,
                    _ => RangeOp::Lte,
                };
                Ok(MetadataFilter::Range {
                    field: field_name,
                    op,
                    bound,
                })
            }
            "$in" | "$nin" => {
                let values = Self::parse_set(field, op, value)?;
                Ok(if op == "$in" {
                    MetadataFilter::In {
                        field: field_name,
                        values,
                    }
                } else {
                    MetadataFilter::Nin {
                        field: field_name,
                        values,
                    }
                })
            }
            other => Err(FilterError::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }

    fn parse_set(field: &str, op: &str, value: &Value) -> Result<Vec<Scalar>, FilterError> {
        let invalid = || FilterError::InvalidOperand {
            operator: op.to_string(),
            expected: "a non-empty array of values of one type",
        };

        let items = value.as_array().filter(|a| !a.is_empty()).ok_or_else(invalid)?;
        let values = items
            .iter()
            .map(|item| Scalar::from_json(field, item))
            .collect::<Result<Vec<_>, _>>()?;

        let kind = values[0].kind();
        if values.iter().any(|v| v.kind() != kind) {
            return Err(invalid());
        }

        Ok(values)
    }

    /// Evaluates the predicate against a document's metadata.
    ///
    /// Missing fields never satisfy `Eq`, `Range` or `In`; they always satisfy `Ne` and `Nin`.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        match self {
            MetadataFilter::Eq { field, value } => metadata
                .get(field)
                .is_some_and(|stored| value.matches_json(stored)),
            MetadataFilter::Ne { field, value } => !metadata
                .get(field)
                .is_some_and(|stored| value.matches_json(stored)),
            MetadataFilter::Range { field, op, bound } => metadata
                .get(field)
                .and_then(Value::as_f64)
                .is_some_and(|v| op.holds(v, *bound)),
            MetadataFilter::In { field, values } => metadata
                .get(field)
                .is_some_and(|stored| values.iter().any(|v| v.matches_json(stored))),
            MetadataFilter::Nin { field, values } => !metadata
                .get(field)
                .is_some_and(|stored| values.iter().any(|v| v.matches_json(stored))),
            MetadataFilter::And(children) => children.iter().all(|c| c.matches(metadata)),
            MetadataFilter::Or(children) => children.iter().any(|c| c.matches(metadata)),
            MetadataFilter::Not(inner) => !inner.matches(metadata),
        }
    }
}
