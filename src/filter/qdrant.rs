use qdrant_client::qdrant::{Condition, Filter, Range};

use super::{MetadataFilter, RangeOp, Scalar};

impl MetadataFilter {
    /// Translates into a Qdrant filter. Field names are resolved under `prefix`
    /// (e.g. `"metadata."` when metadata is stored as a nested payload object).
    pub fn to_qdrant(&self, prefix: &str) -> Filter {
        match self {
            MetadataFilter::And(children) => {
                Filter::must(children.iter().map(|c| c.to_condition(prefix)))
            }
            other => Filter::must([other.to_condition(prefix)]),
        }
    }

    fn to_condition(&self, prefix: &str) -> Condition {
        let key = |field: &str| format!("{prefix}{field}");

        match self {
            MetadataFilter::Eq { field, value } => equals(key(field), value),
            MetadataFilter::Ne { field, value } => {
                Filter::must_not([equals(key(field), value)]).into()
            }
            MetadataFilter::Range { field, op, bound } => {
                Condition::range(key(field), range(*op, *bound))
            }
            MetadataFilter::In { field, values } => one_of(key(field), values),
            MetadataFilter::Nin { field, values } => {
                Filter::must_not([one_of(key(field), values)]).into()
            }
            MetadataFilter::And(children) => {
                Filter::must(children.iter().map(|c| c.to_condition(prefix))).into()
            }
            MetadataFilter::Or(children) => {
                Filter::should(children.iter().map(|c| c.to_condition(prefix))).into()
            }
            MetadataFilter::Not(inner) => Filter::must_not([inner.to_condition(prefix)]).into(),
        }
    }
}

fn range(op: RangeOp, bound: f64) -> Range {
    let mut range = Range::default();
    match op {
        RangeOp::Gt => range.gt = Some(bound),
        RangeOp::Gte => range.gte = Some(bound),
        RangeOp::Lt => range.lt = Some(bound),
        RangeOp::Lte => range.lte = Some(bound),
    }
    range
}

fn equals(key: String, value: &Scalar) -> Condition {
    match value {
        Scalar::String(s) => Condition::matches(key, s.clone()),
        Scalar::Integer(i) => Condition::matches(key, *i),
        Scalar::Bool(b) => Condition::matches(key, *b),
        // Qdrant has no float match; a closed range on one point is equivalent.
        Scalar::Float(f) => Condition::range(
            key,
            Range {
                gte: Some(*f),
                lte: Some(*f),
                ..Default::default()
            },
        ),
    }
}

fn one_of(key: String, values: &[Scalar]) -> Condition {
    let strings: Option<Vec<String>> = values
        .iter()
        .map(|v| match v {
            Scalar::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    if let Some(keywords) = strings {
        return Condition::matches(key, keywords);
    }

    let integers: Option<Vec<i64>> = values
        .iter()
        .map(|v| match v {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        })
        .collect();
    if let Some(integers) = integers {
        return Condition::matches(key, integers);
    }

    Filter::should(values.iter().map(|v| equals(key.clone(), v))).into()
}
