use std::collections::HashMap;

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ListValue, PointId, Struct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Payload key holding the client-facing document id.
pub const PAYLOAD_DOC_ID: &str = "doc_id";
/// Payload key holding the document text.
pub const PAYLOAD_TEXT: &str = "text";
/// Payload key holding the nested metadata object.
pub const PAYLOAD_METADATA: &str = "metadata";

/// A document ready to be written (text already embedded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub vector: Vec<f32>,
}

/// A document as returned by reads, without its vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// One nearest-neighbor hit. `distance = 1 - cosine_similarity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

/// Where a [`scan`](super::VectorStore::scan) resumes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanCursor {
    /// Qdrant's `next_page_offset`.
    Point(PointId),
    /// Resume after this document id (in-process engine order).
    After(String),
}

/// One page of a full-collection scan. `next` is `None` on the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    pub documents: Vec<DocumentRecord>,
    pub next: Option<ScanCursor>,
}

impl DocumentRecord {
    /// Rebuilds a record from a Qdrant payload. Returns `None` if `doc_id` is missing.
    pub fn from_payload(mut payload: HashMap<String, QdrantValue>) -> Option<Self> {
        let id = take_string(&mut payload, PAYLOAD_DOC_ID)?;
        let text = take_string(&mut payload, PAYLOAD_TEXT).unwrap_or_default();
        let metadata = match payload.remove(PAYLOAD_METADATA).map(qdrant_to_json) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Some(Self { id, text, metadata })
    }
}

impl StoredDocument {
    /// Payload written next to the vector.
    pub fn payload(&self) -> HashMap<String, QdrantValue> {
        let mut payload = HashMap::new();
        payload.insert(PAYLOAD_DOC_ID.to_string(), self.id.clone().into());
        payload.insert(PAYLOAD_TEXT.to_string(), self.text.clone().into());
        payload.insert(
            PAYLOAD_METADATA.to_string(),
            object_to_qdrant(&self.metadata),
        );
        payload
    }
}

fn take_string(payload: &mut HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    match payload.remove(key)?.kind? {
        Kind::StringValue(s) => Some(s),
        _ => None,
    }
}

/// Converts a JSON value into a Qdrant payload value.
pub fn json_to_qdrant(value: &Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(map) => return object_to_qdrant(map),
    };

    QdrantValue { kind: Some(kind) }
}

/// Converts a JSON object into a Qdrant struct value.
pub fn object_to_qdrant(map: &Map<String, Value>) -> QdrantValue {
    QdrantValue {
        kind: Some(Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect(),
        })),
    }
}

/// Converts a Qdrant payload value back into JSON.
pub fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect(),
        ),
    }
}

/// Cosine similarity; `0.0` for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
