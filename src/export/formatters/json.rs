use base64::Engine;
use serde_json::{json, Map, Value};

use crate::errors::{ExportError, ExportResult};
use crate::store::{AttributeMap, AttributeValue, EntitySchema};

use super::super::formatter::Formatter;

/// Emits one JSON array document per export: `[` header, `]` footer, records
/// as objects separated by `,`. Dates render as RFC 3339 strings, binary as
/// base64, relationship references as arrays of record ids.
#[derive(Default)]
pub struct JsonFormatter {
    encode_relationships: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relationships(mut self) -> Self {
        self.encode_relationships = true;
        self
    }
}

fn to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::String(s) => json!(s),
        AttributeValue::Number(n) => json!(n),
        AttributeValue::Date(d) => json!(d.to_rfc3339()),
        AttributeValue::Binary(b) => {
            json!(base64::engine::general_purpose::STANDARD.encode(b))
        }
        AttributeValue::References(ids) => {
            json!(ids.iter().map(|id| id.to_string()).collect::<Vec<_>>())
        }
    }
}

impl Formatter for JsonFormatter {
    fn encode(&self, values: &AttributeMap, schema: &EntitySchema) -> ExportResult<Vec<u8>> {
        let mut object = Map::new();
        for attr in &schema.attributes {
            if let Some(value) = values.get(&attr.name) {
                object.insert(attr.name.clone(), to_json(value));
            }
        }
        for relationship in &schema.relationships {
            if let Some(value) = values.get(&relationship.name) {
                object.insert(relationship.name.clone(), to_json(value));
            }
        }
        serde_json::to_vec(&Value::Object(object))
            .map_err(|e| ExportError::EncodeFailed(e.to_string()))
    }

    fn delimiter(&self, _schema: &EntitySchema) -> Vec<u8> {
        b",".to_vec()
    }

    fn file_name(&self, schema: &EntitySchema) -> String {
        format!("{}.json", schema.name)
    }

    fn header(&self, _schema: &EntitySchema) -> Vec<u8> {
        b"[".to_vec()
    }

    fn footer(&self, _schema: &EntitySchema) -> Vec<u8> {
        b"]".to_vec()
    }

    fn encode_relationships(&self, _schema: &EntitySchema) -> bool {
        self.encode_relationships
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::{AttributeDescriptor, AttributeKind};
    use std::collections::HashMap;

    #[test]
    fn records_encode_as_objects_inside_an_array_document() {
        let schema = EntitySchema::new(
            "Customer",
            vec![
                AttributeDescriptor::new("name", AttributeKind::String),
                AttributeDescriptor::new("balance", AttributeKind::Number),
            ],
        );
        let formatter = JsonFormatter::new();
        assert_eq!(formatter.header(&schema), b"[");
        assert_eq!(formatter.footer(&schema), b"]");
        assert_eq!(formatter.file_name(&schema), "Customer.json");

        let values = HashMap::from([
            ("name".to_string(), AttributeValue::String("ada".into())),
            ("balance".to_string(), AttributeValue::Number(2.5)),
        ]);
        let bytes = formatter.encode(&values, &schema).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["name"], "ada");
        assert_eq!(parsed["balance"], 2.5);
    }
}
