use chrono::{DateTime, Utc};

use crate::errors::ExportResult;
use crate::store::{AttributeMap, AttributeValue, EntitySchema};

/// Pluggable record-to-bytes encoding contract.
///
/// `encode`, `delimiter`, and `file_name` are what every format needs: turn
/// one record into bytes, separate records, and name the output. Everything
/// else — document structure, per-type value formatting, relationship
/// inclusion — is format-dependent and defaults to a no-op, so formatters
/// implement only what their format calls for. Callers invoke the trait
/// methods directly; there is no capability probing.
///
/// Output layout produced by an export:
/// `header ++ (prefix ++ encode ++ suffix ++ delimiter)* ++ footer`, with no
/// delimiter after the last record.
pub trait Formatter: Send + Sync {
    /// Encode one record's attribute map. Must be deterministic for
    /// identical input; attribute order comes from the schema.
    fn encode(&self, values: &AttributeMap, schema: &EntitySchema) -> ExportResult<Vec<u8>>;

    /// Bytes placed strictly between two consecutive records, never before
    /// the first or after the last.
    fn delimiter(&self, schema: &EntitySchema) -> Vec<u8>;

    /// Destination file name for the entity kind.
    fn file_name(&self, schema: &EntitySchema) -> String;

    /// Bytes prefixed to each encoded record.
    fn prefix(&self, _schema: &EntitySchema) -> Vec<u8> {
        Vec::new()
    }

    /// Bytes suffixed to each encoded record.
    fn suffix(&self, _schema: &EntitySchema) -> Vec<u8> {
        Vec::new()
    }

    /// Document header, emitted once before the first record.
    fn header(&self, _schema: &EntitySchema) -> Vec<u8> {
        Vec::new()
    }

    /// Document footer, emitted once after the last record.
    fn footer(&self, _schema: &EntitySchema) -> Vec<u8> {
        Vec::new()
    }

    /// Whether relationship data should be embedded in the attribute map
    /// handed to `encode`. Defaults to omitting relationships.
    fn encode_relationships(&self, _schema: &EntitySchema) -> bool {
        false
    }

    /// Transform a string attribute before encoding, keyed by attribute name.
    fn transform_string(&self, value: &str, _attribute: &str) -> ExportResult<AttributeValue> {
        Ok(AttributeValue::String(value.to_string()))
    }

    /// Transform a number attribute before encoding, keyed by attribute name.
    fn transform_number(&self, value: f64, _attribute: &str) -> ExportResult<AttributeValue> {
        Ok(AttributeValue::Number(value))
    }

    /// Transform a date attribute before encoding, keyed by attribute name.
    fn transform_date(
        &self,
        value: DateTime<Utc>,
        _attribute: &str,
    ) -> ExportResult<AttributeValue> {
        Ok(AttributeValue::Date(value))
    }
}
