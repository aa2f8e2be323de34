use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single attribute value. `References` only appears in a record's attribute
/// map when a formatter opts into relationship encoding; it never lives in the
/// store itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
    References(Vec<Uuid>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            // {:?} keeps the fractional digit on round numbers (10.0, not 10)
            AttributeValue::Number(n) => write!(f, "{:?}", n),
            AttributeValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            AttributeValue::Binary(b) => {
                write!(f, "{}", base64::engine::general_purpose::STANDARD.encode(b))
            }
            AttributeValue::References(ids) => {
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

/// Total ordering used by attribute-based sort keys. Values of different
/// variants order by variant, which only matters for malformed stores.
pub fn compare_values(a: &AttributeValue, b: &AttributeValue) -> Ordering {
    use AttributeValue::*;
    match (a, b) {
        (String(x), String(y)) => x.cmp(y),
        (Number(x), Number(y)) => x.total_cmp(y),
        (Date(x), Date(y)) => x.cmp(y),
        (Binary(x), Binary(y)) => x.cmp(y),
        (References(x), References(y)) => x.cmp(y),
        _ => variant_rank(a).cmp(&variant_rank(b)),
    }
}

fn variant_rank(v: &AttributeValue) -> u8 {
    match v {
        AttributeValue::String(_) => 0,
        AttributeValue::Number(_) => 1,
        AttributeValue::Date(_) => 2,
        AttributeValue::Binary(_) => 3,
        AttributeValue::References(_) => 4,
    }
}

/// Attribute name to value map, as handed to formatters.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// One instance of an entity kind, cloned out of the session that fetched it.
/// Relationship references are record ids of the target kind. A record must
/// not be interpreted against a session that has been discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub kind: String,
    pub attributes: AttributeMap,
    pub relationships: HashMap<String, Vec<Uuid>>,
}

impl Record {
    pub fn new(kind: &str, attributes: AttributeMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            attributes,
            relationships: HashMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display_keeps_fractional_digit() {
        assert_eq!(AttributeValue::Number(10.0).to_string(), "10.0");
        assert_eq!(AttributeValue::Number(5.25).to_string(), "5.25");
    }

    #[test]
    fn values_order_within_variant() {
        let a = AttributeValue::Number(1.0);
        let b = AttributeValue::Number(2.0);
        assert_eq!(compare_values(&a, &b), Ordering::Less);

        let x = AttributeValue::String("alpha".into());
        let y = AttributeValue::String("beta".into());
        assert_eq!(compare_values(&y, &x), Ordering::Greater);
    }
}
