use crate::errors::ExportResult;
use crate::store::{AttributeMap, EntitySchema};

use super::super::formatter::Formatter;

/// CSV dialect knobs.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// One record per line, fields in schema attribute order, header row of
/// attribute names. Fields containing the delimiter, the quote character, or
/// a line break are quoted, with embedded quotes doubled. Binary attributes
/// render as base64.
pub struct CsvFormatter {
    config: CsvConfig,
}

impl CsvFormatter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    fn quote_field(&self, field: &str) -> String {
        let delimiter = self.config.delimiter as char;
        let quote = self.config.quote as char;
        if field.contains(delimiter)
            || field.contains(quote)
            || field.contains('\r')
            || field.contains('\n')
        {
            let escaped = field.replace(quote, &format!("{}{}", quote, quote));
            format!("{}{}{}", quote, escaped, quote)
        } else {
            field.to_string()
        }
    }

    fn join_row(&self, fields: Vec<String>) -> Vec<u8> {
        let separator = (self.config.delimiter as char).to_string();
        fields.join(separator.as_str()).into_bytes()
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new(CsvConfig::default())
    }
}

impl Formatter for CsvFormatter {
    fn encode(&self, values: &AttributeMap, schema: &EntitySchema) -> ExportResult<Vec<u8>> {
        let fields: Vec<String> = schema
            .attributes
            .iter()
            .map(|attr| {
                values
                    .get(&attr.name)
                    .map(|v| self.quote_field(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        Ok(self.join_row(fields))
    }

    fn delimiter(&self, _schema: &EntitySchema) -> Vec<u8> {
        b"\n".to_vec()
    }

    fn file_name(&self, schema: &EntitySchema) -> String {
        format!("{}.csv", schema.name)
    }

    /// Header row of attribute names, terminated so the first record starts
    /// on its own line.
    fn header(&self, schema: &EntitySchema) -> Vec<u8> {
        let names: Vec<String> = schema
            .attributes
            .iter()
            .map(|attr| self.quote_field(&attr.name))
            .collect();
        let mut row = self.join_row(names);
        row.push(b'\n');
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::{AttributeDescriptor, AttributeKind};
    use crate::store::AttributeValue;
    use std::collections::HashMap;

    fn schema() -> EntitySchema {
        EntitySchema::new(
            "Customer",
            vec![
                AttributeDescriptor::new("name", AttributeKind::String),
                AttributeDescriptor::new("balance", AttributeKind::Number),
            ],
        )
    }

    #[test]
    fn fields_follow_schema_order_with_header_row() {
        let formatter = CsvFormatter::default();
        let schema = schema();
        assert_eq!(formatter.header(&schema), b"name,balance\n");
        assert_eq!(formatter.file_name(&schema), "Customer.csv");

        let values = HashMap::from([
            ("balance".to_string(), AttributeValue::Number(2.5)),
            ("name".to_string(), AttributeValue::String("ada".into())),
        ]);
        assert_eq!(formatter.encode(&values, &schema).unwrap(), b"ada,2.5");
    }

    #[test]
    fn fields_needing_quotes_are_quoted_and_escaped() {
        let formatter = CsvFormatter::default();
        let schema = schema();
        let values = HashMap::from([(
            "name".to_string(),
            AttributeValue::String("a,b \"c\"\nd".into()),
        )]);
        assert_eq!(
            formatter.encode(&values, &schema).unwrap(),
            b"\"a,b \"\"c\"\"\nd\","
        );
    }

    #[test]
    fn missing_attributes_render_empty() {
        let formatter = CsvFormatter::default();
        let schema = schema();
        let values = HashMap::from([("balance".to_string(), AttributeValue::Number(1.0))]);
        assert_eq!(formatter.encode(&values, &schema).unwrap(), b",1.0");
    }
}
