use std::sync::Arc;
use std::time::Instant;

use crate::errors::{ExportResult, TaskResult};
use crate::store::{
    AttributeMap, AttributeValue, EntitySchema, Filter, Record, Session, SortKey,
};
use crate::tasks::task::{Commit, Task, TaskContext};

use super::formatter::Formatter;
use super::sink::ExportSink;

/// Exports one entity kind: fetches records of that kind from the task's
/// confined session using the given filter and ordering criteria, streams
/// them through the formatter, and writes the accumulated bytes to the sink
/// under the formatter's file name.
///
/// Emission order is exactly the fetch order. An error or a cancellation at
/// any point aborts the whole export; nothing reaches the sink.
pub struct ExportTask {
    entity: String,
    filter: Option<Filter>,
    order: Vec<SortKey>,
    formatter: Box<dyn Formatter>,
    sink: Arc<dyn ExportSink>,
}

impl ExportTask {
    pub fn new(entity: &str, formatter: Box<dyn Formatter>, sink: Arc<dyn ExportSink>) -> Self {
        Self {
            entity: entity.to_string(),
            filter: None,
            order: Vec::new(),
            formatter,
            sink,
        }
    }

    /// Restrict the export to records matching the predicate.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Order exported records by the given keys. Absent keys mean
    /// store-default order.
    pub fn with_order(mut self, order: Vec<SortKey>) -> Self {
        self.order = order;
        self
    }

    /// Build the attribute map `encode` receives: schema attributes routed
    /// through the per-type transform hooks, plus relationship references
    /// when the formatter opts in.
    fn attribute_map(&self, record: &Record, schema: &EntitySchema) -> ExportResult<AttributeMap> {
        let mut values = AttributeMap::new();
        for descriptor in &schema.attributes {
            let Some(value) = record.attribute(&descriptor.name) else {
                continue;
            };
            let transformed = match value {
                AttributeValue::String(s) => {
                    self.formatter.transform_string(s, &descriptor.name)?
                }
                AttributeValue::Number(n) => {
                    self.formatter.transform_number(*n, &descriptor.name)?
                }
                AttributeValue::Date(d) => self.formatter.transform_date(*d, &descriptor.name)?,
                other => other.clone(),
            };
            values.insert(descriptor.name.clone(), transformed);
        }
        if self.formatter.encode_relationships(schema) {
            for relationship in &schema.relationships {
                if let Some(targets) = record.relationships.get(&relationship.name) {
                    values.insert(
                        relationship.name.clone(),
                        AttributeValue::References(targets.clone()),
                    );
                }
            }
        }
        Ok(values)
    }
}

impl Task for ExportTask {
    fn body(&mut self, session: &mut Session, ctx: &TaskContext) -> TaskResult<Commit> {
        let started = Instant::now();
        let schema = session.schema(&self.entity)?;

        ctx.checkpoint()?;
        let records = session.fetch(&self.entity, self.filter.as_ref(), &self.order)?;

        let mut output = self.formatter.header(&schema);
        let last = records.len().saturating_sub(1);
        for (index, record) in records.iter().enumerate() {
            ctx.checkpoint()?;
            output.extend(self.formatter.prefix(&schema));
            let values = self.attribute_map(record, &schema)?;
            output.extend(self.formatter.encode(&values, &schema)?);
            output.extend(self.formatter.suffix(&schema));
            if index != last {
                output.extend(self.formatter.delimiter(&schema));
            }
        }
        output.extend(self.formatter.footer(&schema));

        let name = self.formatter.file_name(&schema);
        self.sink.write(&name, &output)?;
        log::info!(
            "exported {} '{}' record(s), {} bytes to '{}' in {} ms",
            records.len(),
            self.entity,
            output.len(),
            name,
            started.elapsed().as_millis()
        );

        // Exports never mutate the store.
        Ok(Commit::Discard)
    }
}
