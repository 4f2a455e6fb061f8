use serde::Serialize;
use serde_json::Value;

use crate::allocator::{IdAllocator, Partition};
use crate::error::{ResolutionErrorKind, TemplateResolutionError};
use crate::row::RowData;
use crate::template::{child_path, index_path, Placeholder, Template, PLACEHOLDER};

/// One row's payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub payload: Value,
    pub errors: Vec<TemplateResolutionError>,
    /// ID drawn for this row, if the template asked for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u64>,
}

/// Payloads in row order plus every per-field error of the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadBatch {
    pub payloads: Vec<Value>,
    pub errors: Vec<TemplateResolutionError>,
}

/// Resolve a template against one row.
pub fn resolve(template: &Template, row: &RowData, allocator: &mut IdAllocator) -> Resolved {
    resolve_row(template, row, 0, allocator)
}

/// Resolve a template against every row, in order. Per-field failures are
/// collected; no row is dropped.
pub fn resolve_batch(template: &Template, rows: &[RowData], allocator: &mut IdAllocator) -> PayloadBatch {
    let mut batch = PayloadBatch::default();
    for (index, row) in rows.iter().enumerate() {
        let resolved = resolve_row(template, row, index, allocator);
        batch.payloads.push(resolved.payload);
        batch.errors.extend(resolved.errors);
    }
    log::info!("resolved {} payload(s), {} error(s)", batch.payloads.len(), batch.errors.len());
    batch
}

/// Pick rows by identifier (first column), in selection order. Repeated
/// identifiers are taken once. Returns the rows and the identifiers that
/// matched nothing.
pub fn select_rows(rows: &[RowData], identifiers: &[String]) -> (Vec<RowData>, Vec<String>) {
    let mut selected = Vec::new();
    let mut missing = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for id in identifiers {
        if seen.contains(&id.as_str()) {
            continue;
        }
        seen.push(id);
        match rows.iter().find(|r| r.identifier() == Some(id.as_str())) {
            Some(row) => selected.push(row.clone()),
            None => missing.push(id.clone()),
        }
    }
    if !missing.is_empty() {
        log::warn!("no row for identifier(s): {}", missing.join(", "));
    }
    (selected, missing)
}

fn resolve_row(template: &Template, row: &RowData, index: usize, allocator: &mut IdAllocator) -> Resolved {
    let partition = template.entity_class().or(row.entity_class()).map(Partition::for_class);
    let mut ctx = RowCtx { row, index, partition, allocator, drawn: None, errors: Vec::new() };
    let payload = ctx.resolve_value(template.body(), "$");
    Resolved { payload, errors: ctx.errors, next_id: ctx.drawn }
}

struct RowCtx<'a> {
    row: &'a RowData,
    index: usize,
    partition: Option<Partition>,
    allocator: &'a mut IdAllocator,
    /// Memoised for the whole row.
    drawn: Option<u64>,
    errors: Vec<TemplateResolutionError>,
}

impl RowCtx<'_> {
    fn resolve_value(&mut self, value: &Value, path: &str) -> Value {
        match value {
            Value::String(text) => self.resolve_string(text, path),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.resolve_value(item, &index_path(path, i)))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.resolve_value(item, &child_path(path, key))))
                    .collect(),
            ),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }

    fn resolve_string(&mut self, text: &str, path: &str) -> Value {
        if let Some(caps) = PLACEHOLDER.captures(text) {
            let whole = caps[0].len() == text.len();
            if whole && Placeholder::parse(&caps[1], &caps[2]) == Ok(Placeholder::NextId) {
                return match self.next_id(path) {
                    Some(id) => Value::from(id),
                    None => Value::String(String::new()),
                };
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            match Placeholder::parse(&caps[1], &caps[2]) {
                Ok(Placeholder::Row(column)) => match self.row.get(&column) {
                    Some(value) => out.push_str(value),
                    None => self.record(
                        ResolutionErrorKind::MissingColumn,
                        path,
                        format!("missing column {column}"),
                    ),
                },
                Ok(Placeholder::NextId) => {
                    if let Some(id) = self.next_id(path) {
                        out.push_str(&id.to_string());
                    }
                }
                // Rejected at load; kept verbatim.
                Err(_) => out.push_str(whole.as_str()),
            }
        }
        out.push_str(&text[last..]);
        Value::String(out)
    }

    fn next_id(&mut self, path: &str) -> Option<u64> {
        if let Some(id) = self.drawn {
            return Some(id);
        }
        match self.partition {
            Some(partition) => {
                let id = self.allocator.next(partition);
                self.drawn = Some(id);
                Some(id)
            }
            None => {
                self.record(
                    ResolutionErrorKind::NoPartition,
                    path,
                    "{func.next_id} needs an entity class".to_string(),
                );
                None
            }
        }
    }

    fn record(&mut self, kind: ResolutionErrorKind, path: &str, message: String) {
        log::warn!("row {}: {message}", self.index);
        self.errors.push(TemplateResolutionError {
            kind,
            row: self.index,
            row_identifier: self.row.identifier().map(str::to_string),
            path: path.to_string(),
            message,
        });
    }
}
