//! # Row Scanner
//!
//! Drives a tolerant, forward-only pass over a tabular source. Every data
//! row produces exactly one [`ScanEvent`]; a row that fails casting does not
//! stop the pass. A [`ScanEvent::FatalFailure`] is always the last event.

use orv_core::SchemaDescriptor;
use orv_table::{
    CastMode, CastRow, Relations, Table, TableError, TableIter, TableOptions, TableSchemaError,
    TableSource,
};

/// Options for one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 1-based physical header row; `None` when the source has no headers.
    pub headers_row: Option<u64>,
    /// Referenced resources for foreign-key checks; `None` disables them.
    pub relations: Option<Relations>,
}

/// Outcome of one step of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A row that cast cleanly.
    Row(CastRow),
    /// A row that failed casting; the scan continues. Carries row, optional
    /// column, message, and per-cell sub-failures.
    RowFailure(TableSchemaError),
    /// The source cannot be read any further; the scan ends.
    FatalFailure(String),
}

/// Iterator of [`ScanEvent`]s over one source.
pub struct RowScanner {
    rows: Option<TableIter>,
    pending: Option<String>,
    done: bool,
}

impl std::fmt::Debug for RowScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowScanner")
            .field("opened", &self.rows.is_some())
            .field("done", &self.done)
            .finish()
    }
}

impl RowScanner {
    /// Open `source` against `schema`. A source that cannot be opened
    /// yields a single [`ScanEvent::FatalFailure`].
    pub async fn open(
        source: &TableSource,
        schema: &SchemaDescriptor,
        options: ScanOptions,
        http: &reqwest::Client,
    ) -> Self {
        let table_options = TableOptions {
            headers_row: options.headers_row,
            relations: options.relations,
        };
        match Table::load(source, schema, table_options, http).await {
            Ok(table) => Self {
                rows: Some(table.iter(CastMode::Tolerant)),
                pending: None,
                done: false,
            },
            Err(err) => {
                tracing::debug!(source = %source.describe(), error = %err, "cannot open source");
                Self {
                    rows: None,
                    pending: Some(err.to_string()),
                    done: false,
                }
            }
        }
    }
}

impl Iterator for RowScanner {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        if self.done {
            return None;
        }
        if let Some(message) = self.pending.take() {
            self.done = true;
            return Some(ScanEvent::FatalFailure(message));
        }
        let Some(rows) = self.rows.as_mut() else {
            self.done = true;
            return None;
        };
        match rows.next() {
            None => {
                self.done = true;
                None
            }
            Some(Ok(row)) => Some(ScanEvent::Row(row)),
            Some(Err(TableError::Cast(err))) => Some(ScanEvent::RowFailure(err)),
            Some(Err(err)) => {
                self.done = true;
                Some(ScanEvent::FatalFailure(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orv_core::{FieldDefinition, FieldType};
    use std::time::Duration;

    fn client() -> reqwest::Client {
        orv_table::http_client(Duration::from_secs(5)).unwrap()
    }

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![
            FieldDefinition::new("id", FieldType::Integer),
            FieldDefinition::new("name", FieldType::String),
        ])
    }

    fn inline(rows: &[&[&str]]) -> TableSource {
        TableSource::Inline(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    async fn scan(source: TableSource, headers_row: Option<u64>) -> Vec<ScanEvent> {
        let options = ScanOptions {
            headers_row,
            relations: None,
        };
        RowScanner::open(&source, &schema(), options, &client())
            .await
            .collect()
    }

    #[tokio::test]
    async fn every_row_is_visited_once() {
        let events = scan(
            inline(&[&["id", "name"], &["1", "a"], &["x", "b"], &["3", "c"]]),
            Some(1),
        )
        .await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ScanEvent::Row(r) if r.row_number == 2));
        assert!(matches!(&events[1], ScanEvent::RowFailure(e) if e.row_number == Some(3)));
        assert!(matches!(&events[2], ScanEvent::Row(r) if r.row_number == 4));
    }

    #[tokio::test]
    async fn unreadable_source_is_a_single_fatal_event() {
        let events = scan(TableSource::Path("/no/such/file.csv".into()), Some(1)).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ScanEvent::FatalFailure(m) if m.contains("/no/such/file.csv")));
    }

    #[tokio::test]
    async fn fatal_failure_ends_the_scan() {
        let mut bytes = b"1,a\n".to_vec();
        bytes.extend_from_slice(&[0xff, b',', b'b', b'\n']);
        bytes.extend_from_slice(b"3,c\n");
        let events = scan(TableSource::Bytes(bytes.into()), None).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ScanEvent::Row(_)));
        assert!(matches!(events[1], ScanEvent::FatalFailure(_)));
    }

    #[tokio::test]
    async fn empty_source_yields_nothing() {
        assert!(scan(inline(&[]), None).await.is_empty());
    }
}
