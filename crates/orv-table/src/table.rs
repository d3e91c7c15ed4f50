//! # Tables
//!
//! A [`Table`] pairs an opened source with a schema. Iteration numbers rows
//! by their physical position in the source, starting at 1, so with a header
//! row at `h` the first data row is `h + 1`.

use std::collections::{HashMap, HashSet};

use orv_core::SchemaDescriptor;

use crate::cast::{Caster, Cell};
use crate::error::{TableError, TableSchemaError};
use crate::relations::Relations;
use crate::source::{RawRows, TableSource};

/// How row-level failures affect iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CastMode {
    /// Yield the failure and continue with the next row.
    #[default]
    Tolerant,
    /// Yield the failure and stop.
    Strict,
}

/// Options for [`Table::load`].
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// 1-based physical row holding column headers. `None` or `Some(0)`
    /// means the source has no header row and columns are positional.
    pub headers_row: Option<u64>,
    /// Referenced resources for the foreign-key check. `None` disables it.
    pub relations: Option<Relations>,
}

/// A data row that cast cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct CastRow {
    pub row_number: u64,
    pub values: Vec<Cell>,
}

impl CastRow {
    /// Canonical text of each value keyed by field name.
    pub fn keyed(&self, field_names: &[&str]) -> HashMap<String, String> {
        field_names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

#[derive(Debug)]
struct ForeignCheck {
    fields: Vec<String>,
    columns: Vec<usize>,
    keys: HashSet<Vec<String>>,
}

/// A source paired with a schema, ready to iterate.
pub struct Table {
    rows: RawRows,
    schema: SchemaDescriptor,
    caster: Caster,
    headers_row: Option<u64>,
    foreign: Vec<ForeignCheck>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("fields", &self.schema.field_names())
            .field("headers_row", &self.headers_row)
            .field("foreign_checks", &self.foreign.len())
            .finish()
    }
}

impl Table {
    /// Open `source` and prepare casting against `schema`.
    pub async fn load(
        source: &TableSource,
        schema: &SchemaDescriptor,
        options: TableOptions,
        http: &reqwest::Client,
    ) -> Result<Self, TableError> {
        let caster = Caster::new(schema)?;
        let rows = source.open(http).await?;
        let foreign = options
            .relations
            .as_ref()
            .map(|relations| foreign_checks(schema, relations))
            .unwrap_or_default();

        tracing::debug!(
            source = %source.describe(),
            fields = schema.fields.len(),
            headers_row = ?options.headers_row,
            foreign_checks = foreign.len(),
            "table loaded"
        );

        Ok(Self {
            rows,
            schema: schema.clone(),
            caster,
            headers_row: options.headers_row.filter(|h| *h > 0),
            foreign,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Iterate the data rows.
    pub fn iter(self, mode: CastMode) -> TableIter {
        let primary_key: Vec<usize> = self
            .schema
            .primary_key
            .as_ref()
            .map(|pk| {
                pk.names()
                    .iter()
                    .filter_map(|name| self.schema.field_index(name))
                    .collect()
            })
            .unwrap_or_default();

        // A single-column primary key is already checked as a key.
        let unique: Vec<usize> = self
            .schema
            .fields
            .iter()
            .enumerate()
            .filter(|(i, f)| f.is_unique() && primary_key != [*i])
            .map(|(i, _)| i)
            .collect();

        TableIter {
            seen_unique: vec![HashSet::new(); unique.len()],
            unique,
            primary_key,
            seen_keys: HashSet::new(),
            field_names: self.schema.fields.iter().map(|f| f.name.clone()).collect(),
            table: self,
            mode,
            row_number: 0,
            finished: false,
        }
    }

    /// Read every row, stopping at the first failure.
    pub fn read(self) -> Result<Vec<CastRow>, TableError> {
        self.iter(CastMode::Strict).collect()
    }
}

fn foreign_checks(schema: &SchemaDescriptor, relations: &Relations) -> Vec<ForeignCheck> {
    schema
        .foreign_keys
        .iter()
        .filter_map(|fk| {
            let reference_fields = fk.reference.fields.names();
            let keys = relations.key_set(&fk.reference.resource, &reference_fields)?;
            let columns = fk
                .fields
                .names()
                .iter()
                .map(|name| schema.field_index(name))
                .collect::<Option<Vec<_>>>()?;
            Some(ForeignCheck {
                fields: fk.fields.names().iter().map(|s| s.to_string()).collect(),
                columns,
                keys,
            })
        })
        .collect()
}

/// Iterator over the cast rows of a [`Table`].
pub struct TableIter {
    table: Table,
    mode: CastMode,
    row_number: u64,
    finished: bool,
    field_names: Vec<String>,
    unique: Vec<usize>,
    seen_unique: Vec<HashSet<String>>,
    primary_key: Vec<usize>,
    seen_keys: HashSet<Vec<String>>,
}

impl TableIter {
    fn headers_match(&self, raw: &[String]) -> bool {
        raw.len() == self.field_names.len()
            && raw.iter().zip(&self.field_names).enumerate().all(|(i, (header, name))| {
                let header = if i == 0 {
                    header.trim_start_matches('\u{feff}')
                } else {
                    header.as_str()
                };
                header == name
            })
    }

    fn fail(&mut self, err: TableSchemaError) -> TableError {
        if self.mode == CastMode::Strict {
            self.finished = true;
        }
        TableError::Cast(err)
    }

    /// Checks that span rows: unique fields, primary key, foreign keys.
    fn check_keys(&mut self, row: u64, values: &[Cell]) -> Option<TableSchemaError> {
        let mut errors = Vec::new();

        for (slot, &column) in self.unique.iter().enumerate() {
            let cell = &values[column];
            if cell.is_null() {
                continue;
            }
            if !self.seen_unique[slot].insert(cell.to_string()) {
                errors.push(TableSchemaError::at(
                    row,
                    Some(column as u64 + 1),
                    format!(
                        "Row {row} has an unique constraint violation in column \"{}\"",
                        self.field_names[column]
                    ),
                ));
            }
        }

        if !self.primary_key.is_empty() {
            let key: Vec<String> = self.primary_key.iter().map(|&i| values[i].to_string()).collect();
            if self.seen_keys.contains(&key) {
                let column = (self.primary_key.len() == 1).then(|| self.primary_key[0] as u64 + 1);
                errors.push(TableSchemaError::at(
                    row,
                    column,
                    format!("Row {row} has non-unique primary key value \"{}\"", key.join(", ")),
                ));
            } else {
                self.seen_keys.insert(key);
            }
        }

        for check in &self.table.foreign {
            let local: Vec<&Cell> = check.columns.iter().map(|&i| &values[i]).collect();
            if local.iter().all(|c| c.is_null()) {
                continue;
            }
            let key: Vec<String> = local.iter().map(|c| c.to_string()).collect();
            if !check.keys.contains(&key) {
                errors.push(TableSchemaError::at(
                    row,
                    None,
                    format!(
                        "Foreign key \"{}\" violation in row {row}",
                        check.fields.join(", ")
                    ),
                ));
            }
        }

        TableSchemaError::collect(row, errors)
    }
}

impl Iterator for TableIter {
    type Item = Result<CastRow, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            let raw = match self.table.rows.next()? {
                Ok(raw) => raw,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            };
            self.row_number += 1;
            let row = self.row_number;

            if let Some(headers_row) = self.table.headers_row {
                if row < headers_row {
                    continue;
                }
                if row == headers_row {
                    if self.headers_match(&raw) {
                        continue;
                    }
                    return Some(Err(self.fail(TableSchemaError::header_mismatch(row))));
                }
            }

            let values = match self.table.caster.cast_row(row, &raw) {
                Ok(values) => values,
                Err(err) => return Some(Err(self.fail(err))),
            };
            if let Some(err) = self.check_keys(row, &values) {
                return Some(Err(self.fail(err)));
            }
            return Some(Ok(CastRow {
                row_number: row,
                values,
            }));
        }
    }
}
