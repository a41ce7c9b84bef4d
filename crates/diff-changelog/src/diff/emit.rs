//! Changeset emission: extracted rows to changelog files.
//!
//! Each call converts one batch of rows into a single changeset and writes
//! it out immediately: structured markup (one insert change per row) for
//! small exports, or a tabular load (one delimited data file plus a
//! bulk-load change) for chunked ones. Large-object column values are
//! externalized into a `lob` subdirectory and referenced by relative path.

use std::fs;
use std::path::Path;

use crate::changelog::{
    BulkLoadChange, Change, ChangeLogFile, ChangeSet, ColumnConfig, ColumnEntry, IncludedFile,
    LoadColumnEntry, LoadDataColumnConfig, RowChange,
};
use crate::config::DiffOutputControl;
use crate::core::{Column, Row, SqlValue, Table};
use crate::error::Result;

/// Extension for changelog files whose base name carries no period.
const DATA_FILE_EXTENSION: &str = ".data.yaml";

/// Extension used when the base name already contains a period.
const PLAIN_FILE_EXTENSION: &str = ".yaml";

/// Writes one changeset file (markup or tabular) per invocation.
pub struct DataEmitter<'a> {
    control: &'a DiffOutputControl,
}

impl<'a> DataEmitter<'a> {
    pub fn new(control: &'a DiffOutputControl) -> Self {
        Self { control }
    }

    /// Emit `rows` as one changeset file under the configured output
    /// directory, returning its descriptor.
    ///
    /// The changeset identifier is always `<table>.DATA` regardless of the
    /// file name, so re-running a diff replaces rather than duplicates the
    /// logical changeset.
    pub fn emit(
        &self,
        table: &Table,
        rows: &[Row],
        subdir: Option<&str>,
        filename_base: &str,
        tabular: bool,
    ) -> Result<IncludedFile> {
        let target_dir = match subdir {
            Some(sub) => self.control.data_dir.join(sub),
            None => self.control.data_dir.clone(),
        };
        fs::create_dir_all(&target_dir)?;

        let mut change_set =
            ChangeSet::new(format!("{}.DATA", table.name), self.control.author.as_str());

        if tabular {
            let data_file = format!("{}.csv", filename_base);
            let load = self.write_tabular(table, rows, &target_dir, &data_file)?;
            change_set.changes.push(if self.control.prefer_upsert {
                Change::LoadUpdateData(load)
            } else {
                Change::LoadData(load)
            });
        } else {
            for row in rows {
                let change = self.row_change(table, row, &target_dir)?;
                change_set.changes.push(if self.control.prefer_upsert {
                    Change::InsertUpdate(change)
                } else {
                    Change::Insert(change)
                });
            }
        }

        let extension = if filename_base.contains('.') {
            PLAIN_FILE_EXTENSION
        } else {
            DATA_FILE_EXTENSION
        };
        let file_name = format!("{}{}", filename_base, extension);
        ChangeLogFile::new(vec![change_set]).write_to(&target_dir.join(&file_name))?;
        tracing::debug!(table = %table.name, file = %file_name, rows = rows.len(), "wrote changeset");

        let relative = match subdir {
            Some(sub) => format!("{}/{}", sub, file_name),
            None => file_name,
        };
        Ok(IncludedFile {
            path: relative,
            table: table.name.clone(),
        })
    }

    fn row_change(&self, table: &Table, row: &Row, target_dir: &Path) -> Result<RowChange> {
        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let config = self.column_config(table, column, row, target_dir)?;
            columns.push(ColumnEntry { column: config });
        }
        Ok(RowChange {
            catalog_name: self.catalog_name(table),
            schema_name: self.schema_name(table),
            table_name: table.name.clone(),
            primary_key: self.primary_key_list(table),
            columns,
        })
    }

    /// Classify one value into its typed changelog representation.
    ///
    /// Order matters: typed scalars win over the column's declared LOB
    /// type, then raw bytes are hex-encoded, then everything else is
    /// stringified. A NULL (or absent) value leaves every value key unset.
    fn column_config(
        &self,
        table: &Table,
        column: &Column,
        row: &Row,
        target_dir: &Path,
    ) -> Result<ColumnConfig> {
        let mut config = ColumnConfig::new(&column.name);
        let value = match row.get(&column.name) {
            Some(value) if !value.is_null() => value,
            _ => return Ok(config),
        };

        if let Some(number) = numeric_value(value) {
            config.value_numeric = Some(number);
        } else if let SqlValue::Bool(flag) = value {
            config.value_boolean = Some(*flag);
        } else if value.is_temporal() {
            config.value_date = value.to_text();
        } else if column.is_blob() {
            config.value_blob_file =
                Some(self.write_lob_file(table, column, value, row, target_dir)?);
        } else if column.is_clob() {
            config.value_clob_file =
                Some(self.write_lob_file(table, column, value, row, target_dir)?);
        } else if let SqlValue::Bytes(bytes) = value {
            config.value = Some(hex::encode(bytes));
        } else {
            config.value = value.to_text();
        }
        Ok(config)
    }

    /// Externalize one large-object value, returning the relative path the
    /// changeset references.
    ///
    /// File names embed the row's primary-key values, so they collide only
    /// when keys collide.
    fn write_lob_file(
        &self,
        table: &Table,
        column: &Column,
        value: &SqlValue<'_>,
        row: &Row,
        target_dir: &Path,
    ) -> Result<String> {
        let mut name = format!("{}.{}", table.name, column.name);
        for key in &table.primary_key {
            let part = row.get(key).and_then(SqlValue::to_text).unwrap_or_default();
            name.push('.');
            name.push_str(&part);
        }
        name.push_str(".lob");

        let lob_dir = target_dir.join("lob");
        fs::create_dir_all(&lob_dir)?;
        let path = lob_dir.join(&name);
        match value {
            SqlValue::Bytes(bytes) => fs::write(&path, bytes.as_ref())?,
            other => fs::write(&path, other.to_text().unwrap_or_default())?,
        }
        Ok(format!("lob/{}", name))
    }

    /// Write rows as one delimited UTF-8 file and describe it as a bulk
    /// load.
    ///
    /// NULL cells are written as the empty string; a reader cannot tell
    /// them apart from genuinely empty text without the column's
    /// nullability.
    fn write_tabular(
        &self,
        table: &Table,
        rows: &[Row],
        target_dir: &Path,
        data_file: &str,
    ) -> Result<BulkLoadChange> {
        let mut data_types: Vec<Option<&'static str>> = vec![None; table.columns.len()];
        let mut out = String::new();

        let header: Vec<String> = table.columns.iter().map(|c| csv_field(&c.name)).collect();
        out.push_str(&header.join(","));
        out.push('\n');

        for row in rows {
            let mut line = Vec::with_capacity(table.columns.len());
            for (i, column) in table.columns.iter().enumerate() {
                let value = row.get(&column.name);
                if data_types[i].is_none() {
                    if let Some(value) = value.filter(|v| !v.is_null()) {
                        data_types[i] = Some(load_type(column, value));
                    }
                }
                let cell = match value {
                    None | Some(SqlValue::Null) => String::new(),
                    Some(value) if value.is_temporal() => value.to_text().unwrap_or_default(),
                    Some(value) if column.is_blob() || column.is_clob() => {
                        self.write_lob_file(table, column, value, row, target_dir)?
                    }
                    Some(value) => value.to_text().unwrap_or_default(),
                };
                line.push(csv_field(&cell));
            }
            out.push_str(&line.join(","));
            out.push('\n');
        }
        fs::write(target_dir.join(data_file), out)?;

        let columns = table
            .columns
            .iter()
            .zip(&data_types)
            .map(|(column, data_type)| LoadColumnEntry {
                column: LoadDataColumnConfig {
                    header: column.name.clone(),
                    name: column.name.clone(),
                    r#type: data_type.unwrap_or("STRING").to_string(),
                },
            })
            .collect();

        Ok(BulkLoadChange {
            catalog_name: self.catalog_name(table),
            schema_name: self.schema_name(table),
            table_name: table.name.clone(),
            file: data_file.to_string(),
            encoding: "UTF-8".to_string(),
            primary_key: self.primary_key_list(table),
            columns,
        })
    }

    fn catalog_name(&self, table: &Table) -> Option<String> {
        if self.control.include_catalog {
            table.catalog.clone()
        } else {
            None
        }
    }

    fn schema_name(&self, table: &Table) -> Option<String> {
        if self.control.include_schema {
            table.schema.clone()
        } else {
            None
        }
    }

    fn primary_key_list(&self, table: &Table) -> Option<String> {
        self.control
            .prefer_upsert
            .then(|| table.primary_key.join(","))
    }
}

/// Map numeric values onto YAML numbers, preserving integer forms exactly.
///
/// Whole-number decimals become integers; fractional decimals go through
/// f64 and keep at most its precision.
fn numeric_value(value: &SqlValue<'_>) -> Option<serde_yaml::Number> {
    use rust_decimal::prelude::ToPrimitive;

    match value {
        SqlValue::I16(v) => Some(serde_yaml::Number::from(i64::from(*v))),
        SqlValue::I32(v) => Some(serde_yaml::Number::from(i64::from(*v))),
        SqlValue::I64(v) => Some(serde_yaml::Number::from(*v)),
        SqlValue::F32(v) => Some(serde_yaml::Number::from(f64::from(*v))),
        SqlValue::F64(v) => Some(serde_yaml::Number::from(*v)),
        SqlValue::Decimal(v) if v.scale() == 0 => v
            .to_i64()
            .map(serde_yaml::Number::from)
            .or_else(|| v.to_f64().map(serde_yaml::Number::from)),
        SqlValue::Decimal(v) => v.to_f64().map(serde_yaml::Number::from),
        _ => None,
    }
}

/// Tabular column type, inferred from the first non-null value observed.
fn load_type(column: &Column, value: &SqlValue<'_>) -> &'static str {
    if value.is_numeric() {
        "NUMERIC"
    } else if matches!(value, SqlValue::Bool(_)) {
        "BOOLEAN"
    } else if value.is_temporal() {
        "DATE"
    } else if column.is_blob() {
        "BLOB"
    } else if column.is_clob() {
        "CLOB"
    } else {
        "STRING"
    }
}

/// Quote a field per the conventional delimited-text rules.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
