use crate::aggregate::{Cell, ViewTable};
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub enum Writer {
    Stdout(Box<dyn Write>),
    JsonFile(BufWriter<File>),
    JsonlFile(BufWriter<File>),
    CsvFile(BufWriter<File>),
    TsvFile(BufWriter<File>),
}

impl Writer {
    pub fn write_table(&mut self, table: &ViewTable) -> Result<()> {
        match self {
            Writer::Stdout(writer) => {
                writeln!(writer, "== {} ==", table.name)?;
                writeln!(writer, "{}", table.columns.join("\t"))?;
                for row in &table.rows {
                    let line: Vec<String> = row.iter().map(Cell::to_string).collect();
                    writeln!(writer, "{}", line.join("\t"))?;
                }
                writeln!(writer)?;
            }
            Writer::JsonFile(writer) => {
                let objects: Vec<Value> = table
                    .rows
                    .iter()
                    .map(|row| row_object(table, row))
                    .collect::<Result<_>>()?;
                let serialized = serde_json::to_string_pretty(&objects)?;
                writeln!(writer, "{}", serialized)?;
            }
            Writer::JsonlFile(writer) => {
                for row in &table.rows {
                    let serialized = serde_json::to_string(&row_object(table, row)?)?;
                    writeln!(writer, "{}", serialized)?;
                }
            }
            Writer::CsvFile(writer) => {
                writeln!(writer, "{}", table.columns.join(","))?;
                for row in &table.rows {
                    let fields: Vec<String> = row
                        .iter()
                        .map(|c| escape_csv_field(&c.to_string()))
                        .collect();
                    writeln!(writer, "{}", fields.join(","))?;
                }
            }
            Writer::TsvFile(writer) => {
                writeln!(writer, "{}", table.columns.join("\t"))?;
                for row in &table.rows {
                    let fields: Vec<String> = row
                        .iter()
                        .map(|c| escape_tsv_field(&c.to_string()))
                        .collect();
                    writeln!(writer, "{}", fields.join("\t"))?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        match self {
            Writer::Stdout(ref mut writer) => writer.flush()?,
            Writer::JsonFile(ref mut writer)
            | Writer::JsonlFile(ref mut writer)
            | Writer::CsvFile(ref mut writer)
            | Writer::TsvFile(ref mut writer) => writer.flush()?,
        }
        Ok(())
    }
}

pub fn create_writer(target: &str) -> Result<Writer> {
    match target {
        "stdout" => Ok(Writer::Stdout(Box::new(io::stdout()))),
        path if path.ends_with(".json") => {
            create_parent_dirs(path)?;
            Ok(Writer::JsonFile(BufWriter::new(File::create(path)?)))
        }
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            create_parent_dirs(path)?;
            Ok(Writer::JsonlFile(BufWriter::new(File::create(path)?)))
        }
        path if path.ends_with(".csv") => {
            create_parent_dirs(path)?;
            Ok(Writer::CsvFile(BufWriter::new(File::create(path)?)))
        }
        path if path.ends_with(".tsv") => {
            create_parent_dirs(path)?;
            Ok(Writer::TsvFile(BufWriter::new(File::create(path)?)))
        }
        other => Err(anyhow!(
            "Unknown export target: {}. Use 'stdout' or a .csv/.tsv/.json/.jsonl path",
            other
        )),
    }
}

/// One row as a column-name -> value object for the JSON formats.
fn row_object(table: &ViewTable, row: &[Cell]) -> Result<Value> {
    let mut obj = Map::with_capacity(table.columns.len());
    for (col, cell) in table.columns.iter().zip(row) {
        obj.insert(col.to_string(), serde_json::to_value(cell)?);
    }
    Ok(Value::Object(obj))
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_tsv_field(field: &str) -> String {
    field
        .replace('\t', " ")
        .replace('\n', " ")
        .replace('\r', " ")
}
