use anyhow::{Context, Result};
use csv::Writer;
use serde_json::Value;
use std::{fs, path::Path};

/// Sparse row: insertion-ordered column -> value mapping. Rows in the same
/// table may carry different column sets; the union is taken at export time.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. An existing column keeps its position, so a
    /// label collision is last-write-wins on the value only.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        if let Some(cell) = self.cells.iter_mut().find(|(name, _)| *name == column) {
            cell.1 = value;
        } else {
            self.cells.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn flag(&self, column: &str) -> bool {
        matches!(self.get(column), Some(Value::Bool(true)))
    }

    fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }
}

/// Union of all column names across rows, in first-seen order.
pub fn columns(rows: &[Row]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        for name in row.column_names() {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn write_csv(rows: &[Row], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating output dir {}", parent.display()))?;
    }

    let file_name = output_path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("table.csv");
    let tmp_path = output_path.with_file_name(format!("{file_name}.tmp"));

    let mut writer = Writer::from_path(&tmp_path)
        .with_context(|| format!("Failed creating temp table CSV {}", tmp_path.display()))?;

    let header = columns(rows);
    if !header.is_empty() {
        writer
            .write_record(&header)
            .context("Failed writing table CSV header")?;
        for row in rows {
            let record: Vec<String> = header
                .iter()
                .map(|column| render_cell(row.get(column)))
                .collect();
            writer
                .write_record(&record)
                .context("Failed writing table CSV row")?;
        }
    }
    writer.flush().context("Failed flushing table CSV writer")?;

    fs::rename(&tmp_path, output_path).with_context(|| {
        format!(
            "Failed moving temp table {} to {}",
            tmp_path.display(),
            output_path.display()
        )
    })?;
    Ok(())
}
