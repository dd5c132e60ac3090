use std::io::Write;

use crate::target::TargetId;

/// Name of the column appended to every artifact row.
pub const TARGET_COLUMN: &str = "kepler_id";

/// A decoded time series: named numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightCurve {
    columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
#[error("column {name} has {actual} rows, expected {expected}")]
pub struct ColumnLengthMismatch {
    pub name: String,
    pub expected: usize,
    pub actual: usize,
}

impl LightCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. All columns must have the same number of rows.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ColumnLengthMismatch> {
        let name = name.into();
        if let Some(first) = self.columns.first()
            && first.values.len() != values.len()
        {
            return Err(ColumnLengthMismatch {
                name,
                expected: first.values.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Write the table as CSV with a trailing `kepler_id` column.
    /// NaN cells are written as empty fields.
    pub fn write_csv<W: Write>(&self, writer: W, target: &TargetId) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.column_names().collect();
        header.push(TARGET_COLUMN);
        out.write_record(&header)?;

        let mut row = Vec::with_capacity(header.len());
        for i in 0..self.num_rows() {
            row.clear();
            for column in &self.columns {
                let value = column.values[i];
                row.push(if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                });
            }
            row.push(target.to_string());
            out.write_record(&row)?;
        }

        out.flush()?;
        Ok(())
    }
}
