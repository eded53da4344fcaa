//! In-memory tabular content.

use std::{iter, sync::Arc};

use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, FieldRef, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};

/// A loaded model-output table: one schema plus its record batches in order.
#[derive(Clone, Debug)]
pub struct ModelOutputTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ModelOutputTable {
    /// Create a table from a schema and batches that all share it.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Table schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Record batches in row order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Return a new table with one non-null Utf8 column per `(name, value)`
    /// pair appended after the existing columns, each repeating `value` on
    /// every row. `self` is left untouched.
    pub fn with_constant_columns(&self, columns: &[(&str, &str)]) -> Result<Self, ArrowError> {
        let mut fields: Vec<FieldRef> = self.schema.fields().iter().cloned().collect();
        fields.extend(
            columns
                .iter()
                .map(|(name, _)| Arc::new(Field::new(*name, DataType::Utf8, false))),
        );
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            self.schema.metadata().clone(),
        ));

        let batches = self
            .batches
            .iter()
            .map(|batch| {
                let rows = batch.num_rows();
                let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();
                arrays.extend(columns.iter().map(|(_, value)| {
                    Arc::new(StringArray::from_iter_values(iter::repeat_n(*value, rows)))
                        as ArrayRef
                }));
                RecordBatch::try_new(Arc::clone(&schema), arrays)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, batches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, Float64Array};

    fn two_batch_table() -> ModelOutputTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("location", DataType::Utf8, false),
            Field::new("value", DataType::Float64, false),
        ]));
        let first = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(StringArray::from(vec!["earth", "vulcan"])),
                Arc::new(Float64Array::from(vec![11.11, 22.22])),
            ],
        )
        .expect("valid batch");
        let second = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(StringArray::from(vec!["seti alpha"])),
                Arc::new(Float64Array::from(vec![33.33])),
            ],
        )
        .expect("valid batch");
        ModelOutputTable::new(schema, vec![first, second])
    }

    #[test]
    fn counts_rows_across_batches() {
        let table = two_batch_table();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column_names(), vec!["location", "value"]);
    }

    #[test]
    fn constant_columns_are_appended_in_order() -> Result<(), ArrowError> {
        let table = two_batch_table();
        let out = table.with_constant_columns(&[("a", "x"), ("b", "y")])?;

        assert_eq!(out.column_names(), vec!["location", "value", "a", "b"]);
        assert_eq!(out.num_rows(), 3);
        for batch in out.batches() {
            let a = batch.column(2).as_string::<i32>();
            assert!(a.iter().all(|v| v == Some("x")));
            let b = batch.column(3).as_string::<i32>();
            assert!(b.iter().all(|v| v == Some("y")));
        }

        // The source table keeps its original shape.
        assert_eq!(table.num_columns(), 2);
        Ok(())
    }

    #[test]
    fn constant_columns_on_empty_table_extend_schema() -> Result<(), ArrowError> {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, true)]));
        let table = ModelOutputTable::new(schema, Vec::new());

        let out = table.with_constant_columns(&[("team", "t")])?;
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.column_names(), vec!["x", "team"]);
        Ok(())
    }
}
