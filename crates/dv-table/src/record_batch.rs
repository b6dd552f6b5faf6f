//! Building tables from arrow record batches

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit};
use arrow::record_batch::RecordBatch;
use dv_core::{FieldType, Row, Value};

use crate::config::TableConfig;
use crate::field::FieldSpec;
use crate::table::{Table, TableInfo};
use crate::{Result, TableError};

/// Field type of an arrow column, `None` for nested types
pub fn field_type_for(data_type: &DataType) -> Option<FieldType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(FieldType::Integer),
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => Some(FieldType::Real),
        DataType::Boolean => Some(FieldType::Boolean),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Null => Some(FieldType::String),
        DataType::Date32 | DataType::Date64 => Some(FieldType::Date),
        DataType::Timestamp(_, _) => Some(FieldType::Timestamp),
        _ => None,
    }
}

fn column_values(name: &str, column: &ArrayRef, field_type: FieldType) -> Result<Vec<Value>> {
    let values = match field_type {
        FieldType::Integer => {
            let column = cast(column, &DataType::Int64)?;
            let array = column.as_primitive::<Int64Type>();
            (0..array.len())
                .map(|i| if array.is_null(i) { Value::Null } else { Value::Int(array.value(i)) })
                .collect()
        }
        FieldType::Real => {
            let column = cast(column, &DataType::Float64)?;
            let array = column.as_primitive::<Float64Type>();
            (0..array.len())
                .map(|i| if array.is_null(i) { Value::Null } else { Value::Real(array.value(i)) })
                .collect()
        }
        FieldType::Boolean => {
            let array = column.as_boolean();
            (0..array.len())
                .map(|i| if array.is_null(i) { Value::Null } else { Value::Bool(array.value(i)) })
                .collect()
        }
        FieldType::Timestamp => {
            let millis = cast(column, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            let column = cast(&millis, &DataType::Int64)?;
            let array = column.as_primitive::<Int64Type>();
            (0..array.len())
                .map(|i| if array.is_null(i) { Value::Null } else { Value::Int(array.value(i)) })
                .collect()
        }
        FieldType::String | FieldType::Date => {
            let column = cast(column, &DataType::Utf8)?;
            let array = column.as_string::<i32>();
            (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Value::Null
                    } else {
                        Value::Str(array.value(i).to_string())
                    }
                })
                .collect()
        }
        FieldType::GeoJson | FieldType::Array | FieldType::Object => {
            return Err(TableError::UnsupportedColumn {
                name: name.to_string(),
                data_type: field_type.to_string(),
            })
        }
    };
    Ok(values)
}

impl Table {
    /// Build a table from a record batch. Timestamps are stored as epoch
    /// milliseconds with format `x`; dates as their ISO string.
    pub fn from_record_batch(info: TableInfo, batch: &RecordBatch, config: &TableConfig) -> Result<Self> {
        let schema = batch.schema();
        let mut specs = Vec::with_capacity(schema.fields().len());
        let mut columns = Vec::with_capacity(schema.fields().len());

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            let Some(field_type) = field_type_for(field.data_type()) else {
                return Err(TableError::UnsupportedColumn {
                    name: field.name().clone(),
                    data_type: field.data_type().to_string(),
                });
            };

            let spec = FieldSpec::new(field.name().clone(), field_type);
            let spec = if field_type == FieldType::Timestamp {
                spec.with_format("x")
            } else {
                spec
            };
            columns.push(column_values(field.name(), column, field_type)?);
            specs.push(spec);
        }

        let rows: Vec<Row> = (0..batch.num_rows())
            .map(|i| columns.iter().map(|column| column[i].clone()).collect())
            .collect();

        tracing::debug!(
            "Converted record batch with {} columns and {} rows",
            specs.len(),
            rows.len()
        );
        Table::new(info, specs, rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Float32Array, Int32Array, ListArray, StringArray, TimestampSecondArray};
    use arrow::datatypes::{Field, Int32Type, Schema};
    use std::sync::Arc;

    #[test]
    fn test_from_record_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("count", DataType::Int32, true),
            Field::new("score", DataType::Float32, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("ok", DataType::Boolean, true),
            Field::new("at", DataType::Timestamp(TimeUnit::Second, None), true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(Float32Array::from(vec![Some(0.5), Some(1.5), None])),
                Arc::new(StringArray::from(vec![Some("a"), Some("N/A"), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])),
                Arc::new(TimestampSecondArray::from(vec![Some(1), Some(2), None])),
            ],
        )
        .unwrap();

        let table = Table::from_record_batch(TableInfo::with_id("b"), &batch, &TableConfig::default()).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.fields()[0].field_type, FieldType::Integer);
        assert_eq!(table.fields()[4].format, "x");
        assert_eq!(table.value("count", 0), Some(Value::Int(1)));
        assert_eq!(table.value("count", 1), Some(Value::Null));
        assert_eq!(table.value("score", 1), Some(Value::Real(1.5)));
        assert_eq!(table.value("name", 1), Some(Value::Null));
        assert_eq!(table.value("ok", 1), Some(Value::Bool(false)));
        assert_eq!(table.value("at", 1), Some(Value::Real(2000.0)));
        assert_eq!(table.value("at", 2), Some(Value::Null));
    }

    #[test]
    fn test_nested_column_is_rejected() {
        let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let schema = Arc::new(Schema::new(vec![Field::new("items", list.data_type().clone(), true)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(list)]).unwrap();

        let result = Table::from_record_batch(TableInfo::default(), &batch, &TableConfig::default());
        assert!(matches!(result, Err(TableError::UnsupportedColumn { name, .. }) if name == "items"));
    }
}
