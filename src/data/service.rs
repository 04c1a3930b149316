//! Read-only views over the evaluation table for the front end.

use serde::Serialize;
use serde_json::{Map, Value};

use super::domain::{ColumnKind, EvaluationTable, FeatureValue};

/// Row-wise export for the parallel-coordinates plot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowExport {
    pub data: Vec<Map<String, Value>>,
    /// Numeric feature columns plus `score`.
    pub numeric_keys: Vec<String>,
    pub cat_keys: Vec<String>,
}

/// Every feature column of the evaluation table, in schema order.
pub fn feature_list(table: &EvaluationTable) -> Vec<String> {
    table.schema().names()
}

/// One record per row: its features plus `true_label`, `prediction` and `score`.
pub fn export_rows(table: &EvaluationTable, threshold: f64) -> RowExport {
    let schema = table.schema();
    let data = table
        .rows()
        .iter()
        .map(|row| {
            let mut record = Map::new();
            for column in schema.columns() {
                let value = match row.feature(&column.name) {
                    Some(FeatureValue::Number(v)) if column.kind == ColumnKind::Numeric => {
                        serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
                    }
                    Some(other) => Value::String(other.to_string()),
                    None => Value::String("NA".to_string()),
                };
                record.insert(column.name.clone(), value);
            }
            record.insert("true_label".into(), Value::from(row.label()));
            record.insert("prediction".into(), Value::from(row.predicted(threshold)));
            record.insert("score".into(), Value::from(row.score()));
            record
        })
        .collect();

    let mut numeric_keys: Vec<String> = schema
        .columns()
        .iter()
        .filter(|c| c.kind == ColumnKind::Numeric)
        .map(|c| c.name.clone())
        .collect();
    numeric_keys.push("score".into());
    let cat_keys = schema
        .columns()
        .iter()
        .filter(|c| c.kind == ColumnKind::Categorical)
        .map(|c| c.name.clone())
        .collect();

    RowExport {
        data,
        numeric_keys,
        cat_keys,
    }
}
