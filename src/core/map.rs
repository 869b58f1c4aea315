use crate::domain::model::{Collection, Record};
use crate::utils::error::{AggError, Result};
use serde_json::Value;

/// `$map`：對 `source_field` 陣列的每個元素套用 `transform`，結果存到 `output_field`
pub fn map_array_field<F>(
    input: &[Record],
    source_field: &str,
    output_field: &str,
    transform: F,
) -> Result<Collection>
where
    F: Fn(&Value) -> Value,
{
    try_map_array_field(input, source_field, output_field, |item| Ok(transform(item)))
}

pub fn try_map_array_field<F>(
    input: &[Record],
    source_field: &str,
    output_field: &str,
    transform: F,
) -> Result<Collection>
where
    F: Fn(&Value) -> Result<Value>,
{
    input
        .iter()
        .map(|record| -> Result<Record> {
            let items = match record.get(source_field) {
                Some(Value::Array(items)) => items,
                other => return Err(AggError::invalid_field_type(source_field, "sequence", other)),
            };

            let mapped = items.iter().map(&transform).collect::<Result<Vec<_>>>()?;
            Ok(record.clone().with(output_field, Value::Array(mapped)))
        })
        .collect()
}
