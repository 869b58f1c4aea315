use crate::domain::model::{Collection, Record};
use crate::utils::error::{AggError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnwindOptions {
    /// 空陣列時輸出一筆欄位為 null 的紀錄，而不是丟棄
    pub preserve_empty: bool,
    /// 把元素在原陣列中的位置寫入這個欄位
    pub include_array_index: Option<String>,
}

/// `$unwind`：陣列欄位長度為 N 時展開成 N 筆紀錄，空陣列的紀錄會被丟棄
pub fn explode_array_field(input: &[Record], field: &str) -> Result<Collection> {
    explode_array_field_with(input, field, &UnwindOptions::default())
}

pub fn explode_array_field_with(
    input: &[Record],
    field: &str,
    options: &UnwindOptions,
) -> Result<Collection> {
    let mut output = Vec::with_capacity(input.len());

    for record in input {
        let items = match record.get(field) {
            Some(Value::Array(items)) => items,
            other => return Err(AggError::invalid_field_type(field, "sequence", other)),
        };

        if items.is_empty() {
            if options.preserve_empty {
                output.push(with_index(
                    record.clone().with(field, Value::Null),
                    options,
                    Value::Null,
                ));
            }
            continue;
        }

        for (position, item) in items.iter().enumerate() {
            output.push(with_index(
                record.clone().with(field, item.clone()),
                options,
                Value::from(position),
            ));
        }
    }

    tracing::debug!(
        "📤 unwind '{}': {} -> {} records",
        field,
        input.len(),
        output.len()
    );
    Ok(output)
}

fn with_index(record: Record, options: &UnwindOptions, position: Value) -> Record {
    match &options.include_array_index {
        Some(index_field) => record.with(index_field.clone(), position),
        None => record,
    }
}
