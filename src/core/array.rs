use crate::domain::model::Record;
use crate::utils::error::{AggError, Result};
use serde_json::Value;

/// `$arrayElemAt`：取出指定位置的元素，負數索引從尾端算起（-1 為最後一個）
pub fn element_at_index<T>(sequence: &[T], index: i64) -> Result<&T> {
    let len = sequence.len();
    let position = if index < 0 {
        // -len 是第一個元素，再小就超出範圍
        len.checked_sub(index.unsigned_abs() as usize)
    } else {
        usize::try_from(index).ok().filter(|&i| i < len)
    };

    position
        .and_then(|i| sequence.get(i))
        .ok_or(AggError::IndexOutOfRange { index, len })
}

/// 讀取紀錄中的陣列欄位並取出指定元素
pub fn element_at_field(record: &Record, field: &str, index: i64) -> Result<Value> {
    match record.get(field) {
        Some(Value::Array(items)) => element_at_index(items, index).cloned(),
        other => Err(AggError::invalid_field_type(field, "sequence", other)),
    }
}
