use crate::domain::model::{Collection, Record};
use crate::utils::error::{AggError, Result};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// 可雜湊的 join key，數字以數值比較（101 與 101.0 相同）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Null,
    Bool(bool),
    Int(i128),
    Float(u64),
    Text(String),
}

impl JoinKey {
    fn from_field(record: &Record, field: &str) -> Result<Self> {
        match record.get(field) {
            None | Some(Value::Null) => Ok(JoinKey::Null),
            Some(Value::Bool(b)) => Ok(JoinKey::Bool(*b)),
            Some(Value::Number(n)) => Ok(Self::from_number(n)),
            Some(Value::String(s)) => Ok(JoinKey::Text(s.clone())),
            Some(other) => Err(AggError::type_mismatch(field, "scalar join key", other)),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return JoinKey::Int(i as i128);
        }
        if let Some(u) = n.as_u64() {
            return JoinKey::Int(u as i128);
        }
        let f = n.as_f64().unwrap_or(f64::NAN);
        // 整數值的浮點數落在 i128 範圍內，與 i64 / u64 key 相同
        if f.fract() == 0.0 && f.abs() < 2f64.powi(127) {
            JoinKey::Int(f as i128)
        } else {
            JoinKey::Float(f.to_bits())
        }
    }
}

/// `$lookup`：左側每筆紀錄加上 `output_field`，內容為右側所有 key 相等的紀錄。
///
/// 沒有符合時輸出空陣列，不會是 null。欄位不存在時視為 null。
pub fn join_by_key(
    left: &[Record],
    right: &[Record],
    local_field: &str,
    foreign_field: &str,
    output_field: &str,
) -> Result<Collection> {
    // 先對右側建索引，保留原本順序
    let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (position, record) in right.iter().enumerate() {
        let key = JoinKey::from_field(record, foreign_field)?;
        index.entry(key).or_default().push(position);
    }

    let mut joined = Vec::with_capacity(left.len());
    for record in left {
        let key = JoinKey::from_field(record, local_field)?;
        let matches: Vec<Value> = index
            .get(&key)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| right[i].clone().into_value())
                    .collect()
            })
            .unwrap_or_default();

        joined.push(record.clone().with(output_field, Value::Array(matches)));
    }

    tracing::debug!(
        "🔗 lookup {} -> {}: {} left, {} right",
        local_field,
        foreign_field,
        left.len(),
        right.len()
    );
    Ok(joined)
}
