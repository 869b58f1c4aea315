use crate::domain::model::{Collection, Record};
use crate::utils::error::Result;
use serde_json::Value;

/// `$addFields`：每筆紀錄加上 `output_field = compute(record)`，已存在時覆寫
pub fn derive_field<F>(input: &[Record], output_field: &str, compute: F) -> Collection
where
    F: Fn(&Record) -> Value,
{
    input
        .iter()
        .map(|record| record.clone().with(output_field, compute(record)))
        .collect()
}

/// 同 [`derive_field`]，但 `compute` 可能失敗；遇到第一個錯誤就停止
pub fn try_derive_field<F>(input: &[Record], output_field: &str, compute: F) -> Result<Collection>
where
    F: Fn(&Record) -> Result<Value>,
{
    input
        .iter()
        .map(|record| -> Result<Record> {
            Ok(record.clone().with(output_field, compute(record)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::collection_from_value;
    use crate::utils::error::AggError;
    use serde_json::json;

    fn total_score(record: &Record) -> Value {
        let total: i64 = record
            .get("scores")
            .and_then(Value::as_array)
            .map(|scores| scores.iter().filter_map(Value::as_i64).sum())
            .unwrap_or(0);
        json!(total)
    }

    #[test]
    fn test_derive_total_score() {
        let input = collection_from_value(json!([
            {"student": "Ann", "scores": [10, 20, 30]},
            {"student": "Ben", "scores": [5]}
        ]))
        .unwrap();

        let result = derive_field(&input, "total", total_score);
        assert_eq!(result[0].get("total"), Some(&json!(60)));
        assert_eq!(result[1].get("total"), Some(&json!(5)));
        assert_eq!(result[0].get("student"), Some(&json!("Ann")));
    }

    #[test]
    fn test_derive_twice_overwrites_instead_of_duplicating() {
        let input = collection_from_value(json!([{"a": 1}, {"a": 2}])).unwrap();

        let once = derive_field(&input, "flag", |_| json!(false));
        let twice = derive_field(&once, "flag", |_| json!(true));

        assert_eq!(twice.len(), input.len());
        for record in &twice {
            assert_eq!(record.data.len(), 2);
            assert_eq!(record.get("flag"), Some(&json!(true)));
        }
    }

    #[test]
    fn test_overwrite_keeps_field_position() {
        let input = collection_from_value(json!([{"x": 1, "y": 2, "z": 3}])).unwrap();
        let result = derive_field(&input, "x", |r| json!(r.get("y").cloned()));

        let keys: Vec<&String> = result[0].data.keys().collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        assert_eq!(result[0].get("x"), Some(&json!(2)));
    }

    #[test]
    fn test_try_derive_stops_on_error() {
        let input = collection_from_value(json!([{"a": 1}, {"b": 2}])).unwrap();

        let result = try_derive_field(&input, "copy", |r| {
            r.get("a")
                .cloned()
                .ok_or_else(|| AggError::invalid_field_type("a", "number", None))
        });
        assert!(matches!(result, Err(AggError::InvalidFieldType { .. })));
    }
}
