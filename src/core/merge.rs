use crate::domain::model::Record;
use crate::utils::error::{AggError, Result};
use serde_json::Value;

/// `$mergeObjects`：依序把各欄位的巢狀物件疊到同一筆紀錄上，後面的欄位優先
pub fn merge_nested_objects<S: AsRef<str>>(record: &Record, fields: &[S]) -> Result<Record> {
    let mut merged = Record::new();

    for field in fields {
        let field = field.as_ref();
        match record.get(field) {
            Some(Value::Object(nested)) => {
                for (key, value) in nested {
                    merged.data.insert(key.clone(), value.clone());
                }
            }
            other => return Err(AggError::invalid_field_type(field, "record", other)),
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_profile_and_settings() {
        let record = Record::try_from(json!({
            "_id": 1,
            "profile": {"name": "Ann", "theme": "light"},
            "settings": {"theme": "dark", "lang": "en"}
        }))
        .unwrap();

        let merged = merge_nested_objects(&record, &["profile", "settings"]).unwrap();
        assert_eq!(
            merged,
            Record::try_from(json!({"name": "Ann", "theme": "dark", "lang": "en"})).unwrap()
        );
    }

    #[test]
    fn test_last_write_wins_follows_field_order() {
        let record = Record::try_from(json!({
            "a": {"k": 1, "only_a": true},
            "b": {"k": 2},
            "c": {"k": 3, "only_c": true}
        }))
        .unwrap();

        let forward = merge_nested_objects(&record, &["a", "b", "c"]).unwrap();
        assert_eq!(forward.get("k"), Some(&json!(3)));

        let backward = merge_nested_objects(&record, &["c", "b", "a"]).unwrap();
        assert_eq!(backward.get("k"), Some(&json!(1)));
        assert_eq!(backward.get("only_c"), Some(&json!(true)));
        assert_eq!(backward.get("only_a"), Some(&json!(true)));
    }

    #[test]
    fn test_empty_field_list_gives_empty_record() {
        let record = Record::try_from(json!({"a": {"k": 1}})).unwrap();
        let fields: [&str; 0] = [];
        assert_eq!(merge_nested_objects(&record, &fields).unwrap(), Record::new());
    }

    #[test]
    fn test_non_record_field_fails() {
        let record = Record::try_from(json!({"a": {"k": 1}, "b": [1, 2], "c": null})).unwrap();

        for field in ["b", "c", "missing"] {
            assert!(matches!(
                merge_nested_objects(&record, &["a", field]),
                Err(AggError::InvalidFieldType { .. })
            ));
        }
    }
}
