use crate::domain::model::{Collection, Record};
use crate::domain::ports::{CollectionSink, CollectionSource, OutputFormat};
use crate::utils::error::{AggError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// 記憶體中的 Collection 來源與輸出，主要給測試與函式庫呼叫端使用
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: HashMap<String, Collection>,
    written: Mutex<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, records: Collection) {
        self.collections.insert(name.into(), records);
    }

    pub fn with_collection(mut self, name: impl Into<String>, records: Collection) -> Self {
        self.insert(name, records);
        self
    }

    /// 取出先前寫入的結果，key 為 `<name>.<extension>`
    pub fn written(&self, key: &str) -> Option<Collection> {
        self.written
            .lock()
            .ok()
            .and_then(|written| written.get(key).cloned())
    }
}

impl CollectionSource for InMemoryStore {
    fn load(&self, name: &str) -> Result<Collection> {
        self.collections
            .get(name)
            .cloned()
            .ok_or_else(|| AggError::SourceNotFound {
                name: name.to_string(),
            })
    }
}

impl CollectionSink for InMemoryStore {
    fn write(&self, name: &str, format: OutputFormat, records: &[Record]) -> Result<String> {
        let key = format!("{}.{}", name, format.extension());
        let mut written = self
            .written
            .lock()
            .map_err(|_| AggError::IoError(std::io::Error::other("in-memory store lock poisoned")))?;
        written.insert(key.clone(), records.to_vec());
        Ok(format!("memory://{}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::collection_from_value;
    use serde_json::json;

    #[test]
    fn test_load_and_write() {
        let store = InMemoryStore::new()
            .with_collection("users", collection_from_value(json!([{"id": 1}])).unwrap());

        assert_eq!(store.load("users").unwrap().len(), 1);
        assert!(matches!(
            store.load("orders"),
            Err(AggError::SourceNotFound { .. })
        ));

        let records = store.load("users").unwrap();
        let location = store.write("report", OutputFormat::Json, &records).unwrap();
        assert_eq!(location, "memory://report.json");
        assert_eq!(store.written("report.json"), Some(records));
    }
}
