use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 一筆文件：欄位名稱到值的有序對應
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

/// 一個邏輯上的資料表
pub type Collection = Vec<Record>;

impl Record {
    pub fn new() -> Self {
        Self { data: Map::new() }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// 回傳加上（或覆寫）一個欄位後的新紀錄
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.data.insert(field.into(), value);
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

impl TryFrom<Value> for Record {
    type Error = crate::utils::error::AggError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(crate::utils::error::AggError::type_mismatch(
                "<document>",
                "record",
                &other,
            )),
        }
    }
}

/// 把 JSON 陣列轉成 Collection，每個元素都必須是物件
pub fn collection_from_value(value: Value) -> crate::utils::error::Result<Collection> {
    match value {
        Value::Array(items) => items.into_iter().map(Record::try_from).collect(),
        other => Err(crate::utils::error::AggError::type_mismatch(
            "<collection>",
            "sequence",
            &other,
        )),
    }
}
