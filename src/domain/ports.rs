use crate::domain::model::{Collection, Record};
use crate::utils::error::Result;

/// 依名稱提供 Collection，例如 lookup 階段的右側資料
pub trait CollectionSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Collection>;
}

/// 輸出處理結果，回傳寫入的位置
pub trait CollectionSink: Send + Sync {
    fn write(&self, name: &str, format: OutputFormat, records: &[Record]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonLines,
    Csv,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 3] = ["json", "jsonl", "csv"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "json" => Some(OutputFormat::Json),
            "jsonl" => Some(OutputFormat::JsonLines),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonLines => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}
