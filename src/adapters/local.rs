use crate::domain::model::{collection_from_value, Collection, Record};
use crate::domain::ports::{CollectionSink, CollectionSource, OutputFormat};
use crate::utils::error::{AggError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 本機目錄：讀取 `<name>.json` / `<name>.jsonl` / `<name>.csv`，輸出到同一個目錄
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn find_input(&self, name: &str) -> Option<(PathBuf, OutputFormat)> {
        [OutputFormat::Json, OutputFormat::JsonLines, OutputFormat::Csv]
            .into_iter()
            .map(|format| {
                (
                    self.base_path.join(format!("{}.{}", name, format.extension())),
                    format,
                )
            })
            .find(|(path, _)| path.is_file())
    }
}

impl CollectionSource for LocalStorage {
    fn load(&self, name: &str) -> Result<Collection> {
        let (path, format) = self.find_input(name).ok_or_else(|| AggError::SourceNotFound {
            name: format!("{} (in {})", name, self.base_path.display()),
        })?;

        tracing::debug!("📥 Reading {} as {:?}", path.display(), format);
        let content = fs::read_to_string(&path)?;

        match format {
            OutputFormat::Json => collection_from_value(serde_json::from_str(&content)?),
            OutputFormat::JsonLines => content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| Record::try_from(serde_json::from_str::<Value>(line)?))
                .collect(),
            OutputFormat::Csv => read_csv(&content),
        }
    }
}

impl CollectionSink for LocalStorage {
    fn write(&self, name: &str, format: OutputFormat, records: &[Record]) -> Result<String> {
        fs::create_dir_all(&self.base_path)?;
        let full_path = self.base_path.join(format!("{}.{}", name, format.extension()));

        let data = match format {
            OutputFormat::Json => serde_json::to_vec_pretty(records)?,
            OutputFormat::JsonLines => {
                let mut buffer = Vec::new();
                for record in records {
                    serde_json::to_writer(&mut buffer, record)?;
                    buffer.write_all(b"\n")?;
                }
                buffer
            }
            OutputFormat::Csv => write_csv(records)?,
        };

        tracing::debug!("💾 Writing {} bytes to {}", data.len(), full_path.display());
        fs::write(&full_path, data)?;
        Ok(full_path.display().to_string())
    }
}

fn read_csv(content: &str) -> Result<Collection> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut data = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            data.insert(header.to_string(), infer_cell(cell));
        }
        records.push(Record::from(data));
    }
    Ok(records)
}

/// CSV 儲存格：整數、浮點數、布林，空字串為 null，其餘保留為文字
fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn write_csv(records: &[Record]) -> Result<Vec<u8>> {
    // 欄位依第一次出現的順序排列
    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    // 沒有任何欄位時寫出空檔，csv 會把零欄標頭寫成 `""`
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers)?;
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| match record.get(header) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| AggError::IoError(e.into_error()))
}
