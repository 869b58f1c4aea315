use crate::core::array::element_at_index;
use crate::domain::model::Record;
use crate::utils::error::{AggError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(i64),
}

/// 巢狀欄位路徑：`user.profile.name`、`employees[0].email`、`employees[-1].name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| AggError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut steps = Vec::new();
        for (n, segment) in raw.split('.').enumerate() {
            let (key, mut rest) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };

            // 只有第一段可以直接以索引開頭，例如 `[0].name`
            if key.is_empty() && (n > 0 || rest.is_empty()) {
                return Err(invalid("empty segment"));
            }
            if !key.is_empty() {
                steps.push(PathStep::Key(key.to_string()));
            }

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid("unclosed '['"))?;
                if !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
                let index = rest[1..close]
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid("index must be an integer"))?;
                steps.push(PathStep::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 單一頂層欄位（沒有巢狀與索引）
    pub fn top_level_key(&self) -> Option<&str> {
        match self.steps.as_slice() {
            [PathStep::Key(key)] => Some(key),
            _ => None,
        }
    }

    /// 找不到時回傳 None，不視為錯誤
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        walk(value, &self.steps)
    }

    pub fn resolve_in<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        match self.steps.split_first()? {
            (PathStep::Key(key), rest) => walk(record.get(key)?, rest),
            (PathStep::Index(_), _) => None,
        }
    }
}

fn walk<'a>(start: &'a Value, steps: &[PathStep]) -> Option<&'a Value> {
    steps.iter().try_fold(start, |current, step| match (step, current) {
        (PathStep::Key(key), Value::Object(map)) => map.get(key),
        (PathStep::Index(index), Value::Array(items)) => element_at_index(items, *index).ok(),
        _ => None,
    })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = AggError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}
