use crate::core::array::element_at_index;
use crate::core::merge::merge_nested_objects;
use crate::core::path::FieldPath;
use crate::domain::model::Record;
use crate::utils::error::{AggError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Cow;

/// 設定檔中可用的運算式。`add_fields` 以整筆紀錄為目前值，`map` 以陣列元素為目前值。
///
/// ```toml
/// expr = { sum = "scores" }
/// expr = { element_at = { field = "scores", index = -1 } }
/// expr = { multiply = ["current", { literal = 1.1 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Current,
    Field(FieldPath),
    Literal(Value),
    ElementAt { field: FieldPath, index: i64 },
    Size(FieldPath),
    Sum(FieldPath),
    Add(Vec<Expr>),
    Multiply(Vec<Expr>),
    Concat(Vec<Expr>),
    MergeObjects(Vec<String>),
}

/// 運算式的目前值
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Record(&'a Record),
    Value(&'a Value),
}

impl<'a> Scope<'a> {
    fn resolve(self, path: &FieldPath) -> Option<&'a Value> {
        match self {
            Scope::Record(record) => path.resolve_in(record),
            Scope::Value(value) => path.resolve(value),
        }
    }

    fn to_value(self) -> Value {
        match self {
            Scope::Record(record) => Value::Object(record.data.clone()),
            Scope::Value(value) => value.clone(),
        }
    }

    fn as_record(self) -> Result<Cow<'a, Record>> {
        match self {
            Scope::Record(record) => Ok(Cow::Borrowed(record)),
            Scope::Value(Value::Object(map)) => Ok(Cow::Owned(Record::from(map.clone()))),
            Scope::Value(other) => Err(AggError::type_mismatch("<current>", "record", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => Ok(n
                .as_i64()
                .map(Num::Int)
                .unwrap_or_else(|| Num::Float(n.as_f64().unwrap_or(f64::NAN)))),
            other => Err(AggError::type_mismatch(field, "number", other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 + b as f64)),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 * b as f64)),
            (a, b) => Num::Float(a.as_f64() * b.as_f64()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::from(i),
            // NaN 和無限大無法表示成 JSON 數字
            Num::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

impl Expr {
    pub fn eval(&self, scope: Scope<'_>) -> Result<Value> {
        match self {
            Expr::Current => Ok(scope.to_value()),
            Expr::Field(path) => Ok(scope.resolve(path).cloned().unwrap_or(Value::Null)),
            Expr::Literal(value) => Ok(value.clone()),
            Expr::ElementAt { field, index } => {
                let items = sequence_at(scope, field)?;
                element_at_index(items, *index).cloned()
            }
            Expr::Size(path) => Ok(Value::from(sequence_at(scope, path)?.len())),
            Expr::Sum(path) => {
                let field = path.as_str();
                sequence_at(scope, path)?
                    .iter()
                    .try_fold(Num::Int(0), |acc, item| -> Result<Num> {
                        Ok(acc.add(Num::from_value(field, item)?))
                    })
                    .map(Num::into_value)
            }
            Expr::Add(operands) => fold_numbers(operands, scope, "add", Num::Int(0), Num::add),
            Expr::Multiply(operands) => {
                fold_numbers(operands, scope, "multiply", Num::Int(1), Num::mul)
            }
            Expr::Concat(operands) => {
                let mut text = String::new();
                for operand in operands {
                    match operand.eval(scope)? {
                        Value::String(s) => text.push_str(&s),
                        Value::Null => return Ok(Value::Null),
                        other => return Err(AggError::type_mismatch("concat", "text", &other)),
                    }
                }
                Ok(Value::String(text))
            }
            Expr::MergeObjects(fields) => {
                let record = scope.as_record()?;
                Ok(merge_nested_objects(&record, fields.as_slice())?.into_value())
            }
        }
    }

    pub fn eval_record(&self, record: &Record) -> Result<Value> {
        self.eval(Scope::Record(record))
    }

    pub fn eval_value(&self, value: &Value) -> Result<Value> {
        self.eval(Scope::Value(value))
    }

    /// `merge_objects` 運算式中列出的頂層欄位名稱
    pub fn merged_fields(&self) -> Vec<&str> {
        match self {
            Expr::MergeObjects(fields) => fields.iter().map(String::as_str).collect(),
            Expr::Add(operands) | Expr::Multiply(operands) | Expr::Concat(operands) => operands
                .iter()
                .flat_map(Expr::merged_fields)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn sequence_at<'a>(scope: Scope<'a>, path: &FieldPath) -> Result<&'a Vec<Value>> {
    match scope.resolve(path) {
        Some(Value::Array(items)) => Ok(items),
        other => Err(AggError::invalid_field_type(path.as_str(), "sequence", other)),
    }
}

fn fold_numbers(
    operands: &[Expr],
    scope: Scope<'_>,
    name: &str,
    init: Num,
    op: fn(Num, Num) -> Num,
) -> Result<Value> {
    let mut acc = init;
    for operand in operands {
        let value = operand.eval(scope)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
        acc = op(acc, Num::from_value(name, &value)?);
    }
    Ok(acc.into_value())
}
