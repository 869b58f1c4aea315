use crate::core::add_fields::try_derive_field;
use crate::core::expr::Expr;
use crate::core::lookup::join_by_key;
use crate::core::map::try_map_array_field;
use crate::core::merge::merge_nested_objects;
use crate::core::unwind::{explode_array_field_with, UnwindOptions};
use crate::domain::model::{Collection, Record};
use crate::domain::ports::CollectionSource;
use crate::utils::error::{AggError, Result};
use crate::utils::validation::{validate_field_name, validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};

/// 管線中的一個步驟，對應到一個轉換函式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        #[serde(rename = "as")]
        output_field: String,
    },
    Unwind {
        field: String,
        #[serde(default)]
        preserve_empty: bool,
        #[serde(default)]
        include_array_index: Option<String>,
    },
    AddFields {
        field: String,
        expr: Expr,
    },
    Map {
        source: String,
        output: String,
        expr: Expr,
    },
    MergeObjects {
        fields: Vec<String>,
        /// 沒有指定時，合併結果取代整筆紀錄
        #[serde(default)]
        into: Option<String>,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Lookup { .. } => "lookup",
            Stage::Unwind { .. } => "unwind",
            Stage::AddFields { .. } => "add_fields",
            Stage::Map { .. } => "map",
            Stage::MergeObjects { .. } => "merge_objects",
        }
    }

    pub fn apply(&self, input: &[Record], source: &dyn CollectionSource) -> Result<Collection> {
        match self {
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                output_field,
            } => {
                let right = source.load(from)?;
                join_by_key(input, &right, local_field, foreign_field, output_field)
            }
            Stage::Unwind {
                field,
                preserve_empty,
                include_array_index,
            } => {
                let options = UnwindOptions {
                    preserve_empty: *preserve_empty,
                    include_array_index: include_array_index.clone(),
                };
                explode_array_field_with(input, field, &options)
            }
            Stage::AddFields { field, expr } => {
                try_derive_field(input, field, |record| expr.eval_record(record))
            }
            Stage::Map {
                source: source_field,
                output,
                expr,
            } => try_map_array_field(input, source_field, output, |item| expr.eval_value(item)),
            Stage::MergeObjects { fields, into } => input
                .iter()
                .map(|record| -> Result<Record> {
                    let merged = merge_nested_objects(record, fields.as_slice())?;
                    Ok(match into {
                        Some(target) => record.clone().with(target.clone(), merged.into_value()),
                        None => merged,
                    })
                })
                .collect(),
        }
    }
}

impl Validate for Stage {
    fn validate(&self) -> Result<()> {
        match self {
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                output_field,
            } => {
                validate_non_empty_string("lookup.from", from)?;
                validate_field_name("lookup.local_field", local_field)?;
                validate_field_name("lookup.foreign_field", foreign_field)?;
                validate_field_name("lookup.as", output_field)
            }
            Stage::Unwind {
                field,
                include_array_index,
                ..
            } => {
                validate_field_name("unwind.field", field)?;
                if let Some(index_field) = include_array_index {
                    validate_field_name("unwind.include_array_index", index_field)?;
                }
                Ok(())
            }
            Stage::AddFields { field, expr } => {
                validate_field_name("add_fields.field", field)?;
                validate_expr("add_fields.expr", expr)
            }
            Stage::Map {
                source,
                output,
                expr,
            } => {
                validate_field_name("map.source", source)?;
                validate_field_name("map.output", output)?;
                validate_expr("map.expr", expr)
            }
            Stage::MergeObjects { fields, into } => {
                for field in fields {
                    validate_field_name("merge_objects.fields", field)?;
                }
                if let Some(target) = into {
                    validate_field_name("merge_objects.into", target)?;
                }
                Ok(())
            }
        }
    }
}

fn validate_expr(field_name: &str, expr: &Expr) -> Result<()> {
    for field in expr.merged_fields() {
        validate_field_name(field_name, field)?;
    }
    Ok(())
}

/// 依序執行的一組 Stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(&self, input: Collection, source: &dyn CollectionSource) -> Result<Collection> {
        self.stages
            .iter()
            .enumerate()
            .try_fold(input, |records, (index, stage)| -> Result<Collection> {
                let output = stage.apply(&records, source).map_err(|e| AggError::StageFailed {
                    index,
                    stage: stage.name().to_string(),
                    source: Box::new(e),
                })?;
                tracing::debug!(
                    "🔄 stage {} ({}): {} -> {} records",
                    index,
                    stage.name(),
                    records.len(),
                    output.len()
                );
                Ok(output)
            })
    }
}

impl Validate for Pipeline {
    fn validate(&self) -> Result<()> {
        for (index, stage) in self.stages.iter().enumerate() {
            stage.validate().map_err(|e| AggError::StageFailed {
                index,
                stage: stage.name().to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}
