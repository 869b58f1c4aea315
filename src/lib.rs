pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryStore, LocalStorage};
pub use config::PipelineConfig;
pub use crate::core::add_fields::{derive_field, try_derive_field};
pub use crate::core::array::{element_at_field, element_at_index};
pub use crate::core::engine::{PipelineEngine, RunSummary};
pub use crate::core::expr::Expr;
pub use crate::core::lookup::join_by_key;
pub use crate::core::map::{map_array_field, try_map_array_field};
pub use crate::core::merge::merge_nested_objects;
pub use crate::core::path::FieldPath;
pub use crate::core::pipeline::{Pipeline, Stage};
pub use crate::core::unwind::{explode_array_field, explode_array_field_with, UnwindOptions};
pub use domain::model::{collection_from_value, Collection, Record};
pub use utils::error::{AggError, Result};
