pub mod add_fields;
pub mod array;
pub mod engine;
pub mod expr;
pub mod lookup;
pub mod map;
pub mod merge;
pub mod path;
pub mod pipeline;
pub mod unwind;

pub use crate::domain::model::{Collection, Record};
pub use crate::domain::ports::{CollectionSink, CollectionSource, OutputFormat};
pub use crate::utils::error::Result;
