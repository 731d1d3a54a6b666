pub mod aggregation;
pub mod charts;
pub mod context;
pub mod engine;
pub mod loader;
pub mod pipeline;
pub mod summary;

pub use crate::domain::model::{ResultSet, Table, Value};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
