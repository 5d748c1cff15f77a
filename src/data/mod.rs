//! Data storage and normalization
//!
//! SQLite match store, raw-report transformation, unit registry and
//! per-unit tensor persistence.

pub mod database;
pub mod registry;
pub mod tensor_store;
pub mod transform;

pub use database::Database;
pub use registry::{UnitId, UnitRegistry, UnitRow};
pub use tensor_store::{TensorStore, UnitTensors};
pub use transform::{DataTransformer, RawMatch};
