//! Feature extraction
//!
//! Team-relative match rows, rolling-history selection and fixed-shape
//! tensor blocks for the sequence model.

pub mod history;
pub mod match_repr;
pub mod tensor;

pub use history::select_history;
pub use match_repr::FeatureRow;
pub use tensor::HistoryTensor;
