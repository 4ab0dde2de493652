pub mod analysis;
pub mod config;
pub mod dictionaries;
pub mod errors;
pub mod extraction;
pub mod routes;
pub mod state;

pub use analysis::{analyze, AnalysisResult, AnalysisWarning};
pub use dictionaries::{Dictionaries, DictionaryError};
