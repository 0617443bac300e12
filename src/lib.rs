pub mod changelog;
pub mod ci;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod tools;
pub mod ui;
pub mod version;
pub mod workspace;

pub use error::{PipelineError, ReleaseError, Result};
