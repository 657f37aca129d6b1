#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod artifacts;
mod directory;
mod error;
pub mod extraction;
pub mod interpreter;
mod service;
pub mod store;

pub use artifacts::{FormArtifacts, is_valid_entity_id};
pub use directory::CompanyDirectory;
pub use error::{ExtractionFailure, FormError, StoreError};
pub use extraction::{FieldExtractor, KeyPathExtractor, ReasoningExtractor};
pub use interpreter::{
    CommandInterpreter, DEDUCTIBLE_PLACEHOLDER, EditOutcome, EditPath, EditStrategy,
    fallback_edit,
};
pub use service::{EditedForm, FormService, GeneratedForm, RenderSettings};
pub use store::{EntityGuard, FormStore, Snapshot};
