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

//! HTTP adapters for the services the form pipeline depends on.

mod anthropic;
mod anvil;
mod openai;
mod retool;
pub mod retry;
mod whisper;

pub use anthropic::AnthropicProvider;
pub use anvil::AnvilRenderer;
pub use openai::OpenAiProvider;
pub use retool::RetoolMemorySource;
pub use whisper::WhisperTranscriber;
