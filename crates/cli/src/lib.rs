//! Topic-to-deck generation: the pipeline and its interactive front end.

pub mod pipeline;
pub mod prompts;

pub use pipeline::{DeckRequest, Pipeline, RunReport};
