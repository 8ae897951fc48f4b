//! PPTX (Office Open XML) backend: opens a template, appends generated
//! slides, and reads finished decks back.

pub mod assemble;
pub mod inspect;
pub mod package;
pub mod slide;
pub mod template;
pub mod writer;
mod xml;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use assemble::DeckAssembler;
pub use inspect::{DeckInspector, SlideSummary};
pub use package::Package;
pub use template::{TemplateInfo, TemplateStore};
pub use writer::DeckWriter;
