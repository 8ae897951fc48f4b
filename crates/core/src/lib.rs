//! Core domain types, outline extraction, slide layout, and image
//! normalization for topic-to-deck generation.

pub mod config;
pub mod error;
pub mod imaging;
pub mod layout;
pub mod naming;
pub mod outline;
pub mod types;

pub use config::{DeckOptions, ServiceConfig, TemplateSelection};
pub use error::{Error, Result};
pub use imaging::normalize_image;
pub use layout::{LayoutStyle, Side, SlideLayout, SlideSize, Zone};
pub use outline::{ContentShape, OrderingPolicy, OutlinePrompt};
pub use types::{
    Deck, DeckSlide, ImageFormat, ImageStyle, ResolvedImage, SlideContent, SlideDescriptor,
    MIN_SLIDE_COUNT,
};
