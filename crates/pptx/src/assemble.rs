//! Turns a [`Deck`] into a finished presentation.

use deckgen_core::{Deck, LayoutStyle, Result};

use crate::package::Package;
use crate::writer::DeckWriter;

/// Lays out a deck's slides on top of a template.
#[derive(Debug, Clone, Default)]
pub struct DeckAssembler {
    layout: LayoutStyle,
    subtitle: Option<String>,
}

impl DeckAssembler {
    pub fn new(layout: LayoutStyle) -> Self {
        Self {
            layout,
            subtitle: None,
        }
    }

    /// Text for the title slide's subtitle placeholder, if the layout has one.
    pub fn with_subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    /// Append a title slide and one content slide per deck entry.
    pub fn assemble(&self, deck: &Deck, template: Package) -> Result<Package> {
        let mut writer = DeckWriter::new(template)?;
        let size = writer.slide_size();

        writer.add_title_slide(deck.topic(), self.subtitle.as_deref())?;

        for (index, slide) in deck.slides().iter().enumerate() {
            let placement = self.layout.place(index, slide.image.is_some(), size);
            writer.add_content_slide(&slide.descriptor, slide.image.as_ref(), &placement)?;
        }

        log::info!(
            "Assembled {} slides ({} with images)",
            writer.added_slides(),
            deck.image_count()
        );
        Ok(writer.into_package())
    }
}
