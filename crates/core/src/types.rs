//! Domain types for slide descriptors, resolved images, and decks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Minimum number of content slides (introduction, one body slide, conclusion).
pub const MIN_SLIDE_COUNT: usize = 3;

/// One slide's title, content, and image-style hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDescriptor {
    title: String,
    content: SlideContent,
    image_style: ImageStyle,
}

impl SlideDescriptor {
    /// Create a descriptor, rejecting an empty title or empty content.
    pub fn new(
        title: impl Into<String>,
        content: SlideContent,
        image_style: ImageStyle,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() || content.is_empty() {
            return None;
        }
        Some(Self {
            title,
            content,
            image_style,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &SlideContent {
        &self.content
    }

    pub fn image_style(&self) -> ImageStyle {
        self.image_style
    }
}

/// Slide body text: a single paragraph or an ordered list of bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideContent {
    Paragraph(String),
    Bullets(Vec<String>),
}

impl SlideContent {
    /// Build bullet content, dropping blank entries.
    pub fn bullets<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Bullets(
            items
                .into_iter()
                .map(|s| s.into().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Paragraph(text) => text.trim().is_empty(),
            Self::Bullets(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// Kind of illustration requested for a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    Diagram,
    Illustration,
    Chart,
    Photo,
    #[default]
    Concept,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 5] = [
        Self::Diagram,
        Self::Illustration,
        Self::Chart,
        Self::Photo,
        Self::Concept,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diagram => "diagram",
            Self::Illustration => "illustration",
            Self::Chart => "chart",
            Self::Photo => "photo",
            Self::Concept => "concept",
        }
    }

    /// Parse a tag from model output; unknown tags fall back to `Concept`.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == needle)
            .ok_or_else(|| Error::ConfigError(format!("unknown image type '{}'", s)))
    }
}

/// Raster formats that can be embedded in a presentation as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// File extension used for the media part.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Display-ready image bytes for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// A descriptor paired with its image, if one was found.
#[derive(Debug, Clone)]
pub struct DeckSlide {
    pub descriptor: SlideDescriptor,
    pub image: Option<ResolvedImage>,
}

/// Ordered slides for one topic. Slides can only be appended.
#[derive(Debug, Clone)]
pub struct Deck {
    topic: String,
    slides: Vec<DeckSlide>,
}

impl Deck {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            slides: Vec::new(),
        }
    }

    pub fn push(&mut self, descriptor: SlideDescriptor, image: Option<ResolvedImage>) {
        self.slides.push(DeckSlide { descriptor, image });
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn slides(&self) -> &[DeckSlide] {
        &self.slides
    }

    /// Number of slides that carry an image.
    pub fn image_count(&self) -> usize {
        self.slides.iter().filter(|s| s.image.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_rejects_blank_fields() {
        let content = SlideContent::Paragraph("Body".into());
        assert!(SlideDescriptor::new("  ", content.clone(), ImageStyle::Photo).is_none());
        assert!(SlideDescriptor::new(
            "Title",
            SlideContent::Paragraph(" ".into()),
            ImageStyle::Photo
        )
        .is_none());
        assert!(SlideDescriptor::new("Title", SlideContent::bullets([" ", ""]), ImageStyle::Photo)
            .is_none());

        let slide = SlideDescriptor::new(" Title ", content, ImageStyle::Photo).unwrap();
        assert_eq!(slide.title(), "Title");
    }

    #[test]
    fn test_image_style_tags() {
        assert_eq!(ImageStyle::from_tag("Diagram"), ImageStyle::Diagram);
        assert_eq!(ImageStyle::from_tag(" chart "), ImageStyle::Chart);
        assert_eq!(ImageStyle::from_tag("infographic"), ImageStyle::Concept);
        assert!("infographic".parse::<ImageStyle>().is_err());
    }

    #[test]
    fn test_deck_preserves_order() {
        let mut deck = Deck::new("Topic");
        for title in ["One", "Two", "Three"] {
            let d = SlideDescriptor::new(
                title,
                SlideContent::Paragraph("x".into()),
                ImageStyle::Concept,
            )
            .unwrap();
            deck.push(d, None);
        }
        let titles: Vec<_> = deck.slides().iter().map(|s| s.descriptor.title()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(deck.image_count(), 0);
    }
}
