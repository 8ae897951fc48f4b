//! Outline prompting and structured-output extraction.
//!
//! The completion service answers in free text that may wrap the JSON payload
//! in commentary or code fences. Extraction takes the widest `[...]` span,
//! decodes it, and keeps only the elements that look like slides.

use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::{ImageStyle, SlideContent, SlideDescriptor, MIN_SLIDE_COUNT};

/// Greedy match from the first `[` to the last `]`, across newlines.
static JSON_ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

const INTRODUCTION: &str = "introduction";
const CONCLUSION: &str = "conclusion";

/// Shape of the content the model is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentShape {
    #[default]
    Paragraph,
    Bullets,
}

impl FromStr for ContentShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "paragraph" => Ok(Self::Paragraph),
            "bullets" | "bullet" => Ok(Self::Bullets),
            other => Err(Error::ConfigError(format!("unknown content shape '{}'", other))),
        }
    }
}

impl fmt::Display for ContentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paragraph => "paragraph",
            Self::Bullets => "bullets",
        })
    }
}

/// How returned slides are ordered before assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Keep the order the model produced.
    Preserve,
    /// Pull "Introduction" to the front and "Conclusion" to the back.
    #[default]
    IntroConclusion,
}

impl FromStr for OrderingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "intro-conclusion" => Ok(Self::IntroConclusion),
            other => Err(Error::ConfigError(format!("unknown ordering policy '{}'", other))),
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preserve => "preserve",
            Self::IntroConclusion => "intro-conclusion",
        })
    }
}

/// Check that a slide count leaves room for introduction and conclusion.
pub fn validate_slide_count(count: usize) -> Result<()> {
    if count < MIN_SLIDE_COUNT {
        return Err(Error::InvalidSlideCount {
            requested: count,
            min: MIN_SLIDE_COUNT,
        });
    }
    Ok(())
}

/// Builds the instruction sent to the completion service.
#[derive(Debug, Clone)]
pub struct OutlinePrompt<'a> {
    topic: &'a str,
    count: usize,
    shape: ContentShape,
}

impl<'a> OutlinePrompt<'a> {
    pub fn new(topic: &'a str, count: usize) -> Self {
        Self {
            topic,
            count,
            shape: ContentShape::default(),
        }
    }

    pub fn with_shape(mut self, shape: ContentShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn render(&self) -> String {
        let middle = self.count.saturating_sub(2);
        let styles = ImageStyle::ALL
            .iter()
            .map(|s| format!("\"{}\"", s))
            .collect::<Vec<_>>()
            .join(", ");
        let (content_rule, content_example) = match self.shape {
            ContentShape::Paragraph => (
                "\"content\": a short paragraph of slide text",
                "\"Slide content...\"".to_string(),
            ),
            ContentShape::Bullets => (
                "\"content\": an array of 3 to 5 concise bullet point strings",
                "[\"First point\", \"Second point\", \"Third point\"]".to_string(),
            ),
        };

        format!(
            r#"You are an expert presentation assistant.

Generate a JSON list of {count} slides on the topic: "{topic}", structured as follows:
1. "Introduction" - a slide introducing the topic
2. {middle} subtopic slides (subtopics relevant to the topic)
3. "Conclusion" - a summary or concluding slide

Each slide must include:
- "title"
- {content_rule}
- "image_type": choose from [{styles}]

Format:
[
  {{
    "title": "Slide Title",
    "content": {content_example},
    "image_type": "diagram"
  }}
]

Only return valid JSON. No commentary.
"#,
            count = self.count,
            topic = self.topic,
        )
    }
}

/// Locate the widest `[...]` span in `text` and decode it as a JSON array.
///
/// Returns an empty vector when there is no span or it does not decode.
pub fn extract_json_array(text: &str) -> Vec<serde_json::Value> {
    let Some(found) = JSON_ARRAY_REGEX.find(text) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<serde_json::Value>>(found.as_str()) {
        Ok(values) => values,
        Err(e) => {
            log::debug!("Candidate JSON array did not decode: {}", e);
            Vec::new()
        }
    }
}

#[derive(Deserialize)]
struct RawSlide {
    title: Option<String>,
    content: Option<RawContent>,
    image_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Items(Vec<serde_json::Value>),
}

impl RawContent {
    fn into_content(self) -> SlideContent {
        match self {
            Self::Text(text) => SlideContent::Paragraph(text.trim().to_string()),
            Self::Items(items) => SlideContent::bullets(items.into_iter().filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })),
        }
    }
}

/// Convert decoded JSON values into descriptors, dropping malformed entries.
pub fn parse_descriptors(values: Vec<serde_json::Value>) -> Vec<SlideDescriptor> {
    let total = values.len();
    let slides: Vec<SlideDescriptor> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawSlide>(value).ok())
        .filter_map(|raw| {
            let style = raw
                .image_type
                .as_deref()
                .map(ImageStyle::from_tag)
                .unwrap_or_default();
            SlideDescriptor::new(raw.title?, raw.content?.into_content(), style)
        })
        .collect();

    if slides.len() < total {
        log::debug!("Dropped {} malformed slide(s)", total - slides.len());
    }
    slides
}

/// Extract and parse slides from a raw completion in one step.
pub fn parse_outline(text: &str) -> Vec<SlideDescriptor> {
    parse_descriptors(extract_json_array(text))
}

fn title_is(slide: &SlideDescriptor, name: &str) -> bool {
    slide.title().trim().eq_ignore_ascii_case(name)
}

/// Apply an ordering policy to the returned slides.
///
/// With [`OrderingPolicy::IntroConclusion`], the first slide titled
/// "Introduction" moves to the front and the first titled "Conclusion" moves
/// to the back. A missing title leaves the positional slide in that role.
pub fn order_slides(mut slides: Vec<SlideDescriptor>, policy: OrderingPolicy) -> Vec<SlideDescriptor> {
    if policy == OrderingPolicy::Preserve || slides.len() < 2 {
        return slides;
    }

    if let Some(pos) = slides.iter().position(|s| title_is(s, INTRODUCTION)) {
        let intro = slides.remove(pos);
        slides.insert(0, intro);
    }

    if let Some(pos) = slides.iter().position(|s| title_is(s, CONCLUSION)) {
        let conclusion = slides.remove(pos);
        slides.push(conclusion);
    }

    slides
}

/// Trim surplus slides down to `count`.
///
/// Under [`OrderingPolicy::IntroConclusion`] the last slide (the conclusion)
/// survives and the surplus is cut from the middle.
pub fn fit_to_count(
    mut slides: Vec<SlideDescriptor>,
    count: usize,
    policy: OrderingPolicy,
) -> Vec<SlideDescriptor> {
    if slides.len() <= count {
        return slides;
    }
    log::debug!("Model returned {} slides, keeping {}", slides.len(), count);
    match policy {
        OrderingPolicy::Preserve => slides.truncate(count),
        OrderingPolicy::IntroConclusion => {
            let last = slides.pop();
            slides.truncate(count.saturating_sub(1));
            slides.extend(last);
        }
    }
    slides
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn titles(slides: &[SlideDescriptor]) -> Vec<&str> {
        slides.iter().map(|s| s.title()).collect()
    }

    fn slide(title: &str) -> SlideDescriptor {
        SlideDescriptor::new(title, SlideContent::Paragraph("x".into()), ImageStyle::Concept).unwrap()
    }

    #[test]
    fn test_extract_array_with_commentary() {
        let text = "Sure! Here you go:\n```json\n[\n {\"title\": \"A\", \"content\": \"B\"}\n]\n```\nEnjoy.";
        let values = extract_json_array(text);
        assert_eq!(values, vec![json!({"title": "A", "content": "B"})]);
    }

    #[test]
    fn test_extract_bare_array() {
        let values = extract_json_array(r#"[1, 2, 3]"#);
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_extract_without_array_is_empty() {
        assert!(extract_json_array("no json here").is_empty());
        assert!(extract_json_array("{\"title\": \"object only\"}").is_empty());
        assert!(extract_json_array("").is_empty());
    }

    #[test]
    fn test_extract_malformed_array_is_empty() {
        assert!(extract_json_array("[{\"title\": \"A\",]").is_empty());
        assert!(extract_json_array("] backwards [").is_empty());
        // Greedy span covers both bracketed regions, which is not valid JSON.
        assert!(extract_json_array("[note] then [1, 2]").is_empty());
    }

    #[test]
    fn test_parse_keeps_fields_verbatim() {
        let text = r#"[
            {"title": "Introduction", "content": "What it is.", "image_type": "photo"},
            {"title": "Light Reactions", "content": "Chlorophyll absorbs light.", "image_type": "diagram"},
            {"title": "Conclusion", "content": "Summary.", "image_type": "chart"}
        ]"#;
        let slides = parse_outline(text);
        assert_eq!(titles(&slides), vec!["Introduction", "Light Reactions", "Conclusion"]);
        assert_eq!(
            slides[1].content(),
            &SlideContent::Paragraph("Chlorophyll absorbs light.".into())
        );
        assert_eq!(slides[1].image_style(), ImageStyle::Diagram);
        assert_eq!(slides[2].image_style(), ImageStyle::Chart);
    }

    #[test]
    fn test_parse_drops_incomplete_entries() {
        let values = vec![
            json!({"title": "Keep", "content": "Body"}),
            json!({"title": "No content"}),
            json!({"content": "No title"}),
            json!({"title": "", "content": "Empty title"}),
            json!("not an object"),
            json!({"title": 5, "content": "Wrong type"}),
        ];
        let slides = parse_descriptors(values);
        assert_eq!(titles(&slides), vec!["Keep"]);
        assert_eq!(slides[0].image_style(), ImageStyle::Concept);
    }

    #[test]
    fn test_parse_bullet_content() {
        let values = vec![json!({
            "title": "Steps",
            "content": ["Absorb light", "", "Split water", 3],
            "image_type": "illustration"
        })];
        let slides = parse_descriptors(values);
        assert_eq!(
            slides[0].content(),
            &SlideContent::Bullets(vec!["Absorb light".into(), "Split water".into(), "3".into()])
        );
    }

    #[test]
    fn test_order_moves_intro_and_conclusion() {
        let slides = vec![slide("Middle"), slide(" conclusion "), slide("INTRODUCTION"), slide("Other")];
        let ordered = order_slides(slides, OrderingPolicy::IntroConclusion);
        assert_eq!(titles(&ordered), vec!["INTRODUCTION", "Middle", "Other", "conclusion"]);
    }

    #[test]
    fn test_order_falls_back_to_position() {
        let slides = vec![slide("Overview"), slide("Details"), slide("Wrap-up")];
        let ordered = order_slides(slides, OrderingPolicy::IntroConclusion);
        assert_eq!(titles(&ordered), vec!["Overview", "Details", "Wrap-up"]);
    }

    #[test]
    fn test_order_preserve_is_identity() {
        let slides = vec![slide("Conclusion"), slide("Introduction")];
        let ordered = order_slides(slides, OrderingPolicy::Preserve);
        assert_eq!(titles(&ordered), vec!["Conclusion", "Introduction"]);
    }

    #[test]
    fn test_fit_to_count() {
        let make = || vec![slide("Introduction"), slide("A"), slide("B"), slide("C"), slide("Conclusion")];
        assert_eq!(
            titles(&fit_to_count(make(), 3, OrderingPolicy::IntroConclusion)),
            vec!["Introduction", "A", "Conclusion"]
        );
        assert_eq!(titles(&fit_to_count(make(), 3, OrderingPolicy::Preserve)), vec!["Introduction", "A", "B"]);
        assert_eq!(fit_to_count(make(), 9, OrderingPolicy::Preserve).len(), 5);
    }

    #[test]
    fn test_prompt_mentions_counts_and_shape() {
        let prompt = OutlinePrompt::new("Photosynthesis", 5)
            .with_shape(ContentShape::Bullets)
            .render();
        assert!(prompt.contains("JSON list of 5 slides"));
        assert!(prompt.contains("\"Photosynthesis\""));
        assert!(prompt.contains("3 subtopic slides"));
        assert!(prompt.contains("bullet point strings"));
        assert!(prompt.contains("\"concept\""));
    }

    #[test]
    fn test_validate_slide_count() {
        assert!(validate_slide_count(3).is_ok());
        assert!(matches!(
            validate_slide_count(2),
            Err(Error::InvalidSlideCount { requested: 2, min: 3 })
        ));
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("Bullets".parse::<ContentShape>().unwrap(), ContentShape::Bullets);
        assert_eq!(
            "intro-conclusion".parse::<OrderingPolicy>().unwrap(),
            OrderingPolicy::IntroConclusion
        );
        assert!("sideways".parse::<OrderingPolicy>().is_err());
    }
}
