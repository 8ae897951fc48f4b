//! Reads a finished deck back: text and pictures per slide, in slide order.

use deckgen_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};

use crate::package::Package;
use crate::xml::{self, local_name, REL_SLIDE};

/// A text shape found on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeText {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Position and size of a picture on a slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PictureInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything we can see on one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSummary {
    /// 1-based slide number.
    pub number: usize,
    pub part: String,
    pub shapes: Vec<ShapeText>,
    pub pictures: Vec<PictureInfo>,
}

impl SlideSummary {
    /// Text of each shape, top-to-bottom then left-to-right.
    pub fn texts(&self) -> Vec<&str> {
        self.shapes.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Reader for generated (or any) PPTX decks.
pub struct DeckInspector;

impl DeckInspector {
    pub fn new() -> Self {
        Self
    }

    /// Summarize every slide of a PPTX file.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideSummary>> {
        self.read_package(&Package::open(reader)?)
    }

    pub fn read_package(&self, package: &Package) -> Result<Vec<SlideSummary>> {
        let presentation_part = package.main_part()?;
        let presentation = package.read_xml(&presentation_part)?;
        let rels = package.relationships(&presentation_part)?;

        let mut slides = Vec::new();
        for (idx, entry) in xml::collect_elements(&presentation, "sldId")?.iter().enumerate() {
            let rel_id = entry
                .rel_id()
                .ok_or_else(|| Error::XmlError("sldId without relationship id".into()))?;
            let rel = rels
                .iter()
                .find(|r| r.id == rel_id && r.rel_type == REL_SLIDE)
                .ok_or_else(|| Error::TemplateError(format!("dangling slide relationship {}", rel_id)))?;
            let part = xml::resolve_target(&presentation_part, &rel.target);
            let content = package.read_xml(&part)?;
            let (mut shapes, pictures) = extract_shapes_from_xml(&content)?;

            // Top-to-bottom, then left-to-right.
            shapes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

            slides.push(SlideSummary {
                number: idx + 1,
                part,
                shapes,
                pictures,
            });
        }

        Ok(slides)
    }
}

impl Default for DeckInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    is_picture: bool,
}

fn read_offset(e: &BytesStart, shape: &mut ShapeInfo) {
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
        match (local_name(e.name().as_ref()), attr.key.as_ref(), value) {
            (b"off", b"x", Some(v)) => shape.x = v,
            (b"off", b"y", Some(v)) => shape.y = v,
            (b"ext", b"cx", Some(v)) => shape.width = v,
            (b"ext", b"cy", Some(v)) => shape.height = v,
            _ => {}
        }
    }
}

/// Extract text shapes and pictures with their positions from slide XML.
fn extract_shapes_from_xml(xml_content: &str) -> Result<(Vec<ShapeText>, Vec<PictureInfo>)> {
    let mut shapes = Vec::new();
    let mut pictures = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut in_paragraph = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    current_shape = Some(ShapeInfo {
                        is_picture: local_name(e.name().as_ref()) == b"pic",
                        ..ShapeInfo::default()
                    });
                }
                b"p" if current_shape.is_some() => {
                    in_paragraph = true;
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(ref mut shape) = current_shape {
                    if matches!(local_name(e.name().as_ref()), b"off" | b"ext") {
                        read_offset(e, shape);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlError(format!("bad text: {}", err)))?;
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(mut shape) = current_shape.take() {
                        if shape.is_picture {
                            pictures.push(PictureInfo {
                                x: shape.x,
                                y: shape.y,
                                width: shape.width,
                                height: shape.height,
                            });
                        } else {
                            shape.text = current_text.trim().to_string();
                            if !shape.text.is_empty() {
                                shapes.push(ShapeText {
                                    text: shape.text,
                                    x: shape.x,
                                    y: shape.y,
                                });
                            }
                        }
                    }
                    current_text.clear();
                    in_paragraph = false;
                }
                b"p" => in_paragraph = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    Ok((shapes, pictures))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_and_pictures() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:pic><p:spPr><a:xfrm><a:off x="457200" y="914400"/><a:ext cx="4114800" cy="3657600"/></a:xfrm></p:spPr></p:pic>
            <p:sp><p:spPr><a:xfrm><a:off x="4572000" y="457200"/><a:ext cx="1" cy="1"/></a:xfrm></p:spPr>
              <p:txBody><a:p><a:r><a:t>Title &amp; more</a:t></a:r></a:p><a:p><a:r><a:t>Body</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:txBody><a:p/></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;

        let (shapes, pictures) = extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].text, "Title & more\nBody");
        assert_eq!(shapes[0].x, 4572000.0);
        assert_eq!(
            pictures,
            vec![PictureInfo { x: 457200.0, y: 914400.0, width: 4114800.0, height: 3657600.0 }]
        );
    }

    #[test]
    fn test_malformed_slide_is_error() {
        assert!(extract_shapes_from_xml("<p:sld><p:sp></p:sld>").is_err());
    }
}
