//! Appends generated slides to a template package.

use deckgen_core::{Error, ResolvedImage, Result, SlideContent, SlideDescriptor, SlideLayout, SlideSize, Zone};

use crate::package::Package;
use crate::slide::{Paragraph, SlideBuilder};
use crate::template::{LayoutInfo, TemplateInfo};
use crate::xml::{
    self, escape_xml, relationship_xml, CT_SLIDE, NS_PACKAGE_REL, NS_REL, REL_IMAGE, REL_SLIDE,
    REL_SLIDE_LAYOUT,
};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const FIRST_SLIDE_ID: i64 = 256;

/// Highest `N` among part names shaped like `{prefix}N{suffix}`.
fn max_numbered(names: impl Iterator<Item = impl AsRef<str>>, prefix: &str, suffix_start: char) -> u32 {
    names
        .filter_map(|name| {
            let rest = name.as_ref().strip_prefix(prefix)?;
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() || !rest[digits.len()..].starts_with(suffix_start) {
                return None;
            }
            digits.parse().ok()
        })
        .max()
        .unwrap_or(0)
}

/// Writes new slides into an in-memory template package.
///
/// Slides are append-only: once added, nothing here can change them.
#[derive(Debug)]
pub struct DeckWriter {
    package: Package,
    info: TemplateInfo,
    /// Directory holding the presentation part, e.g. `ppt`.
    base_dir: String,
    added: usize,
}

impl DeckWriter {
    /// Wrap a template package.
    pub fn new(package: Package) -> Result<Self> {
        let info = TemplateInfo::discover(&package)?;
        let base_dir = info
            .presentation_part
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();
        Ok(Self {
            package,
            info,
            base_dir,
            added: 0,
        })
    }

    pub fn slide_size(&self) -> SlideSize {
        self.info.slide_size
    }

    /// Number of slides appended so far.
    pub fn added_slides(&self) -> usize {
        self.added
    }

    fn part_path(&self, rest: &str) -> String {
        if self.base_dir.is_empty() {
            rest.to_string()
        } else {
            format!("{}/{}", self.base_dir, rest)
        }
    }

    /// Add the opening slide with the topic in the title placeholder.
    pub fn add_title_slide(&mut self, topic: &str, subtitle: Option<&str>) -> Result<()> {
        let layout = self.info.title_layout().clone();
        let mut builder = SlideBuilder::new();

        match layout.title_placeholder() {
            Some(ph) => builder.placeholder(ph, "Title", topic)?,
            None => {
                let size = self.info.slide_size;
                let zone = Zone {
                    x: size.width / 10,
                    y: size.height / 3,
                    width: size.width * 8 / 10,
                    height: size.height / 4,
                };
                builder.text_box(zone, &[Paragraph::Heading(topic)])?;
            }
        }

        if let (Some(text), Some(ph)) = (subtitle, layout.body_placeholder()) {
            builder.placeholder(ph, "Subtitle", text)?;
        }

        self.commit(builder, &layout, None)
    }

    /// Add one content slide with text and an optional picture.
    pub fn add_content_slide(
        &mut self,
        descriptor: &SlideDescriptor,
        image: Option<&ResolvedImage>,
        layout: &SlideLayout,
    ) -> Result<()> {
        let slide_layout = self.info.blank_layout().clone();
        let mut builder = SlideBuilder::new();

        let media = match (image, layout.image) {
            (Some(image), Some(zone)) => {
                builder.picture("rId2", zone, descriptor.title())?;
                Some(image)
            }
            _ => None,
        };

        let mut paragraphs = vec![Paragraph::Heading(descriptor.title())];
        match descriptor.content() {
            SlideContent::Paragraph(text) => paragraphs.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(Paragraph::Body),
            ),
            SlideContent::Bullets(items) => {
                paragraphs.extend(items.iter().map(|item| Paragraph::Bullet(item.as_str())))
            }
        }
        builder.text_box(layout.text, &paragraphs)?;

        self.commit(builder, &slide_layout, media)
    }

    /// Store the slide part, its relationships, media, and registrations.
    fn commit(&mut self, builder: SlideBuilder, layout: &LayoutInfo, image: Option<&ResolvedImage>) -> Result<()> {
        let slides_prefix = self.part_path("slides/slide");
        let number = max_numbered(self.package.part_names(), &slides_prefix, '.') + 1;
        let slide_part = format!("{}{}.xml", slides_prefix, number);

        let mut rels = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        rels.push_str("\n<Relationships xmlns=\"");
        rels.push_str(NS_PACKAGE_REL);
        rels.push_str("\">");
        rels.push_str(&relationship_xml(
            "rId1",
            REL_SLIDE_LAYOUT,
            &xml::relative_target(&slide_part, &layout.part),
        ));

        if let Some(image) = image {
            let media_prefix = self.part_path("media/image");
            let media_number = max_numbered(self.package.part_names(), &media_prefix, '.') + 1;
            let media_part = format!("{}{}.{}", media_prefix, media_number, image.format.extension());
            rels.push_str(&relationship_xml(
                "rId2",
                REL_IMAGE,
                &xml::relative_target(&slide_part, &media_part),
            ));
            self.register_default(image.format.extension(), image.format.mime_type())?;
            self.package.put(media_part, image.bytes.clone());
        }
        rels.push_str("</Relationships>");

        self.register_override(&slide_part, CT_SLIDE)?;
        self.package.put(xml::rels_path_for(&slide_part), rels.into_bytes());
        self.package.put(slide_part.clone(), builder.finish().into_bytes());
        self.register_slide(&slide_part)?;

        self.added += 1;
        log::debug!("Added {} using {}", slide_part, layout.part);
        Ok(())
    }

    fn register_default(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let types = self.package.read_xml(CONTENT_TYPES)?;
        let known = xml::collect_elements(&types, "Default")?
            .iter()
            .any(|d| d.get("Extension").is_some_and(|e| e.eq_ignore_ascii_case(extension)));
        if known {
            return Ok(());
        }
        let entry = format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape_xml(extension),
            escape_xml(content_type)
        );
        let updated = xml::append_child(&types, "Types", &entry)?;
        self.package.put(CONTENT_TYPES, updated.into_bytes());
        Ok(())
    }

    fn register_override(&mut self, part: &str, content_type: &str) -> Result<()> {
        let types = self.package.read_xml(CONTENT_TYPES)?;
        let entry = format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            escape_xml(part),
            escape_xml(content_type)
        );
        let updated = xml::append_child(&types, "Types", &entry)?;
        self.package.put(CONTENT_TYPES, updated.into_bytes());
        Ok(())
    }

    /// Link the slide from the presentation part and append it to `sldIdLst`.
    fn register_slide(&mut self, slide_part: &str) -> Result<()> {
        let presentation_part = self.info.presentation_part.clone();
        let rels_path = xml::rels_path_for(&presentation_part);

        let rels_xml = self.package.read_xml(&rels_path)?;
        let rel_id = xml::next_rel_id(&xml::parse_relationships(&rels_xml)?);
        let entry = relationship_xml(
            &rel_id,
            REL_SLIDE,
            &xml::relative_target(&presentation_part, slide_part),
        );
        let rels_xml = xml::append_child(&rels_xml, "Relationships", &entry)?;
        self.package.put(rels_path, rels_xml.into_bytes());

        let presentation = self.package.read_xml(&presentation_part)?;
        let slide_id = xml::collect_elements(&presentation, "sldId")?
            .iter()
            .filter_map(|attrs| attrs.get_i64("id"))
            .max()
            .map_or(FIRST_SLIDE_ID, |max| (max + 1).max(FIRST_SLIDE_ID));

        let (_, root) = xml::root_element(&presentation)?;
        let p = xml::root_prefix(&presentation)?;
        let qualify = |local: &str| match &p {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        let r = root_namespace_prefix(&root, NS_REL).unwrap_or_else(|| "r".to_string());
        let sld_id = format!(
            r#"<{} id="{}" {}:id="{}"/>"#,
            qualify("sldId"),
            slide_id,
            r,
            rel_id
        );

        let updated = if xml::find_element(&presentation, "sldIdLst")?.is_some() {
            xml::append_child(&presentation, "sldIdLst", &sld_id)?
        } else {
            let list = format!("<{0}>{1}</{0}>", qualify("sldIdLst"), sld_id);
            match xml::insert_before(&presentation, "sldSz", &list)? {
                Some(updated) => updated,
                None => xml::insert_before(&presentation, "notesSz", &list)?.ok_or_else(|| {
                    Error::TemplateError("presentation part has no place for a slide list".into())
                })?,
            }
        };
        self.package.put(presentation_part, updated.into_bytes());
        Ok(())
    }

    /// Release the package with all appended slides.
    pub fn into_package(self) -> Package {
        self.package
    }

    /// Serialize the finished deck.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }
}

/// Prefix bound to `namespace` by an `xmlns:prefix` attribute on the root.
fn root_namespace_prefix(root: &xml::Attrs, namespace: &str) -> Option<String> {
    root.iter()
        .find(|(key, value)| key.starts_with("xmlns:") && *value == namespace)
        .map(|(key, _)| key["xmlns:".len()..].to_string())
}
