//! Slide part XML generation.

use deckgen_core::{Error, Result, Zone};
use std::fmt::Write as FmtWrite;

use crate::template::Placeholder;
use crate::xml::{escape_xml, NS_DRAWING, NS_MAIN, NS_REL};

const HEADING_SIZE: u32 = 2800;
const BODY_SIZE: u32 = 1800;
const BULLET_MARGIN: i64 = 342_900;

fn fmt_err(e: std::fmt::Error) -> Error {
    Error::XmlError(e.to_string())
}

/// One paragraph inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paragraph<'a> {
    /// Bold slide heading.
    Heading(&'a str),
    /// Indented body text.
    Body(&'a str),
    /// Bulleted list entry.
    Bullet(&'a str),
}

/// Accumulates shapes for a single slide's shape tree.
#[derive(Debug)]
pub(crate) struct SlideBuilder {
    next_id: u32,
    shapes: String,
}

impl SlideBuilder {
    pub(crate) fn new() -> Self {
        // id 1 belongs to the group shape of the tree itself.
        Self {
            next_id: 2,
            shapes: String::with_capacity(2048),
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// A shape that inherits position and style from a layout placeholder.
    pub(crate) fn placeholder(&mut self, ph: &Placeholder, name: &str, text: &str) -> Result<()> {
        let id = self.take_id();
        let xml = &mut self.shapes;

        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="{} {}"/>"#, id, escape_xml(name), id - 1)
            .map_err(fmt_err)?;
        xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph"#);
        if let Some(kind) = &ph.kind {
            write!(xml, r#" type="{}""#, escape_xml(kind)).map_err(fmt_err)?;
        }
        if let Some(idx) = &ph.idx {
            write!(xml, r#" idx="{}""#, escape_xml(idx)).map_err(fmt_err)?;
        }
        xml.push_str("/></p:nvPr></p:nvSpPr><p:spPr/>");
        xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/><a:p>");
        write!(
            xml,
            r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#,
            escape_xml(text)
        )
        .map_err(fmt_err)?;
        xml.push_str("</a:p></p:txBody></p:sp>");
        Ok(())
    }

    /// A picture stretched to fill `zone`.
    pub(crate) fn picture(&mut self, rel_id: &str, zone: Zone, description: &str) -> Result<()> {
        let id = self.take_id();
        let xml = &mut self.shapes;

        xml.push_str("<p:pic><p:nvPicPr>");
        write!(
            xml,
            r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
            id,
            id - 1,
            escape_xml(description)
        )
        .map_err(fmt_err)?;
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        write!(
            xml,
            r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            escape_xml(rel_id)
        )
        .map_err(fmt_err)?;
        xml.push_str("<p:spPr>");
        write_xfrm(xml, zone)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        Ok(())
    }

    /// A word-wrapped text box that grows to fit its paragraphs.
    pub(crate) fn text_box(&mut self, zone: Zone, paragraphs: &[Paragraph<'_>]) -> Result<()> {
        let id = self.take_id();
        let xml = &mut self.shapes;

        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="TextBox {}"/>"#, id, id - 1).map_err(fmt_err)?;
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#);
        write_xfrm(xml, zone)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
        xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#);

        if paragraphs.is_empty() {
            xml.push_str("<a:p/>");
        }
        for paragraph in paragraphs {
            write_paragraph(xml, paragraph)?;
        }

        xml.push_str("</p:txBody></p:sp>");
        Ok(())
    }

    /// Wrap the collected shapes into a complete slide part.
    pub(crate) fn finish(self) -> String {
        let mut xml = String::with_capacity(self.shapes.len() + 1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str("\n<p:sld");
        for (prefix, ns) in [("a", NS_DRAWING), ("r", NS_REL), ("p", NS_MAIN)] {
            xml.push_str(" xmlns:");
            xml.push_str(prefix);
            xml.push_str("=\"");
            xml.push_str(ns);
            xml.push('"');
        }
        xml.push_str("><p:cSld><p:spTree>");
        xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
        xml.push_str(&self.shapes);
        xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
        xml
    }
}

fn write_xfrm(xml: &mut String, zone: Zone) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        zone.x, zone.y, zone.width, zone.height
    )
    .map_err(fmt_err)
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph<'_>) -> Result<()> {
    let (text, size, bold) = match paragraph {
        Paragraph::Heading(text) => {
            xml.push_str("<a:p>");
            (*text, HEADING_SIZE, true)
        }
        Paragraph::Body(text) => {
            xml.push_str(r#"<a:p><a:pPr lvl="1"/>"#);
            (*text, BODY_SIZE, false)
        }
        Paragraph::Bullet(text) => {
            write!(
                xml,
                r#"<a:p><a:pPr marL="{}" indent="-{}"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#,
                BULLET_MARGIN, BULLET_MARGIN
            )
            .map_err(fmt_err)?;
            (*text, BODY_SIZE, false)
        }
    };

    write!(xml, r#"<a:r><a:rPr lang="en-US" sz="{}""#, size).map_err(fmt_err)?;
    if bold {
        xml.push_str(r#" b="1""#);
    }
    write!(xml, r#" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape_xml(text)).map_err(fmt_err)?;
    Ok(())
}
