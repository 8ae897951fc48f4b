//! Small XML helpers for reading and patching package parts.
//!
//! Parts are edited by splicing text at byte offsets found with a streaming
//! reader, so everything we do not touch stays byte-for-byte identical.

use deckgen_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PACKAGE_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub(crate) const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Escape text for element content and attribute values.
///
/// Control characters that XML 1.0 forbids are dropped.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

fn xml_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::XmlError(format!("{}: {}", context, e))
}

/// Attributes of one element keyed by their qualified name.
#[derive(Debug, Clone, Default)]
pub(crate) struct Attrs(HashMap<String, String>);

impl Attrs {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let mut map = HashMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| xml_error("bad attribute", e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error("bad attribute value", e))?
                .to_string();
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The namespaced relationship id (`r:id`), whatever its prefix.
    pub(crate) fn rel_id(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.contains(':') && local_name(k.as_bytes()) == b"id")
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Collect the attributes of every element with the given local name, in document order.
pub(crate) fn collect_elements(xml: &str, local: &str) -> Result<Vec<Attrs>> {
    let mut reader = Reader::from_str(xml);
    let mut found = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == local.as_bytes() =>
            {
                found.push(Attrs::from_start(e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&format!("scanning for <{}>", local), e)),
            _ => {}
        }
    }

    Ok(found)
}

/// Qualified name and attributes of the document element.
pub(crate) fn root_element(xml: &str) -> Result<(String, Attrs)> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                return Ok((name, Attrs::from_start(e)?));
            }
            Ok(Event::Eof) => return Err(Error::XmlError("document has no root element".into())),
            Err(e) => return Err(xml_error("reading root element", e)),
            _ => {}
        }
    }
}

/// Namespace prefix of the root element (`"p"` for `<p:presentation>`), if any.
pub(crate) fn root_prefix(xml: &str) -> Result<Option<String>> {
    let (name, _) = root_element(xml)?;
    Ok(name.split_once(':').map(|(prefix, _)| prefix.to_string()))
}

/// Byte offsets of the first element with a given local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ElementSpan {
    /// Offset of `<`.
    pub start: usize,
    /// Offset just past the closing `>` of the whole element.
    pub end: usize,
    /// Offset of the end tag, or `None` for a self-closing element.
    pub inner_end: Option<usize>,
}

/// Find the first element whose local name is `local`.
pub(crate) fn find_element(xml: &str, local: &str) -> Result<Option<ElementSpan>> {
    let mut reader = Reader::from_str(xml);
    let mut open: Option<(usize, usize)> = None;
    let mut depth = 0usize;

    loop {
        let before = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| xml_error(&format!("locating <{}>", local), e))?;
        let after = reader.buffer_position();

        match event {
            Event::Start(ref e) if local_name(e.name().as_ref()) == local.as_bytes() => {
                if open.is_none() {
                    open = Some((before, 0));
                } else {
                    depth += 1;
                }
            }
            Event::Empty(ref e)
                if open.is_none() && local_name(e.name().as_ref()) == local.as_bytes() =>
            {
                return Ok(Some(ElementSpan {
                    start: before,
                    end: after,
                    inner_end: None,
                }));
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == local.as_bytes() => {
                if let Some((start, _)) = open {
                    if depth == 0 {
                        return Ok(Some(ElementSpan {
                            start,
                            end: after,
                            inner_end: Some(before),
                        }));
                    }
                    depth -= 1;
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Insert `fragment` just before the end tag of the first `local` element.
pub(crate) fn append_child(xml: &str, local: &str, fragment: &str) -> Result<String> {
    let span = find_element(xml, local)?
        .ok_or_else(|| Error::XmlError(format!("<{}> not found", local)))?;

    let mut out = String::with_capacity(xml.len() + fragment.len() + 32);
    match span.inner_end {
        Some(pos) => {
            out.push_str(&xml[..pos]);
            out.push_str(fragment);
            out.push_str(&xml[pos..]);
        }
        None => {
            // Expand `<x .../>` into `<x ...>fragment</x>`.
            let tag = &xml[span.start..span.end];
            let open_tag = tag.trim_end_matches('>').trim_end_matches('/').trim_end();
            let name_end = open_tag[1..]
                .find(|c: char| c.is_whitespace())
                .map(|i| i + 1)
                .unwrap_or(open_tag.len());
            let name = &open_tag[1..name_end];
            out.push_str(&xml[..span.start]);
            out.push_str(open_tag);
            out.push('>');
            out.push_str(fragment);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
            out.push_str(&xml[span.end..]);
        }
    }
    Ok(out)
}

/// Insert `fragment` immediately before the start of the first `local` element.
pub(crate) fn insert_before(xml: &str, local: &str, fragment: &str) -> Result<Option<String>> {
    Ok(find_element(xml, local)?.map(|span| {
        let mut out = String::with_capacity(xml.len() + fragment.len());
        out.push_str(&xml[..span.start]);
        out.push_str(fragment);
        out.push_str(&xml[span.start..]);
        out
    }))
}

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Parse a relationships part.
pub(crate) fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    Ok(collect_elements(xml, "Relationship")?
        .into_iter()
        .filter_map(|attrs| {
            Some(Relationship {
                id: attrs.get("Id")?.to_string(),
                rel_type: attrs.get("Type")?.to_string(),
                target: attrs.get("Target")?.to_string(),
                external: attrs.get("TargetMode") == Some("External"),
            })
        })
        .collect())
}

/// Next free `rIdN` given the existing relationships.
pub(crate) fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

pub(crate) fn relationship_xml(id: &str, rel_type: &str, target: &str) -> String {
    format!(
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        escape_xml(id),
        escape_xml(rel_type),
        escape_xml(target)
    )
}

/// Path of the relationships part belonging to `part`.
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the part that owns it.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target of `to_part` written relative to the directory of `from_part`.
pub(crate) fn relative_target(from_part: &str, to_part: &str) -> String {
    let from_dir: Vec<&str> = match from_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to: Vec<&str> = to_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
    parts.extend(&to[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("bell\u{7}line\nnext"), "bellline\nnext");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slideMasters/slideMaster1.xml", "../slideLayouts/slideLayout1.xml"),
            "ppt/slideLayouts/slideLayout1.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide3.xml", "ppt/slideLayouts/slideLayout7.xml"),
            "../slideLayouts/slideLayout7.xml"
        );
        assert_eq!(relative_target("ppt/presentation.xml", "ppt/slides/slide3.xml"), "slides/slide3.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_next_rel_id() {
        let rels = parse_relationships(
            r#"<Relationships><Relationship Id="rId1" Type="t" Target="a"/><Relationship Id="rId7" Type="t" Target="b"/><Relationship Id="custom" Type="t" Target="c"/></Relationships>"#,
        )
        .unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(next_rel_id(&rels), "rId8");
        assert_eq!(next_rel_id(&[]), "rId1");
    }

    #[test]
    fn test_append_child_open_element() {
        let xml = r#"<p:presentation><p:sldIdLst><p:sldId id="256"/></p:sldIdLst></p:presentation>"#;
        let out = append_child(xml, "sldIdLst", r#"<p:sldId id="257"/>"#).unwrap();
        assert_eq!(
            out,
            r#"<p:presentation><p:sldIdLst><p:sldId id="256"/><p:sldId id="257"/></p:sldIdLst></p:presentation>"#
        );
    }

    #[test]
    fn test_append_child_self_closing() {
        let xml = r#"<root><p:sldIdLst/><tail/></root>"#;
        let out = append_child(xml, "sldIdLst", "<x/>").unwrap();
        assert_eq!(out, r#"<root><p:sldIdLst><x/></p:sldIdLst><tail/></root>"#);
    }

    #[test]
    fn test_append_child_nested_same_name() {
        let xml = "<a><a><b/></a></a>";
        let out = append_child(xml, "a", "<c/>").unwrap();
        assert_eq!(out, "<a><a><b/></a><c/></a>");
    }

    #[test]
    fn test_insert_before() {
        let xml = r#"<p:presentation><p:sldMasterIdLst/><p:sldSz cx="1" cy="2"/></p:presentation>"#;
        let out = insert_before(xml, "sldSz", "<p:sldIdLst/>").unwrap().unwrap();
        assert!(out.contains(r#"<p:sldMasterIdLst/><p:sldIdLst/><p:sldSz"#));
        assert!(insert_before(xml, "missing", "x").unwrap().is_none());
    }

    #[test]
    fn test_collect_elements_and_rel_id() {
        let xml = r#"<p:sldIdLst xmlns:r="x"><p:sldId id="256" r:id="rId2"/><p:sldId id="300" r:id="rId3"/></p:sldIdLst>"#;
        let ids = collect_elements(xml, "sldId").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].get_i64("id"), Some(300));
        assert_eq!(ids[1].rel_id(), Some("rId3"));
    }

    #[test]
    fn test_root_prefix() {
        assert_eq!(root_prefix("<?xml version=\"1.0\"?><p:sld/>").unwrap().as_deref(), Some("p"));
        assert_eq!(root_prefix("<Types/>").unwrap(), None);
    }
}
