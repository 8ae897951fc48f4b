//! A minimal Office-style template for tests: one master, seven layouts, no slides.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::xml::{NS_DRAWING, NS_MAIN, NS_PACKAGE_REL, NS_REL, REL_OFFICE_DOCUMENT, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER};

const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Layout types in the order of the default Office master.
const LAYOUTS: [(&str, &str); 7] = [
    ("title", "Title Slide"),
    ("obj", "Title and Content"),
    ("secHead", "Section Header"),
    ("twoObj", "Two Content"),
    ("twoTxTwoObj", "Comparison"),
    ("titleOnly", "Title Only"),
    ("blank", "Blank"),
];

fn rels(entries: &[(String, &str, String)]) -> String {
    let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_DECL, NS_PACKAGE_REL);
    for (id, rel_type, target) in entries {
        xml.push_str(&format!(r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#, id, rel_type, target));
    }
    xml.push_str("</Relationships>");
    xml
}

fn placeholder(id: u32, name: &str, ph: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody></p:sp>"#
    )
}

fn layout(kind: &str, name: &str) -> String {
    let shapes = match kind {
        "title" => [
            placeholder(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#),
            placeholder(3, "Subtitle 2", r#"<p:ph type="subTitle" idx="1"/>"#),
            placeholder(4, "Date Placeholder 3", r#"<p:ph type="dt" sz="half" idx="10"/>"#),
        ]
        .concat(),
        "blank" => placeholder(2, "Date Placeholder 1", r#"<p:ph type="dt" sz="half" idx="10"/>"#),
        "titleOnly" => placeholder(2, "Title 1", r#"<p:ph type="title"/>"#),
        _ => [
            placeholder(2, "Title 1", r#"<p:ph type="title"/>"#),
            placeholder(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#),
        ]
        .concat(),
    };
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_DRAWING}" xmlns:r="{NS_REL}" xmlns:p="{NS_MAIN}" type="{kind}" preserve="1"><p:cSld name="{name}"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn master() -> String {
    let ids: String = (0..LAYOUTS.len())
        .map(|i| format!(r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, 2147483649u64 + i as u64, i + 1))
        .collect();
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_DRAWING}" xmlns:r="{NS_REL}" xmlns:p="{NS_MAIN}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{ids}</p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn theme() -> String {
    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_DRAWING}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#
    )
}

fn content_types() -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#
    );
    for i in 1..=LAYOUTS.len() {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slideLayouts/slideLayout{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// Parts of the template, `[Content_Types].xml` first.
fn parts() -> Vec<(String, String)> {
    let mut parts = vec![
        ("[Content_Types].xml".to_string(), content_types()),
        (
            "_rels/.rels".to_string(),
            rels(&[("rId1".into(), REL_OFFICE_DOCUMENT, "ppt/presentation.xml".into())]),
        ),
        (
            "ppt/presentation.xml".to_string(),
            format!(
                r#"{XML_DECL}<p:presentation xmlns:a="{NS_DRAWING}" xmlns:r="{NS_REL}" xmlns:p="{NS_MAIN}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
            ),
        ),
        (
            "ppt/_rels/presentation.xml.rels".to_string(),
            rels(&[
                ("rId1".into(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".into()),
                ("rId2".into(), REL_THEME, "theme/theme1.xml".into()),
            ]),
        ),
        ("ppt/slideMasters/slideMaster1.xml".to_string(), master()),
    ];

    let mut master_rels: Vec<(String, &str, String)> = (1..=LAYOUTS.len())
        .map(|i| (format!("rId{}", i), REL_SLIDE_LAYOUT, format!("../slideLayouts/slideLayout{}.xml", i)))
        .collect();
    master_rels.push((format!("rId{}", LAYOUTS.len() + 1), REL_THEME, "../theme/theme1.xml".into()));
    parts.push(("ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(), rels(&master_rels)));

    for (i, (kind, name)) in LAYOUTS.iter().enumerate() {
        parts.push((format!("ppt/slideLayouts/slideLayout{}.xml", i + 1), layout(kind, name)));
        parts.push((
            format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", i + 1),
            rels(&[("rId1".into(), REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml".into())]),
        ));
    }

    parts.push(("ppt/theme/theme1.xml".to_string(), theme()));
    parts
}

/// Bytes of a minimal `.pptx` template.
pub fn minimal_template() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for (name, content) in parts() {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
