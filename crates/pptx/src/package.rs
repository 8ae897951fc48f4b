//! In-memory view of a PPTX (OPC/ZIP) package.

use deckgen_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::xml::{self, Relationship, REL_OFFICE_DOCUMENT};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const PACKAGE_RELS: &str = "_rels/.rels";

/// All parts of a package, kept in their original archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl Package {
    /// Read every entry of a ZIP archive into memory.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self::default();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            package.put(name, data);
        }

        if !package.contains(CONTENT_TYPES) {
            return Err(Error::TemplateError(format!("missing {}", CONTENT_TYPES)));
        }
        Ok(package)
    }

    /// Open a package from a file on disk.
    pub fn open_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::open(std::io::BufReader::new(file)).map_err(|e| match e {
            Error::ZipError(msg) => Error::TemplateError(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.parts[i].1.as_slice())
    }

    /// Read a part as UTF-8 text.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        let data = self
            .get(name)
            .ok_or_else(|| Error::TemplateError(format!("part not found: {}", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::XmlError(format!("'{}' is not UTF-8: {}", name, e)))
    }

    /// Insert or replace a part. New parts go to the end of the archive.
    pub fn put(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.parts[i].1 = data,
            None => {
                self.index.insert(name.clone(), self.parts.len());
                self.parts.push((name, data));
            }
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Relationships of `part`, or an empty list when it has no rels part.
    pub(crate) fn relationships(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels_path = xml::rels_path_for(part);
        if !self.contains(&rels_path) {
            return Ok(Vec::new());
        }
        xml::parse_relationships(&self.read_xml(&rels_path)?)
    }

    /// Name of the main presentation part, from the package relationships.
    pub(crate) fn main_part(&self) -> Result<String> {
        let rels = xml::parse_relationships(&self.read_xml(PACKAGE_RELS)?)?;
        rels.iter()
            .find(|r| r.rel_type == REL_OFFICE_DOCUMENT)
            .map(|r| xml::resolve_target("", &r.target))
            .ok_or_else(|| Error::TemplateError("package has no officeDocument relationship".into()))
    }

    /// Serialize the package back into ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // The content types part must come first.
        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name == CONTENT_TYPES)
            .chain(self.parts.iter().filter(|(name, _)| name != CONTENT_TYPES));

        for (name, data) in ordered {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            writer
                .write_all(data)
                .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::minimal_template;

    #[test]
    fn test_open_reads_all_parts() {
        let package = Package::open(Cursor::new(minimal_template())).unwrap();
        assert!(package.contains("[Content_Types].xml"));
        assert!(package.contains("ppt/presentation.xml"));
        assert_eq!(package.main_part().unwrap(), "ppt/presentation.xml");
    }

    #[test]
    fn test_round_trip_preserves_parts() {
        let mut package = Package::open(Cursor::new(minimal_template())).unwrap();
        package.put("ppt/media/image1.png", vec![1, 2, 3]);
        let reopened = Package::open(Cursor::new(package.to_bytes().unwrap())).unwrap();

        let before: Vec<_> = package.part_names().collect();
        let after: Vec<_> = reopened.part_names().collect();
        assert_eq!(before, after);
        assert_eq!(reopened.get("ppt/media/image1.png"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let err = Package::open(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_relationships_missing_rels_is_empty() {
        let package = Package::open(Cursor::new(minimal_template())).unwrap();
        assert!(package.relationships("ppt/theme/theme1.xml").unwrap().is_empty());
    }
}
