//! Template discovery: slide size, slide layouts, and the template directory.

use deckgen_core::{Error, Result, SlideSize};
use std::path::{Path, PathBuf};

use crate::package::Package;
use crate::xml::{self, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER};

/// Index of the title layout in a standard Office master.
pub const TITLE_LAYOUT_INDEX: usize = 0;
/// Index of the blank layout in a standard Office master.
pub const BLANK_LAYOUT_INDEX: usize = 6;

/// A placeholder declared on a slide layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// `type` attribute; OOXML treats a missing type as `body`.
    pub kind: Option<String>,
    pub idx: Option<String>,
}

impl Placeholder {
    pub fn is_title(&self) -> bool {
        matches!(self.kind.as_deref(), Some("title") | Some("ctrTitle"))
    }

    /// Body-like placeholders that can carry a subtitle.
    pub fn is_body(&self) -> bool {
        matches!(
            self.kind.as_deref(),
            None | Some("body") | Some("subTitle") | Some("obj")
        )
    }
}

/// One slide layout of the template's master.
#[derive(Debug, Clone)]
pub struct LayoutInfo {
    /// Part name, e.g. `ppt/slideLayouts/slideLayout7.xml`.
    pub part: String,
    /// Root `type` attribute (`title`, `blank`, ...).
    pub kind: Option<String>,
    pub placeholders: Vec<Placeholder>,
}

impl LayoutInfo {
    pub fn title_placeholder(&self) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.is_title())
    }

    pub fn body_placeholder(&self) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.is_body())
    }
}

/// What the writer needs to know about a template package.
#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub presentation_part: String,
    pub slide_size: SlideSize,
    /// Layouts in the master's `sldLayoutIdLst` order.
    pub layouts: Vec<LayoutInfo>,
}

impl TemplateInfo {
    /// Inspect a package's presentation, first master, and its layouts.
    pub fn discover(package: &Package) -> Result<Self> {
        let presentation_part = package.main_part()?;
        let presentation_xml = package.read_xml(&presentation_part)?;

        let slide_size = xml::collect_elements(&presentation_xml, "sldSz")?
            .first()
            .and_then(|attrs| {
                Some(SlideSize {
                    width: attrs.get_i64("cx")?,
                    height: attrs.get_i64("cy")?,
                })
            })
            .unwrap_or_default();

        let master_part = package
            .relationships(&presentation_part)?
            .into_iter()
            .find(|r| r.rel_type == REL_SLIDE_MASTER)
            .map(|r| xml::resolve_target(&presentation_part, &r.target))
            .ok_or_else(|| Error::TemplateError("template has no slide master".into()))?;

        let master_xml = package.read_xml(&master_part)?;
        let master_rels = package.relationships(&master_part)?;

        let mut layouts = Vec::new();
        for entry in xml::collect_elements(&master_xml, "sldLayoutId")? {
            let Some(rel_id) = entry.rel_id() else {
                continue;
            };
            let Some(rel) = master_rels
                .iter()
                .find(|r| r.id == rel_id && r.rel_type == REL_SLIDE_LAYOUT)
            else {
                log::warn!("Layout relationship {} missing from {}", rel_id, master_part);
                continue;
            };
            let part = xml::resolve_target(&master_part, &rel.target);
            layouts.push(Self::read_layout(package, part)?);
        }

        if layouts.is_empty() {
            return Err(Error::TemplateError(format!("{} declares no slide layouts", master_part)));
        }

        log::debug!(
            "Template has {} layouts, slide size {}x{} EMU",
            layouts.len(),
            slide_size.width,
            slide_size.height
        );

        Ok(Self {
            presentation_part,
            slide_size,
            layouts,
        })
    }

    fn read_layout(package: &Package, part: String) -> Result<LayoutInfo> {
        let layout_xml = package.read_xml(&part)?;
        let (_, root) = xml::root_element(&layout_xml)?;
        let placeholders = xml::collect_elements(&layout_xml, "ph")?
            .into_iter()
            .map(|attrs| Placeholder {
                kind: attrs.get("type").map(str::to_string),
                idx: attrs.get("idx").map(str::to_string),
            })
            .collect();

        Ok(LayoutInfo {
            part,
            kind: root.get("type").map(str::to_string),
            placeholders,
        })
    }

    /// Layout at `index`, else the first layout of type `kind`, else `fallback`.
    fn pick<'a>(&'a self, index: usize, kind: &str, fallback: &'a LayoutInfo) -> &'a LayoutInfo {
        self.layouts
            .get(index)
            .or_else(|| self.layouts.iter().find(|l| l.kind.as_deref() == Some(kind)))
            .unwrap_or(fallback)
    }

    /// Layout used for the topic title slide.
    pub fn title_layout(&self) -> &LayoutInfo {
        self.pick(TITLE_LAYOUT_INDEX, "title", &self.layouts[0])
    }

    /// Layout used for content slides.
    pub fn blank_layout(&self) -> &LayoutInfo {
        let last = &self.layouts[self.layouts.len() - 1];
        self.pick(BLANK_LAYOUT_INDEX, "blank", last)
    }
}

/// A directory of `.pptx` template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All `.pptx` files in the directory, sorted by file name.
    ///
    /// A missing or empty directory is a [`Error::NoTemplates`] error.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoTemplates(self.dir.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut templates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_pptx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
            // Skip Office lock files like "~$deck.pptx".
            let is_lock = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("~$"));
            if is_pptx && !is_lock && path.is_file() {
                templates.push(path);
            }
        }

        if templates.is_empty() {
            return Err(Error::NoTemplates(self.dir.clone()));
        }
        templates.sort();
        Ok(templates)
    }

    /// Pick one template uniformly at random.
    pub fn choose_random(&self) -> Result<PathBuf> {
        let mut templates = self.list()?;
        let pick = rand::random_range(0..templates.len());
        Ok(templates.swap_remove(pick))
    }
}

/// Display name for a template path, as shown in selection menus.
pub fn template_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
