//! Per-slide image resolution: search, download, normalize.
//!
//! Every failure here degrades to "no image for this slide". Skips are logged
//! at `warn` and never surface as errors.

use deckgen_core::{normalize_image, ImageStyle, ResolvedImage};

use crate::fetch::ImageFetch;
use crate::search::ImageSearch;

const QUALITY_KEYWORDS: &str = "high quality realistic professional";

/// Build the search query for one slide.
pub fn build_query(topic: &str, subtopic: &str, style: Option<ImageStyle>) -> String {
    let mut terms = vec![topic.trim(), subtopic.trim()];
    if let Some(style) = style {
        terms.push(style.as_str());
    }
    terms.push(QUALITY_KEYWORDS);
    terms.retain(|t| !t.is_empty());
    terms.join(" ")
}

pub struct ImageResolver<'a> {
    search: &'a dyn ImageSearch,
    fetcher: &'a dyn ImageFetch,
    candidates: u8,
}

impl<'a> ImageResolver<'a> {
    pub fn new(search: &'a dyn ImageSearch, fetcher: &'a dyn ImageFetch, candidates: u8) -> Self {
        Self {
            search,
            fetcher,
            candidates,
        }
    }

    /// First candidate that downloads, declares an image type, and decodes.
    pub async fn resolve(
        &self,
        topic: &str,
        subtopic: &str,
        style: Option<ImageStyle>,
    ) -> Option<ResolvedImage> {
        if self.candidates == 0 {
            return None;
        }
        let query = build_query(topic, subtopic, style);

        let urls = match self.search.search(&query, self.candidates).await {
            Ok(urls) => urls,
            Err(e) => {
                log::warn!("Image search failed for '{}': {}", subtopic, e);
                return None;
            }
        };
        if urls.is_empty() {
            log::warn!("No image results for '{}'", subtopic);
            return None;
        }

        for url in urls.iter().take(usize::from(self.candidates)) {
            let fetched = match self.fetcher.fetch(url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    log::warn!("Skipping image {}: {}", url, e);
                    continue;
                }
            };
            if !fetched.is_image() {
                log::warn!(
                    "Skipping image {}: content type {:?} is not an image",
                    url,
                    fetched.content_type
                );
                continue;
            }
            match normalize_image(&fetched.bytes) {
                Ok(image) => {
                    log::debug!("Resolved image for '{}' from {}", subtopic, url);
                    return Some(image);
                }
                Err(e) => log::warn!("Skipping image {}: {}", url, e),
            }
        }

        log::warn!("No usable image for '{}'", subtopic);
        None
    }
}
