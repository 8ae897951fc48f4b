//! The topic-to-deck pipeline: outline, images, assembly, write.

use deckgen_core::naming::output_file_name;
use deckgen_core::{Deck, DeckOptions, Error, Result};
use deckgen_pptx::{DeckAssembler, Package};
use deckgen_services::{ImageFetch, ImageResolver, ImageSearch, OutlineGenerator, TextCompletion};
use std::path::{Path, PathBuf};

/// What to generate.
#[derive(Debug, Clone)]
pub struct DeckRequest {
    pub topic: String,
    pub slide_count: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_path: PathBuf,
    /// Content slides, not counting the title slide.
    pub slides: usize,
    pub images: usize,
}

pub struct Pipeline<'a> {
    completion: &'a dyn TextCompletion,
    search: Option<&'a dyn ImageSearch>,
    fetcher: &'a dyn ImageFetch,
    options: &'a DeckOptions,
}

impl<'a> Pipeline<'a> {
    /// `search` is `None` when image search is not configured.
    pub fn new(
        completion: &'a dyn TextCompletion,
        search: Option<&'a dyn ImageSearch>,
        fetcher: &'a dyn ImageFetch,
        options: &'a DeckOptions,
    ) -> Self {
        Self {
            completion,
            search,
            fetcher,
            options,
        }
    }

    /// Run every stage and write the deck into `output_dir`.
    ///
    /// The output file is only created after the deck is fully assembled.
    pub async fn run(
        &self,
        request: &DeckRequest,
        template: &Path,
        output_dir: &Path,
    ) -> Result<RunReport> {
        let template = Package::open_path(template)?;

        log::info!(
            "Generating {} slides on '{}'",
            request.slide_count,
            request.topic
        );
        let outline = OutlineGenerator::new(self.completion)
            .with_attempts(self.options.outline_attempts)
            .with_shape(self.options.content_shape)
            .with_ordering(self.options.ordering)
            .generate(&request.topic, request.slide_count)
            .await?;

        let mut deck = Deck::new(request.topic.trim());
        let resolver = self
            .search
            .filter(|_| self.options.image_candidates > 0)
            .map(|search| ImageResolver::new(search, self.fetcher, self.options.image_candidates));

        for descriptor in outline {
            let image = match &resolver {
                Some(resolver) => {
                    resolver
                        .resolve(
                            deck.topic(),
                            descriptor.title(),
                            Some(descriptor.image_style()),
                        )
                        .await
                }
                None => None,
            };
            deck.push(descriptor, image);
        }

        let package = DeckAssembler::new(self.options.layout)
            .with_subtitle(self.options.subtitle.clone())
            .assemble(&deck, template)?;
        let bytes = package.to_bytes()?;

        std::fs::create_dir_all(output_dir)?;
        let output_path = output_dir.join(output_file_name(
            deck.topic(),
            self.options.output_suffix.as_deref(),
        ));
        std::fs::write(&output_path, bytes).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", output_path.display(), e),
            ))
        })?;

        log::info!("Wrote {}", output_path.display());
        Ok(RunReport {
            output_path,
            slides: deck.slides().len(),
            images: deck.image_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deckgen_core::layout::inches;
    use deckgen_core::LayoutStyle;
    use deckgen_pptx::testing::minimal_template;
    use deckgen_pptx::DeckInspector;
    use deckgen_services::FetchedImage;
    use image::{DynamicImage, RgbImage};
    use std::fs::File;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedCompletion(&'static str);

    #[async_trait]
    impl TextCompletion for FixedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FixedSearch {
        links: Vec<String>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        fn new(links: &[&str]) -> Self {
            Self {
                links: links.iter().map(|l| l.to_string()).collect(),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageSearch for FixedSearch {
        async fn search(&self, query: &str, _count: u8) -> Result<Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.links.clone())
        }
    }

    struct PngFetcher;

    #[async_trait]
    impl ImageFetch for PngFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage> {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([0, 128, 0])));
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png).unwrap();
            Ok(FetchedImage {
                bytes: out.into_inner(),
                content_type: Some("image/png".into()),
            })
        }
    }

    const PHOTOSYNTHESIS: &str = r#"[{"title":"Introduction","content":"..."},{"title":"Light Reactions","content":"..."},{"title":"Conclusion","content":"..."}]"#;

    fn workspace() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("basic.pptx");
        std::fs::write(&template, minimal_template()).unwrap();
        (dir, template)
    }

    fn request(topic: &str, count: usize) -> DeckRequest {
        DeckRequest {
            topic: topic.to_string(),
            slide_count: count,
        }
    }

    #[tokio::test]
    async fn test_photosynthesis_deck() {
        let (dir, template) = workspace();
        let out = dir.path().join("out");
        let completion = FixedCompletion(PHOTOSYNTHESIS);
        let search = FixedSearch::new(&["https://img.example/leaf.png"]);
        let options = DeckOptions {
            layout: LayoutStyle::Fixed,
            ..DeckOptions::default()
        };

        let report = Pipeline::new(&completion, Some(&search), &PngFetcher, &options)
            .run(&request("Photosynthesis", 3), &template, &out)
            .await
            .unwrap();

        assert_eq!(report.output_path, out.join("Photosynthesis.pptx"));
        assert_eq!((report.slides, report.images), (3, 3));
        assert_eq!(
            search.queries.lock().unwrap()[1],
            "Photosynthesis Light Reactions concept high quality realistic professional"
        );

        let slides = DeckInspector::new()
            .read(File::open(&report.output_path).unwrap())
            .unwrap();
        assert_eq!(slides.len(), 4);
        assert_eq!(slides[0].texts(), vec!["Photosynthesis"]);
        assert_eq!(slides[1].pictures[0].x, inches(0.5) as f64);
        assert_eq!(slides[2].pictures[0].x, inches(5.0) as f64);
        assert!(slides[2].shapes[0].x < slides[2].pictures[0].x);
    }

    #[tokio::test]
    async fn test_empty_search_keeps_text() {
        let (dir, template) = workspace();
        let completion = FixedCompletion(PHOTOSYNTHESIS);
        let search = FixedSearch::new(&[]);
        let options = DeckOptions::default();

        let report = Pipeline::new(&completion, Some(&search), &PngFetcher, &options)
            .run(&request("Photosynthesis", 3), &template, dir.path())
            .await
            .unwrap();
        assert_eq!(report.images, 0);

        let slides = DeckInspector::new()
            .read(File::open(&report.output_path).unwrap())
            .unwrap();
        assert_eq!(slides.len(), 4);
        for slide in &slides[1..] {
            assert!(slide.pictures.is_empty());
            assert!(!slide.texts().is_empty());
        }
    }

    #[tokio::test]
    async fn test_search_disabled_skips_images() {
        let (dir, template) = workspace();
        let completion = FixedCompletion(PHOTOSYNTHESIS);
        let search = FixedSearch::new(&["https://img.example/leaf.png"]);
        let options = DeckOptions {
            output_suffix: Some("text_only".into()),
            ..DeckOptions::default()
        }
        .with_image_candidates(0);

        let report = Pipeline::new(&completion, Some(&search), &PngFetcher, &options)
            .run(&request("Plant Biology", 3), &template, dir.path())
            .await
            .unwrap();
        assert_eq!(report.images, 0);
        assert!(search.queries.lock().unwrap().is_empty());
        assert_eq!(
            report.output_path.file_name().unwrap(),
            "Plant_Biology_text_only.pptx"
        );
    }

    #[tokio::test]
    async fn test_unparsable_outline_writes_nothing() {
        let (dir, template) = workspace();
        let out = dir.path().join("out");
        let completion = FixedCompletion("Sorry, I can't produce JSON right now.");
        let options = DeckOptions::default();

        let err = Pipeline::new(&completion, None, &PngFetcher, &options)
            .run(&request("Photosynthesis", 3), &template, &out)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutlineUnavailable { attempts: 2 }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_missing_template_fails_first() {
        let dir = TempDir::new().unwrap();
        let completion = FixedCompletion(PHOTOSYNTHESIS);
        let options = DeckOptions::default();

        let err = Pipeline::new(&completion, None, &PngFetcher, &options)
            .run(&request("Photosynthesis", 3), &dir.path().join("none.pptx"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
