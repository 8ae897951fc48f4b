//! Run configuration: service credentials and deck options.
//!
//! Built once at startup and passed by reference to each stage.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::layout::LayoutStyle;
use crate::outline::{ContentShape, OrderingPolicy};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.googleapis.com";

/// Default number of outline attempts before giving up.
pub const DEFAULT_OUTLINE_ATTEMPTS: u32 = 2;

/// Default and maximum image-search candidates per slide.
pub const DEFAULT_IMAGE_CANDIDATES: u8 = 3;
pub const MAX_IMAGE_CANDIDATES: u8 = 3;

/// Credentials and endpoints for the remote services.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub search_base_url: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "<redacted>"))
            .field("search_engine_id", &self.search_engine_id)
            .field("search_base_url", &self.search_base_url)
            .finish()
    }
}

impl ServiceConfig {
    pub fn new(gemini_api_key: impl Into<String>) -> Self {
        Self {
            gemini_api_key: gemini_api_key.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            search_api_key: None,
            search_engine_id: None,
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("GEMINI_API_KEY")
            .ok_or_else(|| Error::ConfigError("GEMINI_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            config.gemini_base_url = url;
        }
        if let Some(url) = get("GOOGLE_SEARCH_BASE_URL") {
            config.search_base_url = url;
        }
        config.search_api_key = get("GOOGLE_SEARCH_API_KEY");
        config.search_engine_id = get("GOOGLE_SEARCH_ENGINE_ID");
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self
    }

    /// Image search needs both an API key and a search engine id.
    pub fn search_enabled(&self) -> bool {
        self.search_api_key.is_some() && self.search_engine_id.is_some()
    }
}

/// How a template file is chosen from the template directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateSelection {
    /// Show a numbered menu and ask.
    #[default]
    Prompt,
    /// Pick uniformly at random.
    Random,
}

impl FromStr for TemplateSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "random" => Ok(Self::Random),
            other => Err(Error::ConfigError(format!("unknown template selection '{}'", other))),
        }
    }
}

/// Pipeline options that vary between runs.
#[derive(Debug, Clone)]
pub struct DeckOptions {
    pub layout: LayoutStyle,
    pub content_shape: ContentShape,
    pub ordering: OrderingPolicy,
    pub template_selection: TemplateSelection,
    /// Candidates requested per image search; zero disables images.
    pub image_candidates: u8,
    pub outline_attempts: u32,
    /// Text for the title slide's subtitle placeholder.
    pub subtitle: Option<String>,
    /// Appended to the output file stem.
    pub output_suffix: Option<String>,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            layout: LayoutStyle::default(),
            content_shape: ContentShape::default(),
            ordering: OrderingPolicy::default(),
            template_selection: TemplateSelection::default(),
            image_candidates: DEFAULT_IMAGE_CANDIDATES,
            outline_attempts: DEFAULT_OUTLINE_ATTEMPTS,
            subtitle: None,
            output_suffix: None,
        }
    }
}

impl DeckOptions {
    pub fn with_image_candidates(mut self, count: u8) -> Self {
        self.image_candidates = count.min(MAX_IMAGE_CANDIDATES);
        self
    }

    pub fn with_outline_attempts(mut self, attempts: u32) -> Self {
        self.outline_attempts = attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_gemini_key() {
        let err = ServiceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains("GEMINI_API_KEY")));

        let err = ServiceConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GOOGLE_SEARCH_API_KEY", "s-key"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(!config.search_enabled());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ServiceConfig::new("super-secret");
        config.search_api_key = Some("also-secret".into());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("also-secret"));
    }

    #[test]
    fn test_option_bounds() {
        let options = DeckOptions::default()
            .with_image_candidates(10)
            .with_outline_attempts(0);
        assert_eq!(options.image_candidates, MAX_IMAGE_CANDIDATES);
        assert_eq!(options.outline_attempts, 1);
        assert_eq!("RANDOM".parse::<TemplateSelection>().unwrap(), TemplateSelection::Random);
    }
}
