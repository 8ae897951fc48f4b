//! Outline generation with a bounded retry on malformed output.

use deckgen_core::outline::{
    fit_to_count, order_slides, parse_outline, validate_slide_count,
};
use deckgen_core::{
    ContentShape, Error, OrderingPolicy, OutlinePrompt, Result, SlideDescriptor,
};

use crate::completion::TextCompletion;

pub struct OutlineGenerator<'a> {
    completion: &'a dyn TextCompletion,
    attempts: u32,
    shape: ContentShape,
    ordering: OrderingPolicy,
}

impl<'a> OutlineGenerator<'a> {
    pub fn new(completion: &'a dyn TextCompletion) -> Self {
        Self {
            completion,
            attempts: deckgen_core::config::DEFAULT_OUTLINE_ATTEMPTS,
            shape: ContentShape::default(),
            ordering: OrderingPolicy::default(),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_shape(mut self, shape: ContentShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Ask for `count` slides on `topic`, retrying the whole request when the
    /// answer holds no usable slides.
    pub async fn generate(&self, topic: &str, count: usize) -> Result<Vec<SlideDescriptor>> {
        validate_slide_count(count)?;
        let prompt = OutlinePrompt::new(topic, count).with_shape(self.shape).render();

        for attempt in 1..=self.attempts {
            log::debug!("Outline attempt {}/{} for '{}'", attempt, self.attempts, topic);

            let text = match self.completion.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Outline attempt {} failed: {}", attempt, e);
                    continue;
                }
            };

            let slides = parse_outline(&text);
            if slides.is_empty() {
                log::warn!("Outline attempt {} returned no usable slides", attempt);
                continue;
            }

            let slides = fit_to_count(order_slides(slides, self.ordering), count, self.ordering);
            if slides.len() < count {
                log::info!("Requested {} slides, model returned {}", count, slides.len());
            }
            return Ok(slides);
        }

        Err(Error::OutlineUnavailable {
            attempts: self.attempts,
        })
    }
}
