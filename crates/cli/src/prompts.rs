//! Interactive prompts for values not given on the command line.

use anyhow::{Context, Result};
use deckgen_core::MIN_SLIDE_COUNT;
use deckgen_pptx::template::template_label;
use inquire::validator::Validation;
use inquire::{CustomType, Select, Text};
use std::path::PathBuf;

pub fn topic() -> Result<String> {
    Text::new("Enter the presentation topic:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Topic cannot be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Failed to read topic")
        .map(|t| t.trim().to_string())
}

pub fn slide_count() -> Result<usize> {
    CustomType::<usize>::new("How many slides (including introduction and conclusion)?")
        .with_error_message("Please enter a whole number")
        .with_validator(|count: &usize| {
            if *count < MIN_SLIDE_COUNT {
                Ok(Validation::Invalid(
                    format!("Need at least {} slides", MIN_SLIDE_COUNT).into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Failed to read slide count")
}

/// Numbered menu over the available templates.
pub fn template(mut templates: Vec<PathBuf>) -> Result<PathBuf> {
    let labels: Vec<String> = templates
        .iter()
        .enumerate()
        .map(|(i, path)| format!("{}. {}", i + 1, template_label(path)))
        .collect();

    let choice = Select::new("Choose a template:", labels)
        .raw_prompt()
        .context("Failed to read template choice")?;
    Ok(templates.swap_remove(choice.index))
}
