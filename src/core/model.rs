use crate::core::error::{ComicError, ComicResult};
use serde::Serialize;
use std::ops::RangeInclusive;

/// Reading times offered by the input screen, in minutes.
pub const READING_TIME_RANGE: RangeInclusive<u32> = 1..=15;
/// Child ages offered by the input screen.
pub const CHILD_AGE_RANGE: RangeInclusive<u32> = 3..=16;

/// One user action: the comic idea plus the two sliders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub reading_time_minutes: u32,
    pub child_age: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, reading_time_minutes: u32, child_age: u32) -> Self {
        Self {
            prompt: prompt.into(),
            reading_time_minutes,
            child_age,
        }
    }

    pub fn validate(&self) -> ComicResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ComicError::validation("Please enter a comic idea"));
        }
        if self.reading_time_minutes == 0 {
            return Err(ComicError::validation("Reading time must be at least one minute"));
        }
        if self.child_age == 0 {
            return Err(ComicError::validation("Child age must be a positive number"));
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub panel_number: u32,
    pub description: String,
    pub dialogue: String,
    /// Absent until the artwork arrives, and stays absent if it never does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    title: String,
    panels: Vec<Panel>,
    total_panels: usize,
}

impl Story {
    pub fn new(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        let total_panels = panels.len();
        Self {
            title: title.into(),
            panels,
            total_panels,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn total_panels(&self) -> usize {
        self.total_panels
    }

    /// Number of panels whose artwork has arrived.
    pub fn resolved_count(&self) -> usize {
        self.panels.iter().filter(|p| p.image.is_some()).count()
    }

    /// Returns a new story with the image of the panel at `index` replaced.
    /// Out of range indices leave the story unchanged.
    pub fn with_image(&self, index: usize, image: Option<ImageRef>) -> Self {
        let mut next = self.clone();
        if let Some(panel) = next.panels.get_mut(index) {
            panel.image = image;
        }
        next
    }
}
