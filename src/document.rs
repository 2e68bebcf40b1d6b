//! Explanation document model and the generative content contract.
//!
//! The exporters never own this data; they only read the title for the HTML
//! snapshot. The model lives here so the presentation renderer and the CLI can
//! load a pre-generated response and check it against the contract.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const GENERATION_FAILED: &str = "抱歉，AI 在生成解释时遇到问题。请检查您的输入或稍后重试。";

/// Icon family for a section, fixed by the response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IconKey {
    Info,
    Capacity,
    Process,
    Types,
    Learn,
    Tools,
    Life,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletPoint {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCard {
    pub icon: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberedStep {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolChip {
    pub icon: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub trigger: String,
    pub result: String,
}

/// Body of a section. Which field is populated depends on the section's
/// `IconKey`; the renderer picks the first populated variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<BulletPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_cards: Option<Vec<PowerCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Example>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbered_steps: Option<Vec<NumberedStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_chips: Option<Vec<ToolChip>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_list: Option<Vec<String>>,
}

/// One step of the explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub step: u8,
    #[serde(rename = "iconKey")]
    pub icon_key: IconKey,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: SectionContent,
}

/// A structured explanation as returned by the generative content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationDocument {
    #[serde(rename = "mainTitle")]
    pub main_title: String,
    pub subtitle: String,
    #[serde(rename = "topicEmoji", default)]
    pub topic_emoji: String,
    pub sections: Vec<Section>,
}

impl ExplanationDocument {
    /// Parse a raw generation response.
    ///
    /// Any failure collapses into a single user-facing `Error::Generation`;
    /// a partially valid document is never returned.
    pub fn from_response(json: &str) -> Result<Self> {
        let doc: ExplanationDocument = serde_json::from_str(json.trim()).map_err(|e| {
            log::error!("Error parsing explanation response: {}", e);
            Error::Generation(GENERATION_FAILED.to_string())
        })?;
        doc.validate().map_err(|e| {
            log::error!("Explanation response violates the contract: {}", e);
            Error::Generation(GENERATION_FAILED.to_string())
        })?;
        Ok(doc)
    }

    /// Check the response contract: non-empty sections, steps in 1..=7 and
    /// unique, tool chips always paired with a summary.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sections.is_empty() {
            return Err("document has no sections".into());
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !(1..=7).contains(&section.step) {
                return Err(format!("step {} is outside 1..=7", section.step));
            }
            if !seen.insert(section.step) {
                return Err(format!("step {} appears more than once", section.step));
            }
            let c = &section.content;
            if c.tool_chips.is_some() && c.summary.is_none() {
                return Err(format!("step {} has tool chips without a summary", section.step));
            }
        }
        Ok(())
    }
}

/// Something that turns a topic into an explanation document.
pub trait ContentSource {
    fn generate(&self, topic: &str) -> Result<ExplanationDocument>;
}

/// Reads a pre-generated response from a JSON file instead of calling a
/// remote service.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl ContentSource for JsonFileSource {
    fn generate(&self, topic: &str) -> Result<ExplanationDocument> {
        log::debug!("Loading explanation for {:?} from {}", topic, self.path.display());
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            log::error!("Error reading {}: {}", self.path.display(), e);
            Error::Generation(GENERATION_FAILED.to_string())
        })?;
        ExplanationDocument::from_response(&raw)
    }
}
