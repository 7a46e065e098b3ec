//! Task template catalog.
//!
//! The catalog is fixed at build time. Missions reference templates by their
//! `type` string; [`find`] is the only lookup and returns `None` for types
//! this build does not know (e.g. a schema written by a newer release).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::task_config::{ChoiceOption, LabelClass, TaskConfig};

// ---------------------------------------------------------------------------
// Task types
// ---------------------------------------------------------------------------

/// Discriminant of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SingleChoice,
    YesNo,
    MultiChoice,
    Rating,
    NumericValue,
    FreeText,
    Transcription,
    BoundingBox,
    Polygon,
    Keypoint,
    Ner,
    SentimentSpan,
    AudioSegment,
    VideoSegment,
    QaPair,
}

impl TaskType {
    pub const ALL: [TaskType; 15] = [
        TaskType::SingleChoice,
        TaskType::YesNo,
        TaskType::MultiChoice,
        TaskType::Rating,
        TaskType::NumericValue,
        TaskType::FreeText,
        TaskType::Transcription,
        TaskType::BoundingBox,
        TaskType::Polygon,
        TaskType::Keypoint,
        TaskType::Ner,
        TaskType::SentimentSpan,
        TaskType::AudioSegment,
        TaskType::VideoSegment,
        TaskType::QaPair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::YesNo => "yes_no",
            Self::MultiChoice => "multi_choice",
            Self::Rating => "rating",
            Self::NumericValue => "numeric_value",
            Self::FreeText => "free_text",
            Self::Transcription => "transcription",
            Self::BoundingBox => "bounding_box",
            Self::Polygon => "polygon",
            Self::Keypoint => "keypoint",
            Self::Ner => "ner",
            Self::SentimentSpan => "sentiment_span",
            Self::AudioSegment => "audio_segment",
            Self::VideoSegment => "video_segment",
            Self::QaPair => "qa_pair",
        }
    }

    /// Parse a persisted type string. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Grouping used by the schema editor's template picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Classification,
    Measurement,
    Text,
    Spatial,
    Language,
    Temporal,
    Qa,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTemplate {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub category: TemplateCategory,
    pub label: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub default_config: TaskConfig,
}

/// Every template, in picker order.
pub fn all() -> &'static [TaskTemplate] {
    static CATALOG: OnceLock<Vec<TaskTemplate>> = OnceLock::new();
    CATALOG.get_or_init(|| TaskType::ALL.into_iter().map(build).collect())
}

/// Look up a template by its persisted `type` string.
pub fn find(task_type: &str) -> Option<&'static TaskTemplate> {
    all().iter().find(|t| t.task_type.as_str() == task_type)
}

/// Look up a template by its discriminant.
pub fn get(task_type: TaskType) -> &'static TaskTemplate {
    // The catalog is built from `TaskType::ALL` in declaration order.
    &all()[task_type as usize]
}

fn build(task_type: TaskType) -> TaskTemplate {
    use TaskType as T;
    use TemplateCategory as C;

    let (category, label, description, capability, default_config) = match task_type {
        T::SingleChoice => (
            C::Classification,
            "Single choice",
            "Pick the one label that best describes the file.",
            Capability::SingleChoice,
            labels(&[("option_a", "Option A", "#3B82F6"), ("option_b", "Option B", "#F59E0B")]),
        ),
        T::YesNo => (
            C::Classification,
            "Yes / No",
            "Answer the question with yes or no.",
            Capability::SingleChoice,
            labels(&[("yes", "Yes", "#22C55E"), ("no", "No", "#EF4444")]),
        ),
        T::MultiChoice => (
            C::Classification,
            "Multiple choice",
            "Select every label that applies.",
            Capability::MultiChoice,
            labels(&[
                ("label_1", "Label 1", "#3B82F6"),
                ("label_2", "Label 2", "#F59E0B"),
                ("label_3", "Label 3", "#10B981"),
            ]),
        ),
        T::Rating => (
            C::Classification,
            "Rating",
            "Rate the file on the given scale.",
            Capability::Numeric,
            numeric(1.0, 5.0, 1.0),
        ),
        T::NumericValue => (
            C::Measurement,
            "Numeric value",
            "Enter the measured value.",
            Capability::Numeric,
            numeric(0.0, 100.0, 1.0),
        ),
        T::FreeText => (
            C::Text,
            "Free text",
            "Describe the file in your own words.",
            Capability::FreeText,
            text("Type your answer...", 1000),
        ),
        T::Transcription => (
            C::Text,
            "Transcription",
            "Transcribe the spoken or written content exactly.",
            Capability::FreeText,
            text("Transcribe here...", 5000),
        ),
        T::BoundingBox => (
            C::Spatial,
            "Bounding box",
            "Draw a box around every object and assign its class.",
            Capability::SpatialRegion,
            TaskConfig {
                classes: Some(classes(&[("object", "Object", "#EF4444")])),
                ..Default::default()
            },
        ),
        T::Polygon => (
            C::Spatial,
            "Polygon",
            "Outline each region and assign its class.",
            Capability::SpatialRegion,
            TaskConfig {
                classes: Some(classes(&[("region", "Region", "#8B5CF6")])),
                ..Default::default()
            },
        ),
        T::Keypoint => (
            C::Spatial,
            "Keypoints",
            "Place a point on each landmark.",
            Capability::SpatialRegion,
            TaskConfig {
                classes: Some(classes(&[("point", "Point", "#06B6D4")])),
                ..Default::default()
            },
        ),
        T::Ner => (
            C::Language,
            "Named entities",
            "Highlight every named entity and assign its type.",
            Capability::Span,
            TaskConfig {
                entity_types: Some(classes(&[
                    ("PER", "Person", "#F97316"),
                    ("ORG", "Organization", "#3B82F6"),
                    ("LOC", "Location", "#22C55E"),
                ])),
                ..Default::default()
            },
        ),
        T::SentimentSpan => (
            C::Language,
            "Sentiment spans",
            "Highlight phrases that carry sentiment.",
            Capability::Span,
            TaskConfig {
                entity_types: Some(classes(&[
                    ("positive", "Positive", "#22C55E"),
                    ("negative", "Negative", "#EF4444"),
                ])),
                ..Default::default()
            },
        ),
        T::AudioSegment => (
            C::Temporal,
            "Audio segments",
            "Mark the time ranges of each sound type.",
            Capability::TimeRange,
            TaskConfig {
                segment_labels: Some(classes(&[
                    ("speech", "Speech", "#3B82F6"),
                    ("music", "Music", "#A855F7"),
                    ("noise", "Noise", "#6B7280"),
                ])),
                ..Default::default()
            },
        ),
        T::VideoSegment => (
            C::Temporal,
            "Video segments",
            "Mark the time ranges where each event happens.",
            Capability::TimeRange,
            TaskConfig {
                segment_labels: Some(classes(&[("event", "Event", "#F59E0B")])),
                ..Default::default()
            },
        ),
        T::QaPair => (
            C::Qa,
            "Question & answer",
            "Write question/answer pairs grounded in the file.",
            Capability::PairedQa,
            TaskConfig {
                question_template: Some("What does this file show?".to_string()),
                ..Default::default()
            },
        ),
    };

    TaskTemplate {
        task_type,
        category,
        label,
        description,
        capability,
        default_config,
    }
}

fn labels(items: &[(&str, &str, &str)]) -> TaskConfig {
    TaskConfig {
        labels: Some(
            items
                .iter()
                .map(|(id, label, color)| ChoiceOption {
                    id: id.to_string(),
                    label: label.to_string(),
                    color: color.to_string(),
                    description: None,
                    hotkey: None,
                })
                .collect(),
        ),
        ..Default::default()
    }
}

fn classes(items: &[(&str, &str, &str)]) -> Vec<LabelClass> {
    items
        .iter()
        .map(|(id, label, color)| LabelClass {
            id: id.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            description: None,
        })
        .collect()
}

fn numeric(min: f64, max: f64, step: f64) -> TaskConfig {
    TaskConfig {
        min: Some(min),
        max: Some(max),
        step: Some(step),
        ..Default::default()
    }
}

fn text(placeholder: &str, max_length: u32) -> TaskConfig {
    TaskConfig {
        placeholder: Some(placeholder.to_string()),
        max_length: Some(max_length),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_a_template_at_its_index() {
        for t in TaskType::ALL {
            assert_eq!(get(t).task_type, t);
        }
        assert_eq!(all().len(), TaskType::ALL.len());
    }

    #[test]
    fn default_configs_have_no_orphan_fields() {
        for template in all() {
            assert!(
                template
                    .default_config
                    .orphan_fields(template.capability)
                    .is_empty(),
                "{} carries fields outside its capability",
                template.task_type.as_str()
            );
        }
    }

    #[test]
    fn option_capabilities_ship_non_empty_defaults() {
        for template in all() {
            if template.capability.option_field().is_some() {
                let ids = template
                    .default_config
                    .option_ids(template.capability)
                    .unwrap_or_default();
                assert!(!ids.is_empty(), "{}", template.task_type.as_str());
            }
        }
    }

    #[test]
    fn find_parses_known_and_rejects_unknown() {
        assert_eq!(find("ner").map(|t| t.capability), Some(Capability::Span));
        assert!(find("hologram").is_none());
        assert_eq!(TaskType::parse("yes_no"), Some(TaskType::YesNo));
    }

    #[test]
    fn template_serializes_type_key() {
        let json = serde_json::to_value(get(TaskType::Rating)).unwrap();
        assert_eq!(json["type"], "rating");
        assert_eq!(json["capability"], "numeric");
        assert_eq!(json["default_config"]["max"], 5.0);
    }
}
