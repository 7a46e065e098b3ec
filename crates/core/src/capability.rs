//! Capabilities: the rendering/validation contract a task demands.
//!
//! Every task template declares exactly one [`Capability`]. The capability
//! decides which [`TaskConfig`](crate::task_config::TaskConfig) fields are
//! meaningful and which [`TaskValue`] shape a renderer must emit.
//!
//! Widgets themselves live outside this crate. [`CapabilityRegistry`] maps a
//! capability to whatever renderer type the host application uses, so adding
//! a capability means adding one registry entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::responses::TaskValue;
use crate::schema::ResolvedTask;

// ---------------------------------------------------------------------------
// Config field names
// ---------------------------------------------------------------------------

pub const FIELD_LABELS: &str = "labels";
pub const FIELD_MIN: &str = "min";
pub const FIELD_MAX: &str = "max";
pub const FIELD_STEP: &str = "step";
pub const FIELD_PLACEHOLDER: &str = "placeholder";
pub const FIELD_MAX_LENGTH: &str = "max_length";
pub const FIELD_CLASSES: &str = "classes";
pub const FIELD_ENTITY_TYPES: &str = "entity_types";
pub const FIELD_SEGMENT_LABELS: &str = "segment_labels";
pub const FIELD_QUESTION_TEMPLATE: &str = "question_template";

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// The UI capability a task template requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SingleChoice,
    MultiChoice,
    Numeric,
    FreeText,
    SpatialRegion,
    Span,
    TimeRange,
    PairedQa,
}

impl Capability {
    /// Every capability, in catalog display order.
    pub const ALL: [Capability; 8] = [
        Capability::SingleChoice,
        Capability::MultiChoice,
        Capability::Numeric,
        Capability::FreeText,
        Capability::SpatialRegion,
        Capability::Span,
        Capability::TimeRange,
        Capability::PairedQa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultiChoice => "multi_choice",
            Self::Numeric => "numeric",
            Self::FreeText => "free_text",
            Self::SpatialRegion => "spatial_region",
            Self::Span => "span",
            Self::TimeRange => "time_range",
            Self::PairedQa => "paired_qa",
        }
    }

    /// Config fields that may be populated for this capability.
    pub fn config_fields(&self) -> &'static [&'static str] {
        match self {
            Self::SingleChoice | Self::MultiChoice => &[FIELD_LABELS],
            Self::Numeric => &[FIELD_MIN, FIELD_MAX, FIELD_STEP],
            Self::FreeText => &[FIELD_PLACEHOLDER, FIELD_MAX_LENGTH],
            Self::SpatialRegion => &[FIELD_CLASSES],
            Self::Span => &[FIELD_ENTITY_TYPES],
            Self::TimeRange => &[FIELD_SEGMENT_LABELS],
            Self::PairedQa => &[FIELD_QUESTION_TEMPLATE],
        }
    }

    /// The list-valued config field annotators pick from, if any.
    ///
    /// Capabilities with a selectable list must never be saved with that
    /// list empty.
    pub fn option_field(&self) -> Option<&'static str> {
        match self {
            Self::SingleChoice | Self::MultiChoice => Some(FIELD_LABELS),
            Self::SpatialRegion => Some(FIELD_CLASSES),
            Self::Span => Some(FIELD_ENTITY_TYPES),
            Self::TimeRange => Some(FIELD_SEGMENT_LABELS),
            Self::Numeric | Self::FreeText | Self::PairedQa => None,
        }
    }

    /// Whether answers for this capability are JSON arrays.
    pub fn is_list_shaped(&self) -> bool {
        !matches!(self, Self::SingleChoice | Self::Numeric | Self::FreeText)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `value` has the shape a renderer for `capability` should emit.
///
/// The response aggregator never calls this; it trusts the renderer. Hosts
/// that receive values from untrusted renderers can check them here.
pub fn value_conforms(capability: Capability, value: &TaskValue) -> bool {
    matches!(
        (capability, value),
        (Capability::SingleChoice, TaskValue::Text(_))
            | (Capability::FreeText, TaskValue::Text(_))
            | (Capability::MultiChoice, TaskValue::Choices(_))
            | (Capability::Numeric, TaskValue::Number(_))
            | (Capability::SpatialRegion, TaskValue::Regions(_))
            | (Capability::Span, TaskValue::Spans(_))
            | (Capability::TimeRange, TaskValue::Segments(_))
            | (Capability::PairedQa, TaskValue::Pairs(_))
    ) || (capability.is_list_shaped() && matches!(value, TaskValue::Choices(v) if v.is_empty()))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps each capability to a renderer of the host's choosing.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry<R> {
    renderers: HashMap<Capability, R>,
}

impl<R> Default for CapabilityRegistry<R> {
    fn default() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }
}

impl<R> CapabilityRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for a capability.
    pub fn register(&mut self, capability: Capability, renderer: R) -> &mut Self {
        self.renderers.insert(capability, renderer);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<&R> {
        self.renderers.get(&capability)
    }

    /// Renderer for a resolved task, or `None` when the host has no widget
    /// for its capability (render the "task misconfigured" placeholder).
    pub fn dispatch(&self, task: &ResolvedTask) -> Option<&R> {
        self.get(task.template.capability)
    }

    /// Capabilities that have no renderer registered yet.
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.renderers.contains_key(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::Region;

    #[test]
    fn option_field_is_one_of_the_config_fields() {
        for cap in Capability::ALL {
            if let Some(field) = cap.option_field() {
                assert!(cap.config_fields().contains(&field), "{cap}");
            }
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Capability::SpatialRegion).unwrap();
        assert_eq!(json, "\"spatial_region\"");
        let back: Capability = serde_json::from_str("\"paired_qa\"").unwrap();
        assert_eq!(back, Capability::PairedQa);
    }

    #[test]
    fn value_shape_checks() {
        assert!(value_conforms(
            Capability::SingleChoice,
            &TaskValue::Text("A".into())
        ));
        assert!(!value_conforms(Capability::Numeric, &TaskValue::Text("3".into())));
        assert!(value_conforms(
            Capability::SpatialRegion,
            &TaskValue::Regions(vec![Region {
                class_id: "car".into(),
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            }])
        ));
        // An empty list deserializes as `Choices`; it is a valid empty answer
        // for every list-shaped capability.
        assert!(value_conforms(Capability::Span, &TaskValue::Choices(vec![])));
        assert!(value_conforms(Capability::PairedQa, &TaskValue::Choices(vec![])));
        for scalar in [
            Capability::SingleChoice,
            Capability::Numeric,
            Capability::FreeText,
        ] {
            assert!(!value_conforms(scalar, &TaskValue::Choices(vec![])), "{scalar}");
        }
    }

    #[test]
    fn registry_dispatches_and_reports_missing() {
        let mut registry: CapabilityRegistry<&'static str> = CapabilityRegistry::new();
        registry
            .register(Capability::SingleChoice, "radio")
            .register(Capability::FreeText, "textarea");

        assert_eq!(registry.get(Capability::SingleChoice), Some(&"radio"));
        assert_eq!(registry.get(Capability::Numeric), None);
        assert_eq!(registry.missing().len(), 6);

        let schema = crate::schema::resolve(&[
            crate::schema::MissionTaskConfig::new("yes_no", true),
            crate::schema::MissionTaskConfig::new("numeric_value", false),
        ]);
        assert_eq!(registry.dispatch(&schema.tasks[0]), Some(&"radio"));
        assert_eq!(registry.dispatch(&schema.tasks[1]), None);
    }
}
