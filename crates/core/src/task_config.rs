//! Capability-shaped task configuration and the override merge.

use serde::{Deserialize, Serialize};

use crate::capability::{
    Capability, FIELD_CLASSES, FIELD_ENTITY_TYPES, FIELD_LABELS, FIELD_MAX, FIELD_MAX_LENGTH,
    FIELD_MIN, FIELD_PLACEHOLDER, FIELD_QUESTION_TEMPLATE, FIELD_SEGMENT_LABELS, FIELD_STEP,
};

/// A selectable option of a single/multi choice task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
}

/// A drawable class, entity type, or segment label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelClass {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Configuration of a task. Only the fields belonging to the owning
/// template's capability may be populated.
///
/// The same type carries per-mission overrides: a field that is `Some`
/// (even `Some(vec![])`) replaces the template default wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ChoiceOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<LabelClass>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<LabelClass>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_labels: Option<Vec<LabelClass>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_template: Option<String>,
}

impl TaskConfig {
    /// Shallow merge of `overrides` over `self`.
    pub fn merged_with(&self, overrides: &TaskConfig) -> TaskConfig {
        TaskConfig {
            labels: overrides.labels.clone().or_else(|| self.labels.clone()),
            min: overrides.min.or(self.min),
            max: overrides.max.or(self.max),
            step: overrides.step.or(self.step),
            placeholder: overrides
                .placeholder
                .clone()
                .or_else(|| self.placeholder.clone()),
            max_length: overrides.max_length.or(self.max_length),
            classes: overrides.classes.clone().or_else(|| self.classes.clone()),
            entity_types: overrides
                .entity_types
                .clone()
                .or_else(|| self.entity_types.clone()),
            segment_labels: overrides
                .segment_labels
                .clone()
                .or_else(|| self.segment_labels.clone()),
            question_template: overrides
                .question_template
                .clone()
                .or_else(|| self.question_template.clone()),
        }
    }

    /// Names of the fields that are populated, in declaration order.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                fields.push(name);
            }
        };
        push(self.labels.is_some(), FIELD_LABELS);
        push(self.min.is_some(), FIELD_MIN);
        push(self.max.is_some(), FIELD_MAX);
        push(self.step.is_some(), FIELD_STEP);
        push(self.placeholder.is_some(), FIELD_PLACEHOLDER);
        push(self.max_length.is_some(), FIELD_MAX_LENGTH);
        push(self.classes.is_some(), FIELD_CLASSES);
        push(self.entity_types.is_some(), FIELD_ENTITY_TYPES);
        push(self.segment_labels.is_some(), FIELD_SEGMENT_LABELS);
        push(self.question_template.is_some(), FIELD_QUESTION_TEMPLATE);
        fields
    }

    /// Populated fields that do not belong to `capability`.
    pub fn orphan_fields(&self, capability: Capability) -> Vec<&'static str> {
        let allowed = capability.config_fields();
        self.populated_fields()
            .into_iter()
            .filter(|f| !allowed.contains(f))
            .collect()
    }

    /// A copy with every field outside `capability` cleared.
    pub fn restricted_to(&self, capability: Capability) -> TaskConfig {
        let keep = |name: &str| capability.config_fields().contains(&name);
        TaskConfig {
            labels: self.labels.clone().filter(|_| keep(FIELD_LABELS)),
            min: self.min.filter(|_| keep(FIELD_MIN)),
            max: self.max.filter(|_| keep(FIELD_MAX)),
            step: self.step.filter(|_| keep(FIELD_STEP)),
            placeholder: self.placeholder.clone().filter(|_| keep(FIELD_PLACEHOLDER)),
            max_length: self.max_length.filter(|_| keep(FIELD_MAX_LENGTH)),
            classes: self.classes.clone().filter(|_| keep(FIELD_CLASSES)),
            entity_types: self.entity_types.clone().filter(|_| keep(FIELD_ENTITY_TYPES)),
            segment_labels: self
                .segment_labels
                .clone()
                .filter(|_| keep(FIELD_SEGMENT_LABELS)),
            question_template: self
                .question_template
                .clone()
                .filter(|_| keep(FIELD_QUESTION_TEMPLATE)),
        }
    }

    /// Ids of the selectable list for `capability`, if it has one.
    ///
    /// Returns `None` when the capability has no list or the list is unset.
    pub fn option_ids(&self, capability: Capability) -> Option<Vec<&str>> {
        match capability {
            Capability::SingleChoice | Capability::MultiChoice => self
                .labels
                .as_ref()
                .map(|l| l.iter().map(|o| o.id.as_str()).collect()),
            Capability::SpatialRegion => ids(&self.classes),
            Capability::Span => ids(&self.entity_types),
            Capability::TimeRange => ids(&self.segment_labels),
            Capability::Numeric | Capability::FreeText | Capability::PairedQa => None,
        }
    }

    /// Colours of every option/class in this config.
    pub(crate) fn colors(&self) -> Vec<&str> {
        let mut colors: Vec<&str> = self
            .labels
            .iter()
            .flatten()
            .map(|o| o.color.as_str())
            .collect();
        for list in [&self.classes, &self.entity_types, &self.segment_labels] {
            colors.extend(list.iter().flatten().map(|c| c.color.as_str()));
        }
        colors
    }
}

fn ids(list: &Option<Vec<LabelClass>>) -> Option<Vec<&str>> {
    list.as_ref()
        .map(|l| l.iter().map(|c| c.id.as_str()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str) -> ChoiceOption {
        ChoiceOption {
            id: id.to_string(),
            label: id.to_uppercase(),
            color: "#112233".to_string(),
            description: None,
            hotkey: None,
        }
    }

    #[test]
    fn empty_list_override_suppresses_default() {
        let default = TaskConfig {
            labels: Some(vec![option("a"), option("b")]),
            ..Default::default()
        };
        let overrides = TaskConfig {
            labels: Some(vec![]),
            ..Default::default()
        };
        let merged = default.merged_with(&overrides);
        assert_eq!(merged.labels, Some(vec![]));
    }

    #[test]
    fn absent_override_inherits_default() {
        let default = TaskConfig {
            min: Some(1.0),
            max: Some(5.0),
            step: Some(1.0),
            ..Default::default()
        };
        let overrides = TaskConfig {
            max: Some(10.0),
            ..Default::default()
        };
        let merged = default.merged_with(&overrides);
        assert_eq!(merged.min, Some(1.0));
        assert_eq!(merged.max, Some(10.0));
        assert_eq!(merged.step, Some(1.0));
    }

    #[test]
    fn list_override_replaces_rather_than_appends() {
        let default = TaskConfig {
            labels: Some(vec![option("a"), option("b")]),
            ..Default::default()
        };
        let overrides = TaskConfig {
            labels: Some(vec![option("c")]),
            ..Default::default()
        };
        let merged = default.merged_with(&overrides);
        assert_eq!(merged.labels, Some(vec![option("c")]));
    }

    #[test]
    fn orphan_fields_are_detected_and_stripped() {
        let config = TaskConfig {
            labels: Some(vec![option("a")]),
            min: Some(0.0),
            ..Default::default()
        };
        assert_eq!(config.orphan_fields(Capability::SingleChoice), vec!["min"]);
        let restricted = config.restricted_to(Capability::SingleChoice);
        assert!(restricted.orphan_fields(Capability::SingleChoice).is_empty());
        assert!(restricted.labels.is_some());
    }

    #[test]
    fn json_null_and_missing_keys_mean_absent() {
        let config: TaskConfig =
            serde_json::from_str(r#"{"labels": null, "entity_types": []}"#).unwrap();
        assert!(config.labels.is_none());
        assert_eq!(config.entity_types, Some(vec![]));
        assert_eq!(config.populated_fields(), vec!["entity_types"]);
    }
}
