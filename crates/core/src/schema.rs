//! Schema resolution and save-time validation.
//!
//! A mission's schema is an ordered list of [`MissionTaskConfig`] entries.
//! [`resolve`] turns it into [`ResolvedTask`]s for rendering and is lenient:
//! a broken entry is reported, never fatal. [`validate_for_save`] is strict and
//! guards the schema editor's save action.

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::catalog::{self, TaskTemplate};
use crate::error::CoreError;
use crate::task_config::TaskConfig;

/// Maximum number of tasks a single mission schema may hold.
pub const MAX_TASKS_PER_MISSION: usize = 50;

/// Maximum length of a custom title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a custom instruction.
pub const MAX_INSTRUCTION_LENGTH: usize = 2_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A mission's selection of one template plus its overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionTaskConfig {
    /// Template type string. Kept as a raw string so schemas written by a
    /// newer catalog still load.
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instruction: Option<String>,
    #[serde(default)]
    pub config_overrides: TaskConfig,
}

impl MissionTaskConfig {
    /// An entry with no overrides.
    pub fn new(task_type: impl Into<String>, required: bool) -> Self {
        Self {
            task_type: task_type.into(),
            required,
            custom_title: None,
            custom_instruction: None,
            config_overrides: TaskConfig::default(),
        }
    }
}

/// A template merged with a mission's overrides, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTask {
    pub key: String,
    pub index: usize,
    pub title: String,
    pub instruction: String,
    pub required: bool,
    pub template: &'static TaskTemplate,
    pub config: TaskConfig,
}

impl ResolvedTask {
    pub fn capability(&self) -> Capability {
        self.template.capability
    }
}

/// A problem found while resolving one schema entry.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaError {
    /// The entry names a template this build does not know. The task is
    /// skipped.
    #[error("task {index}: unknown template type '{task_type}'")]
    UnknownTemplate { index: usize, task_type: String },

    /// The overrides populate fields outside the template's capability. The
    /// fields are dropped and the task is still rendered.
    #[error("task {index} ({task_type}): override fields {fields:?} do not apply")]
    OrphanFields {
        index: usize,
        task_type: String,
        fields: Vec<&'static str>,
    },
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSchema {
    /// Renderable tasks, in schema order.
    pub tasks: Vec<ResolvedTask>,
    /// Entries that were skipped or repaired.
    pub issues: Vec<SchemaError>,
}

impl ResolvedSchema {
    pub fn find(&self, key: &str) -> Option<&ResolvedTask> {
        self.tasks.iter().find(|t| t.key == key)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .iter()
            .filter(|t| t.required)
            .map(|t| t.key.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Stable key of the task at `index` with template `task_type`.
///
/// Keys are positional: editing an entry's config keeps its key, but
/// reordering, inserting or removing entries remaps keys and orphans any
/// responses stored under the old ones.
pub fn task_key(task_type: &str, index: usize) -> String {
    format!("{index}:{task_type}")
}

/// Resolve a single entry.
pub fn resolve_entry(
    index: usize,
    entry: &MissionTaskConfig,
) -> Result<(ResolvedTask, Option<SchemaError>), SchemaError> {
    let template = catalog::find(&entry.task_type).ok_or_else(|| SchemaError::UnknownTemplate {
        index,
        task_type: entry.task_type.clone(),
    })?;

    let merged = template.default_config.merged_with(&entry.config_overrides);
    let orphans = merged.orphan_fields(template.capability);
    let (config, issue) = if orphans.is_empty() {
        (merged, None)
    } else {
        (
            merged.restricted_to(template.capability),
            Some(SchemaError::OrphanFields {
                index,
                task_type: entry.task_type.clone(),
                fields: orphans,
            }),
        )
    };

    let task = ResolvedTask {
        key: task_key(&entry.task_type, index),
        index,
        title: entry
            .custom_title
            .clone()
            .unwrap_or_else(|| template.label.to_string()),
        instruction: entry
            .custom_instruction
            .clone()
            .unwrap_or_else(|| template.description.to_string()),
        required: entry.required,
        template,
        config,
    };
    Ok((task, issue))
}

/// Resolve a mission schema.
///
/// Pure and deterministic. Unknown templates are skipped and reported;
/// orphan override fields are dropped and reported.
pub fn resolve(entries: &[MissionTaskConfig]) -> ResolvedSchema {
    let mut schema = ResolvedSchema::default();
    for (index, entry) in entries.iter().enumerate() {
        match resolve_entry(index, entry) {
            Ok((task, issue)) => {
                schema.tasks.push(task);
                schema.issues.extend(issue);
            }
            Err(err) => {
                tracing::warn!(index, task_type = %entry.task_type, "Skipping misconfigured task");
                schema.issues.push(err);
            }
        }
    }
    schema
}

// ---------------------------------------------------------------------------
// Save-time validation
// ---------------------------------------------------------------------------

/// Every problem that blocks saving `entries`, as human-readable messages.
pub fn schema_problems(entries: &[MissionTaskConfig]) -> Vec<String> {
    let mut problems = Vec::new();

    if entries.len() > MAX_TASKS_PER_MISSION {
        problems.push(format!(
            "A mission may have at most {MAX_TASKS_PER_MISSION} tasks, got {}",
            entries.len()
        ));
    }

    for (index, entry) in entries.iter().enumerate() {
        let n = index + 1;
        let (task, issue) = match resolve_entry(index, entry) {
            Ok(resolved) => resolved,
            Err(err) => {
                problems.push(err.to_string());
                continue;
            }
        };
        if let Some(issue) = issue {
            problems.push(issue.to_string());
        }

        if task.title.trim().is_empty() || task.title.len() > MAX_TITLE_LENGTH {
            problems.push(format!(
                "Task {n}: title must be 1-{MAX_TITLE_LENGTH} characters"
            ));
        }
        if task.instruction.len() > MAX_INSTRUCTION_LENGTH {
            problems.push(format!(
                "Task {n}: instruction exceeds {MAX_INSTRUCTION_LENGTH} characters"
            ));
        }

        problems.extend(config_problems(n, task.capability(), &task.config));
    }

    problems
}

fn config_problems(n: usize, capability: Capability, config: &TaskConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if let Some(field) = capability.option_field() {
        let ids = config.option_ids(capability).unwrap_or_default();
        if ids.is_empty() {
            problems.push(format!("Task {n}: {field} must not be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for id in &ids {
            if id.trim().is_empty() {
                problems.push(format!("Task {n}: {field} contains an empty id"));
            } else if !seen.insert(*id) {
                problems.push(format!("Task {n}: duplicate id '{id}' in {field}"));
            }
        }
    }

    match capability {
        Capability::Numeric => match (config.min, config.max, config.step) {
            (Some(min), Some(max), Some(step)) => {
                if !(min < max) {
                    problems.push(format!("Task {n}: min ({min}) must be less than max ({max})"));
                }
                if !(step > 0.0) {
                    problems.push(format!("Task {n}: step must be greater than 0"));
                }
            }
            _ => problems.push(format!("Task {n}: min, max and step are required")),
        },
        Capability::FreeText => {
            if config.max_length == Some(0) {
                problems.push(format!("Task {n}: max_length must be greater than 0"));
            }
        }
        Capability::PairedQa => {
            if config
                .question_template
                .as_ref()
                .is_some_and(|q| q.trim().is_empty())
            {
                problems.push(format!("Task {n}: question_template must not be blank"));
            }
        }
        _ => {}
    }

    for color in config.colors() {
        if !is_hex_color(color) {
            problems.push(format!(
                "Task {n}: invalid color '{color}', expected #RRGGBB"
            ));
        }
    }

    problems
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a schema before it is saved.
pub fn validate_for_save(entries: &[MissionTaskConfig]) -> Result<(), CoreError> {
    let problems = schema_problems(entries);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::task_config::{ChoiceOption, LabelClass};

    fn choice(id: &str) -> ChoiceOption {
        ChoiceOption {
            id: id.to_string(),
            label: id.to_string(),
            color: "#00AAFF".to_string(),
            description: None,
            hotkey: None,
        }
    }

    fn sample_schema() -> Vec<MissionTaskConfig> {
        let mut radio = MissionTaskConfig::new("single_choice", true);
        radio.config_overrides.labels = Some(vec![choice("A"), choice("B")]);
        let mut text = MissionTaskConfig::new("free_text", false);
        text.custom_title = Some("Notes".to_string());
        vec![radio, text]
    }

    #[test]
    fn resolve_is_deterministic_and_ordered() {
        let entries = sample_schema();
        let first = resolve(&entries);
        let second = resolve(&entries);
        assert_eq!(first, second);
        let keys: Vec<_> = first.tasks.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["0:single_choice", "1:free_text"]);
        assert!(first.issues.is_empty());
    }

    #[test]
    fn titles_fall_back_to_template() {
        let schema = resolve(&sample_schema());
        assert_eq!(schema.tasks[0].title, "Single choice");
        assert_eq!(schema.tasks[1].title, "Notes");
        assert_eq!(
            schema.tasks[1].instruction,
            catalog::find("free_text").unwrap().description
        );
    }

    #[test]
    fn empty_override_suppresses_inheritance() {
        let mut entry = MissionTaskConfig::new("single_choice", true);
        entry.config_overrides.labels = Some(vec![]);
        let schema = resolve(&[entry]);
        assert_eq!(schema.tasks[0].config.labels, Some(vec![]));
    }

    #[test]
    fn editing_config_keeps_keys_but_reordering_remaps_them() {
        let mut entries = sample_schema();
        let before = resolve(&entries);

        entries[0].config_overrides.labels = Some(vec![choice("C")]);
        let edited = resolve(&entries);
        assert_eq!(before.tasks[0].key, edited.tasks[0].key);

        entries.swap(0, 1);
        let reordered = resolve(&entries);
        assert_eq!(reordered.tasks[0].key, "0:free_text");
        assert!(reordered.find("0:single_choice").is_none());
    }

    #[test]
    fn unknown_template_is_skipped_not_fatal() {
        let mut entries = sample_schema();
        entries.insert(1, MissionTaskConfig::new("hologram", true));
        let schema = resolve(&entries);

        assert_eq!(schema.tasks.len(), 2);
        assert_eq!(schema.tasks[1].key, "2:free_text");
        assert_matches!(
            &schema.issues[..],
            [SchemaError::UnknownTemplate { index: 1, task_type }] if task_type == "hologram"
        );
    }

    #[test]
    fn orphan_override_fields_are_dropped_and_flagged() {
        let mut entry = MissionTaskConfig::new("ner", false);
        entry.config_overrides.min = Some(3.0);
        let schema = resolve(&[entry]);

        assert_eq!(schema.tasks.len(), 1);
        assert!(schema.tasks[0].config.min.is_none());
        assert!(schema.tasks[0].config.entity_types.is_some());
        assert_matches!(&schema.issues[..], [SchemaError::OrphanFields { fields, .. }] if fields == &vec!["min"]);
    }

    #[test]
    fn lenient_resolve_allows_what_save_rejects() {
        let mut entry = MissionTaskConfig::new("bounding_box", true);
        entry.config_overrides.classes = Some(vec![]);
        assert_eq!(resolve(&[entry.clone()]).tasks.len(), 1);

        let err = validate_for_save(&[entry]).unwrap_err();
        assert!(err.to_string().contains("classes must not be empty"));
    }

    #[test]
    fn numeric_bounds_are_checked_on_save() {
        let mut entry = MissionTaskConfig::new("rating", true);
        entry.config_overrides.min = Some(5.0);
        entry.config_overrides.max = Some(5.0);
        entry.config_overrides.step = Some(0.0);
        let problems = schema_problems(&[entry]);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("must be less than max"));
        assert!(problems[1].contains("step must be greater than 0"));
    }

    #[test]
    fn duplicate_ids_and_bad_colors_block_save() {
        let mut entry = MissionTaskConfig::new("audio_segment", false);
        entry.config_overrides.segment_labels = Some(vec![
            LabelClass {
                id: "speech".into(),
                label: "Speech".into(),
                color: "blue".into(),
                description: None,
            },
            LabelClass {
                id: "speech".into(),
                label: "Speech again".into(),
                color: "#0000FF".into(),
                description: None,
            },
        ]);
        let problems = schema_problems(&[entry]);
        assert!(problems.iter().any(|p| p.contains("duplicate id 'speech'")));
        assert!(problems.iter().any(|p| p.contains("invalid color 'blue'")));
    }

    #[test]
    fn unknown_template_blocks_save() {
        let result = validate_for_save(&[MissionTaskConfig::new("hologram", false)]);
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("unknown template"));
    }

    #[test]
    fn valid_schema_saves() {
        assert!(validate_for_save(&sample_schema()).is_ok());
        assert!(validate_for_save(&[]).is_ok());
    }

    #[test]
    fn entry_json_uses_type_key() {
        let entry: MissionTaskConfig = serde_json::from_str(
            r#"{"type": "rating", "required": true, "config_overrides": {"max": 10}}"#,
        )
        .unwrap();
        assert_eq!(entry.task_type, "rating");
        assert_eq!(entry.config_overrides.max, Some(10.0));
        assert!(entry.custom_title.is_none());
    }
}
