//! Annotation response aggregation.
//!
//! Responses are stored per `(mission, file)` and keyed by
//! [`ResolvedTask::key`](crate::schema::ResolvedTask). Values are written as
//! the renderer emits them; no shape checking happens here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::schema::ResolvedTask;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A drawn region in normalised image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub class_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A highlighted character span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A labelled time range, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSegment {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A capability-shaped answer.
///
/// Serialized untagged so the stored blob matches what renderers emit: a
/// string, a number, or an array. An empty array always reads back as
/// `Choices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskValue {
    Text(String),
    Number(f64),
    Choices(Vec<String>),
    Regions(Vec<Region>),
    Spans(Vec<Span>),
    Segments(Vec<TimeSegment>),
    Pairs(Vec<QaPair>),
}

impl TaskValue {
    /// Short human-readable rendering for audit summaries.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Choices(c) => c.join(", "),
            Self::Regions(r) => format!("{} region(s)", r.len()),
            Self::Spans(s) => format!("{} span(s)", s.len()),
            Self::Segments(s) => format!("{} segment(s)", s.len()),
            Self::Pairs(p) => format!("{} pair(s)", p.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Response sets
// ---------------------------------------------------------------------------

/// All answers for one file of one mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResponseSet {
    /// `None` records an explicit "unanswered".
    #[serde(default)]
    pub values: BTreeMap<String, Option<TaskValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl AnnotationResponseSet {
    pub fn get(&self, key: &str) -> Option<&TaskValue> {
        self.values.get(key).and_then(Option::as_ref)
    }

    pub fn is_answered(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Every key of `tasks` mapped to its value, `None` where unanswered.
    ///
    /// Values stored under keys no longer in the schema are left out.
    pub fn snapshot(&self, tasks: &[ResolvedTask]) -> BTreeMap<String, Option<TaskValue>> {
        tasks
            .iter()
            .map(|t| (t.key.clone(), self.get(&t.key).cloned()))
            .collect()
    }

    /// Stored keys that no resolved task claims (left behind by a reorder).
    pub fn orphaned_keys<'a>(&'a self, tasks: &[ResolvedTask]) -> Vec<&'a str> {
        self.values
            .keys()
            .filter(|k| !tasks.iter().any(|t| &t.key == *k))
            .map(String::as_str)
            .collect()
    }
}

/// Answer counts for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub required_answered: usize,
    pub required_total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.required_answered == self.required_total
    }
}

/// Required tasks of `tasks` that have no value in `set`.
pub fn missing_required<'a>(
    tasks: &'a [ResolvedTask],
    set: Option<&AnnotationResponseSet>,
) -> Vec<&'a ResolvedTask> {
    tasks
        .iter()
        .filter(|t| t.required && !set.is_some_and(|s| s.is_answered(&t.key)))
        .collect()
}

/// Answer counts of `set` against `tasks`.
pub fn progress(tasks: &[ResolvedTask], set: Option<&AnnotationResponseSet>) -> Progress {
    let answered = |t: &&ResolvedTask| set.is_some_and(|s| s.is_answered(&t.key));
    Progress {
        answered: tasks.iter().filter(answered).count(),
        total: tasks.len(),
        required_answered: tasks.iter().filter(|t| t.required).filter(answered).count(),
        required_total: tasks.iter().filter(|t| t.required).count(),
    }
}

/// Audit label and notes describing a submission.
pub fn submission_summary(
    tasks: &[ResolvedTask],
    set: Option<&AnnotationResponseSet>,
) -> (String, String) {
    let p = progress(tasks, set);
    let label = format!("{} of {} tasks answered", p.answered, p.total);
    let notes = tasks
        .iter()
        .filter_map(|t| {
            set.and_then(|s| s.get(&t.key))
                .map(|v| format!("{}: {}", t.title, v.summary()))
        })
        .collect::<Vec<_>>()
        .join("\n");
    (label, notes)
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Response sets for every `(mission, file)` touched in this session.
#[derive(Debug, Clone, Default)]
pub struct ResponseAggregator {
    sets: HashMap<(DbId, DbId), AnnotationResponseSet>,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value stored under `key`. The set is created lazily.
    pub fn set_value(
        &mut self,
        mission_id: DbId,
        file_id: DbId,
        key: impl Into<String>,
        value: Option<TaskValue>,
    ) {
        let set = self.sets.entry((mission_id, file_id)).or_default();
        set.values.insert(key.into(), value);
        set.updated_at = Some(chrono::Utc::now());
    }

    pub fn get(&self, mission_id: DbId, file_id: DbId) -> Option<&AnnotationResponseSet> {
        self.sets.get(&(mission_id, file_id))
    }

    /// Replace a file's set wholesale (page re-entry, refresh).
    pub fn load(&mut self, mission_id: DbId, file_id: DbId, set: AnnotationResponseSet) {
        self.sets.insert((mission_id, file_id), set);
    }

    /// True iff every required task has a non-null value.
    pub fn is_complete(&self, tasks: &[ResolvedTask], mission_id: DbId, file_id: DbId) -> bool {
        missing_required(tasks, self.get(mission_id, file_id)).is_empty()
    }

    pub fn progress(&self, tasks: &[ResolvedTask], mission_id: DbId, file_id: DbId) -> Progress {
        progress(tasks, self.get(mission_id, file_id))
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Position of an annotator within a file's tasks.
///
/// Direct jumps may go anywhere; `next` walks sequentially and stops at the
/// last task. Completion does not restrict movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCursor {
    index: usize,
    len: usize,
}

impl TaskCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.len == 0 || self.index + 1 == self.len
    }

    /// Advance one task. Returns `false` when already at the end.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to `index`. Out-of-range targets are ignored.
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.index = index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{resolve, MissionTaskConfig};

    const M: DbId = 1;
    const F: DbId = 10;

    fn tasks() -> Vec<ResolvedTask> {
        resolve(&[
            MissionTaskConfig::new("single_choice", true),
            MissionTaskConfig::new("free_text", false),
            MissionTaskConfig::new("rating", true),
        ])
        .tasks
    }

    #[test]
    fn complete_only_when_every_required_task_answered() {
        let tasks = tasks();
        let mut agg = ResponseAggregator::new();
        assert!(!agg.is_complete(&tasks, M, F));

        agg.set_value(M, F, "0:single_choice", Some(TaskValue::Text("A".into())));
        assert!(!agg.is_complete(&tasks, M, F));

        agg.set_value(M, F, "2:rating", Some(TaskValue::Number(4.0)));
        assert!(agg.is_complete(&tasks, M, F));

        // Optional task state never matters.
        agg.set_value(M, F, "1:free_text", None);
        assert!(agg.is_complete(&tasks, M, F));
    }

    #[test]
    fn setting_null_unanswers_a_task() {
        let tasks = tasks();
        let mut agg = ResponseAggregator::new();
        agg.set_value(M, F, "0:single_choice", Some(TaskValue::Text("A".into())));
        agg.set_value(M, F, "2:rating", Some(TaskValue::Number(2.0)));
        agg.set_value(M, F, "2:rating", None);
        assert!(!agg.is_complete(&tasks, M, F));
        let p = agg.progress(&tasks, M, F);
        assert_eq!((p.answered, p.required_answered, p.required_total), (1, 1, 2));
    }

    #[test]
    fn schema_without_required_tasks_is_complete_immediately() {
        let tasks = resolve(&[MissionTaskConfig::new("free_text", false)]).tasks;
        assert!(ResponseAggregator::new().is_complete(&tasks, M, F));
    }

    #[test]
    fn snapshot_lists_every_task_key() {
        let tasks = tasks();
        let mut agg = ResponseAggregator::new();
        agg.set_value(M, F, "0:single_choice", Some(TaskValue::Text("B".into())));
        agg.set_value(M, F, "7:ner", Some(TaskValue::Choices(vec![])));

        let set = agg.get(M, F).unwrap();
        let snap = set.snapshot(&tasks);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap["0:single_choice"], Some(TaskValue::Text("B".into())));
        assert_eq!(snap["1:free_text"], None);
        assert_eq!(set.orphaned_keys(&tasks), vec!["7:ner"]);
    }

    #[test]
    fn values_round_trip_through_untagged_json() {
        let json = serde_json::json!({
            "values": {
                "0:single_choice": "A",
                "1:multi_choice": ["x", "y"],
                "2:rating": 3,
                "3:bounding_box": [{"class_id": "car", "x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}],
                "4:ner": [{"entity_type": "PER", "start": 0, "end": 4}],
                "5:audio_segment": [{"label": "speech", "start": 0.0, "end": 1.5}],
                "6:qa_pair": [{"question": "q", "answer": "a"}],
                "7:free_text": null
            }
        });
        let set: AnnotationResponseSet = serde_json::from_value(json).unwrap();
        assert_eq!(set.get("2:rating"), Some(&TaskValue::Number(3.0)));
        assert!(matches!(set.get("3:bounding_box"), Some(TaskValue::Regions(r)) if r.len() == 1));
        assert!(matches!(set.get("4:ner"), Some(TaskValue::Spans(_))));
        assert!(matches!(set.get("5:audio_segment"), Some(TaskValue::Segments(_))));
        assert!(matches!(set.get("6:qa_pair"), Some(TaskValue::Pairs(_))));
        assert!(!set.is_answered("7:free_text"));
    }

    #[test]
    fn summary_counts_answers() {
        let tasks = tasks();
        let mut agg = ResponseAggregator::new();
        agg.set_value(M, F, "0:single_choice", Some(TaskValue::Text("A".into())));
        let (label, notes) = submission_summary(&tasks, agg.get(M, F));
        assert_eq!(label, "1 of 3 tasks answered");
        assert_eq!(notes, "Single choice: A");
    }

    #[test]
    fn cursor_moves_freely_but_next_is_sequential() {
        let mut cursor = TaskCursor::new(3);
        assert!(cursor.jump(2));
        assert!(!cursor.next());
        assert!(cursor.previous());
        assert_eq!(cursor.index(), 1);
        assert!(!cursor.jump(3));
        assert!(cursor.next());
        assert!(cursor.is_last());
    }
}
