//! Ordered queue of gateway calls awaiting delivery.
//!
//! Calls are delivered strictly in order. A call that fails transiently stays
//! at the head of the queue with its error recorded, and everything behind it
//! waits, so a review never reaches the server ahead of the annotation it
//! depends on. A call the server refuses outright moves to the dead-letter
//! list and draining continues with the next one.

use std::collections::VecDeque;

use serde::Serialize;

use crate::gateway::{deliver, GatewayCall, PersistenceGateway};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub seq: u64,
    pub call: GatewayCall,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Result of one [`Outbox::flush`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub delivered: usize,
    /// Calls the server refused during this flush.
    pub dead_lettered: usize,
    /// Sequence number of the call left at the head after a transient
    /// failure, if any.
    pub failed: Option<u64>,
    pub remaining: usize,
}

#[derive(Debug, Default)]
pub struct Outbox {
    entries: VecDeque<OutboxEntry>,
    dead: Vec<OutboxEntry>,
    next_seq: u64,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a call and return its sequence number.
    pub fn push(&mut self, call: GatewayCall) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(OutboxEntry {
            seq,
            call,
            attempts: 0,
            last_error: None,
        });
        seq
    }

    pub fn pending(&self) -> impl Iterator<Item = &OutboxEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls the server refused, oldest first.
    pub fn dead(&self) -> &[OutboxEntry] {
        &self.dead
    }

    /// Give up on a queued call, moving it to the dead-letter list.
    /// Returns `false` if `seq` is not queued.
    pub fn discard(&mut self, seq: u64) -> bool {
        match self.entries.iter().position(|e| e.seq == seq) {
            Some(index) => {
                self.dead.extend(self.entries.remove(index));
                true
            }
            None => false,
        }
    }

    /// Forget every dead-lettered call.
    pub fn clear_dead(&mut self) -> Vec<OutboxEntry> {
        std::mem::take(&mut self.dead)
    }

    /// Deliver queued calls in order until the queue is empty or one fails
    /// transiently.
    pub async fn flush<G>(&mut self, gateway: &G) -> FlushReport
    where
        G: PersistenceGateway + ?Sized,
    {
        let mut report = FlushReport::default();

        while let Some(entry) = self.entries.front_mut() {
            entry.attempts += 1;
            match deliver(gateway, &entry.call).await {
                Ok(()) => {
                    tracing::debug!(
                        seq = entry.seq,
                        call = entry.call.name(),
                        mission_id = entry.call.mission_id(),
                        "Gateway call delivered"
                    );
                    self.entries.pop_front();
                    report.delivered += 1;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        seq = entry.seq,
                        call = entry.call.name(),
                        mission_id = entry.call.mission_id(),
                        attempts = entry.attempts,
                        error = %e,
                        "Gateway call failed; local state kept, call queued for retry"
                    );
                    entry.last_error = Some(e.to_string());
                    report.failed = Some(entry.seq);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        seq = entry.seq,
                        call = entry.call.name(),
                        mission_id = entry.call.mission_id(),
                        attempts = entry.attempts,
                        error = %e,
                        "Gateway call refused; moved to dead letters"
                    );
                    entry.last_error = Some(e.to_string());
                    self.dead.extend(self.entries.pop_front());
                    report.dead_lettered += 1;
                }
            }
        }

        report.remaining = self.entries.len();
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::gateway::{GatewayError, UploadFile};
    use crate::mission::{DataFile, Mission};
    use crate::responses::AnnotationResponseSet;
    use crate::review::ReviewAction;
    use crate::schema::MissionTaskConfig;
    use crate::types::DbId;

    /// Answers each file's review with a fixed status and records what got
    /// through.
    #[derive(Default)]
    struct ScriptedGateway {
        review_status: Mutex<Option<u16>>,
        delivered: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn failing_reviews(status: u16) -> Self {
            Self {
                review_status: Mutex::new(Some(status)),
                ..Self::default()
            }
        }

        fn heal(&self) {
            *self.review_status.lock().unwrap() = None;
        }

        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }

        fn ok(&self, what: String) -> Result<(), GatewayError> {
            self.delivered.lock().unwrap().push(what);
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceGateway for ScriptedGateway {
        async fn fetch_mission(&self, _: DbId) -> Result<Mission, GatewayError> {
            Err(GatewayError::Request("unused".into()))
        }

        async fn fetch_responses(
            &self,
            _: DbId,
            _: DbId,
        ) -> Result<AnnotationResponseSet, GatewayError> {
            Err(GatewayError::Request("unused".into()))
        }

        async fn save_tasks(&self, _: DbId, _: &[MissionTaskConfig]) -> Result<(), GatewayError> {
            self.ok("save_tasks".into())
        }

        async fn review_file(
            &self,
            _: DbId,
            file_id: DbId,
            _: ReviewAction,
        ) -> Result<(), GatewayError> {
            if let Some(status) = *self.review_status.lock().unwrap() {
                return Err(GatewayError::Api {
                    status,
                    body: "refused".into(),
                });
            }
            self.ok(format!("review_file:{file_id}"))
        }

        async fn annotate_file(
            &self,
            _: DbId,
            file_id: DbId,
            _: &str,
            _: &str,
        ) -> Result<(), GatewayError> {
            self.ok(format!("annotate_file:{file_id}"))
        }

        async fn save_responses(
            &self,
            _: DbId,
            file_id: DbId,
            _: &AnnotationResponseSet,
        ) -> Result<(), GatewayError> {
            self.ok(format!("save_responses:{file_id}"))
        }

        async fn join_mission(&self, _: DbId) -> Result<(), GatewayError> {
            self.ok("join_mission".into())
        }

        async fn upload_files(
            &self,
            _: DbId,
            _: DbId,
            _: Vec<UploadFile>,
        ) -> Result<Vec<DataFile>, GatewayError> {
            Ok(vec![])
        }
    }

    fn approve(file_id: DbId) -> GatewayCall {
        GatewayCall::ReviewFile {
            mission_id: 7,
            file_id,
            action: ReviewAction::Approve,
        }
    }

    fn annotation_calls(file_id: DbId) -> [GatewayCall; 2] {
        [
            GatewayCall::SaveResponses {
                mission_id: 7,
                file_id,
                set: AnnotationResponseSet::default(),
            },
            GatewayCall::AnnotateFile {
                mission_id: 7,
                file_id,
                label: "1 of 1 tasks answered".into(),
                notes: String::new(),
            },
        ]
    }

    fn queue(calls: impl IntoIterator<Item = GatewayCall>) -> Outbox {
        let mut outbox = Outbox::new();
        for call in calls {
            outbox.push(call);
        }
        outbox
    }

    #[tokio::test]
    async fn refused_call_is_dead_lettered_and_draining_continues() {
        let gateway = ScriptedGateway::failing_reviews(409);
        let mut outbox = queue(std::iter::once(approve(10)).chain(annotation_calls(11)));

        let report = outbox.flush(&gateway).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.dead_lettered, 1);
        assert_eq!(report.failed, None);
        assert_eq!(report.remaining, 0);
        assert_eq!(
            gateway.delivered(),
            vec!["save_responses:11", "annotate_file:11"]
        );

        let dead = outbox.dead();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].call, approve(10));
        assert_eq!(dead[0].attempts, 1);
        assert!(dead[0].last_error.as_deref().unwrap().contains("409"));
    }

    #[tokio::test]
    async fn transient_failure_holds_the_queue_until_retried() {
        let gateway = ScriptedGateway::failing_reviews(503);
        let mut outbox = queue(std::iter::once(approve(10)).chain(annotation_calls(11)));

        for _ in 0..3 {
            let report = outbox.flush(&gateway).await;
            assert_eq!(report.delivered, 0);
            assert_eq!(report.failed, Some(0));
            assert_eq!(report.remaining, 3);
        }
        assert!(gateway.delivered().is_empty());
        assert!(outbox.dead().is_empty());
        assert_eq!(outbox.pending().next().unwrap().attempts, 3);

        gateway.heal();
        let report = outbox.flush(&gateway).await;
        assert_eq!(report.delivered, 3);
        assert!(outbox.is_empty());
        assert_eq!(
            gateway.delivered(),
            vec!["review_file:10", "save_responses:11", "annotate_file:11"]
        );
    }

    #[tokio::test]
    async fn discard_unblocks_a_stuck_head() {
        let gateway = ScriptedGateway::failing_reviews(500);
        let mut outbox = queue([approve(10), GatewayCall::JoinMission { mission_id: 7 }]);

        let report = outbox.flush(&gateway).await;
        assert_eq!(report.failed, Some(0));

        assert!(outbox.discard(0));
        assert!(!outbox.discard(0));
        assert_eq!(outbox.dead().len(), 1);

        let report = outbox.flush(&gateway).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(gateway.delivered(), vec!["join_mission"]);

        let cleared = outbox.clear_dead();
        assert_eq!(cleared.len(), 1);
        assert!(outbox.dead().is_empty());
    }
}
