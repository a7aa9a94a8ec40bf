//! Inbound message handling: body creation, history growth, pair
//! promotion, human eviction, and sleeping-job awakening.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use prox_body::{BodyId, ModeTrace};
use prox_broker::{
    BodyPresentationMessage, BodyPresentationTopic, BrokerAccess, BrokerError, HumanStateMessage,
    HumanStateTopic, RobotStateMessage, RobotStateTopic, Subscriber,
};
use prox_core::Timestamp;
use prox_jobs::{
    JobAwakeningResult, JobError, LookAheadJob, LookAheadJobFactory, LookAheadJobIdentifier,
    LookAheadJobPath,
};
use tracing::{debug, error, info};

use crate::error::RuntimeError;
use crate::queue::SyncQueue;
use crate::registry::BodyRegistry;

/// Time without human state updates (by message timestamp, not wall clock,
/// so simulated feeds behave) after which a human is evicted.
pub const HUMAN_RETENTION_TIMEOUT: Timestamp = 10_000;

/// Subscribes to the three inbound topic families and applies their
/// messages.  Dropping the receiver tears the subscriptions down.
pub struct Receiver {
    shared: Arc<ReceiverShared>,
    _subscribers: Vec<Box<dyn Subscriber>>,
}

struct ReceiverShared {
    registry: Arc<BodyRegistry>,
    factory: LookAheadJobFactory,
    waiting: Arc<SyncQueue<LookAheadJob>>,
    sleeping: Arc<SyncQueue<LookAheadJob>>,
    history_retention: Timestamp,
    history_purge_period: Timestamp,
    /// Human-robot pairs created by presentations, awaiting enough history
    /// to be promoted into jobs.
    pending_pairs: Mutex<Vec<(BodyId, BodyId)>>,
    latest_message_time: AtomicU64,
    last_purge_time: AtomicU64,
    num_state_messages: AtomicUsize,
}

impl Receiver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        access: &dyn BrokerAccess,
        bp_topic: &BodyPresentationTopic,
        hs_topic: &HumanStateTopic,
        rs_topic: &RobotStateTopic,
        factory: LookAheadJobFactory,
        history_retention: Timestamp,
        history_purge_period: Timestamp,
        registry: Arc<BodyRegistry>,
        waiting: Arc<SyncQueue<LookAheadJob>>,
        sleeping: Arc<SyncQueue<LookAheadJob>>,
    ) -> Result<Self, BrokerError> {
        let shared = Arc::new(ReceiverShared {
            registry,
            factory,
            waiting,
            sleeping,
            history_retention,
            history_purge_period,
            pending_pairs: Mutex::new(Vec::new()),
            latest_message_time: AtomicU64::new(0),
            last_purge_time: AtomicU64::new(0),
            num_state_messages: AtomicUsize::new(0),
        });

        let bp_shared = Arc::clone(&shared);
        let hs_shared = Arc::clone(&shared);
        let rs_shared = Arc::clone(&shared);
        let subscribers = vec![
            access.body_presentation_subscriber(
                Box::new(move |msg| bp_shared.on_presentation(msg)),
                bp_topic,
            )?,
            access.human_state_subscriber(
                Box::new(move |msg| hs_shared.on_human_state(msg)),
                hs_topic,
            )?,
            access.robot_state_subscriber(
                Box::new(move |msg| rs_shared.on_robot_state(msg)),
                rs_topic,
            )?,
        ];
        Ok(Self { shared, _subscribers: subscribers })
    }

    pub fn factory(&self) -> &LookAheadJobFactory {
        &self.shared.factory
    }

    /// Human-robot pairs created but not yet promoted into waiting jobs.
    pub fn num_pending_human_robot_pairs(&self) -> usize {
        self.shared.pending_pairs.lock().unwrap().len()
    }

    /// State messages (human or robot) fully applied so far.
    pub fn num_state_messages_received(&self) -> usize {
        self.shared.num_state_messages.load(Ordering::Acquire)
    }
}

impl ReceiverShared {
    // ── Callbacks ─────────────────────────────────────────────────────────

    fn on_presentation(&self, message: BodyPresentationMessage) {
        if self.registry.contains(&message.id) {
            return; // re-broadcast presentation
        }
        if let Err(e) = self.registry.insert(&message) {
            error!(body = %message.id, error = %e, "rejected body presentation");
            return;
        }
        info!(body = %message.id, human = message.is_human, "body registered");
        let mut pending = self.pending_pairs.lock().unwrap();
        if message.is_human {
            for robot in self.registry.robot_ids() {
                pending.push((message.id.clone(), robot));
            }
        } else {
            for human in self.registry.human_ids() {
                pending.push((human, message.id.clone()));
            }
        }
    }

    fn on_human_state(&self, message: HumanStateMessage) {
        self.latest_message_time
            .fetch_max(message.timestamp, Ordering::AcqRel);
        self.registry.acquire_human_state(&message);
        self.maybe_purge(message.timestamp);
        self.remove_unresponding_humans();
        self.promote_pairs();
        self.awaken_sleeping_jobs();
        // Counted last, once every effect of the message is applied.
        self.num_state_messages.fetch_add(1, Ordering::Release);
    }

    fn on_robot_state(&self, message: RobotStateMessage) {
        self.latest_message_time
            .fetch_max(message.timestamp, Ordering::AcqRel);
        if self.registry.has_robot(&message.body_id) {
            if let Err(e) = self.registry.acquire_robot_state(&message) {
                error!(body = %message.body_id, error = %e, "failed to acquire robot state");
            }
        } else {
            debug!(body = %message.body_id, "state for unknown robot skipped");
        }
        self.maybe_purge(message.timestamp);
        self.remove_unresponding_humans();
        self.promote_pairs();
        self.num_state_messages.fetch_add(1, Ordering::Release);
    }

    // ── History maintenance ───────────────────────────────────────────────

    /// Purge history older than the retention window, at most once per
    /// purge period.
    fn maybe_purge(&self, now: Timestamp) {
        let last = self.last_purge_time.load(Ordering::Acquire);
        if now < last.saturating_add(self.history_purge_period) {
            return;
        }
        if self
            .last_purge_time
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let horizon = now.saturating_sub(self.history_retention);
        if horizon == 0 {
            return;
        }
        for id in self.registry.human_ids() {
            self.registry.purge_human_history(&id, horizon);
        }
        for id in self.registry.robot_ids() {
            self.registry.purge_robot_history(&id, horizon);
        }
        debug!(horizon, "history purged");
    }

    /// Evict humans whose latest state is older than the retention timeout
    /// with respect to the newest message timestamp seen, along with their
    /// sleeping jobs.
    fn remove_unresponding_humans(&self) {
        let latest = self.latest_message_time.load(Ordering::Acquire);
        for id in self.registry.human_ids() {
            let Ok(Some(last_seen)) = self.registry.latest_human_timestamp(&id) else {
                continue;
            };
            if latest <= last_seen.saturating_add(HUMAN_RETENTION_TIMEOUT) {
                continue;
            }
            for job in self.sleeping.drain_all() {
                if job.id().human() != &id {
                    self.sleeping.enqueue(job);
                }
            }
            self.pending_pairs
                .lock()
                .unwrap()
                .retain(|(human, _)| human != &id);
            let _ = self.registry.remove(&id);
            info!(body = %id, "unresponding human evicted");
        }
    }

    // ── Pair promotion ────────────────────────────────────────────────────

    /// Promote pending pairs whose histories allow look-ahead into initial
    /// jobs, one per segment pair.
    fn promote_pairs(&self) {
        let pairs: Vec<(BodyId, BodyId)> = {
            let mut pending = self.pending_pairs.lock().unwrap();
            std::mem::take(&mut *pending)
        };
        let mut remaining = Vec::new();
        for (human, robot) in pairs {
            match self.try_promote(&human, &robot) {
                Ok(true) => {}
                Ok(false) => remaining.push((human, robot)),
                Err(e) => {
                    error!(%human, %robot, error = %e, "failed to promote pair");
                    remaining.push((human, robot));
                }
            }
        }
        self.pending_pairs.lock().unwrap().extend(remaining);
    }

    /// Returns true when the pair is resolved (promoted, or obsolete
    /// because one of the bodies disappeared).
    fn try_promote(&self, human: &BodyId, robot: &BodyId) -> Result<bool, RuntimeError> {
        if !self.registry.has_human(human) || !self.registry.has_robot(robot) {
            return Ok(true);
        }
        let robot_history = self.registry.robot_history(robot)?;
        let Some(instance) = self
            .registry
            .latest_human_instance_within(human, robot_history.latest_time())?
        else {
            return Ok(false);
        };
        let time = instance.timestamp();
        if !robot_history.snapshot_at(time).can_look_ahead(time) {
            return Ok(false);
        }

        let mode = robot_history.mode_at(time);
        let num_robot_segments = robot_history.robot().body().num_segments();
        for (human_segment, sample) in instance.samples().iter().enumerate() {
            for robot_segment in 0..num_robot_segments {
                let id = LookAheadJobIdentifier::new(
                    human.clone(),
                    human_segment,
                    robot.clone(),
                    robot_segment,
                );
                let mut trace = ModeTrace::new();
                trace.push_back(mode.clone(), 1.0);
                match self.factory.create_new(
                    id,
                    time,
                    sample.clone(),
                    trace,
                    LookAheadJobPath::new(),
                ) {
                    Ok(job) => {
                        if sample.is_empty() {
                            self.sleeping.enqueue(job);
                        } else {
                            self.waiting.enqueue(job);
                        }
                    }
                    // Another producer already created this job.
                    Err(JobError::AlreadyRegistered) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        debug!(%human, %robot, time, "pair promoted to jobs");
        Ok(true)
    }

    // ── Awakening ─────────────────────────────────────────────────────────

    /// Re-evaluate sleeping jobs against the newest human state; renewed
    /// jobs move to waiting, the rest go back to sleep.
    fn awaken_sleeping_jobs(&self) {
        for job in self.sleeping.drain_all() {
            if !self.registry.has_human(job.id().human()) {
                continue;
            }
            let Ok(robot_history) = self.registry.robot_history(job.id().robot()) else {
                continue;
            };
            let instance = match self
                .registry
                .latest_human_instance_within(job.id().human(), robot_history.latest_time())
            {
                Ok(Some(instance)) => instance,
                _ => {
                    self.sleeping.enqueue(job);
                    continue;
                }
            };
            let time = instance.timestamp();
            if !robot_history.snapshot_at(time).can_look_ahead(time) {
                self.sleeping.enqueue(job);
                continue;
            }
            let Some(sample) = instance.samples().get(job.id().human_segment()).cloned() else {
                self.sleeping.enqueue(job);
                continue;
            };
            match self.factory.awaken(&job, time, &sample, &robot_history) {
                Ok(results) => {
                    for (new_job, result) in results {
                        match result {
                            JobAwakeningResult::Different => self.waiting.enqueue(new_job),
                            JobAwakeningResult::Unaffected
                            | JobAwakeningResult::Completed
                            | JobAwakeningResult::Uncomputable => self.sleeping.enqueue(new_job),
                        }
                    }
                }
                Err(e) => {
                    error!(id = %job.id(), error = %e, "failed to awaken job");
                    self.sleeping.enqueue(job);
                }
            }
        }
    }
}
