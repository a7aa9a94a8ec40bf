//! Process-wide catalog of bodies and their histories.
//!
//! One mutex per body kind guards insertion, removal, and lookup; the
//! history handles handed out are `Arc`s, stable for the body's lifetime,
//! and carry their own finer-grained locking.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use prox_body::{BodyId, Human, KeypointId, Robot};
use prox_broker::{BodyPresentationMessage, HumanStateMessage, RobotStateMessage};
use prox_core::{Point, Timestamp};
use prox_history::{HumanStateHistory, HumanStateInstance, RobotStateHistory};
use tracing::debug;

use crate::error::RegistryError;

/// A registry for bodies introduced by presentation messages.  Used as the
/// synchronised source for body data instead of passing bodies around.
#[derive(Default)]
pub struct BodyRegistry {
    humans: Mutex<BTreeMap<BodyId, Arc<Mutex<HumanStateHistory>>>>,
    robots: Mutex<BTreeMap<BodyId, Arc<RobotStateHistory>>>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn contains(&self, id: &BodyId) -> bool {
        self.has_human(id) || self.has_robot(id)
    }

    pub fn has_human(&self, id: &BodyId) -> bool {
        self.humans.lock().unwrap().contains_key(id)
    }

    pub fn has_robot(&self, id: &BodyId) -> bool {
        self.robots.lock().unwrap().contains_key(id)
    }

    pub fn num_humans(&self) -> usize {
        self.humans.lock().unwrap().len()
    }

    pub fn num_robots(&self) -> usize {
        self.robots.lock().unwrap().len()
    }

    pub fn human_ids(&self) -> Vec<BodyId> {
        self.humans.lock().unwrap().keys().cloned().collect()
    }

    pub fn robot_ids(&self) -> Vec<BodyId> {
        self.robots.lock().unwrap().keys().cloned().collect()
    }

    /// Human-segment × robot-segment pairs implied by the registered bodies.
    pub fn num_segment_pairs(&self) -> usize {
        let human_segments: usize = self
            .humans
            .lock()
            .unwrap()
            .values()
            .map(|h| h.lock().unwrap().human().body().num_segments())
            .sum();
        let robot_segments: usize = self
            .robots
            .lock()
            .unwrap()
            .values()
            .map(|r| r.robot().body().num_segments())
            .sum();
        human_segments * robot_segments
    }

    pub fn human(&self, id: &BodyId) -> Result<Human, RegistryError> {
        self.humans
            .lock()
            .unwrap()
            .get(id)
            .map(|h| h.lock().unwrap().human().clone())
            .ok_or_else(|| RegistryError::BodyNotFound(id.clone()))
    }

    pub fn robot(&self, id: &BodyId) -> Result<Robot, RegistryError> {
        self.robots
            .lock()
            .unwrap()
            .get(id)
            .map(|r| r.robot().clone())
            .ok_or_else(|| RegistryError::BodyNotFound(id.clone()))
    }

    /// The robot's history handle, stable for the body's lifetime.
    pub fn robot_history(&self, id: &BodyId) -> Result<Arc<RobotStateHistory>, RegistryError> {
        self.robots
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::BodyNotFound(id.clone()))
    }

    /// Head/tail keypoint ids of one human segment, or `None` when the
    /// human has been removed in the meantime.
    pub fn human_keypoint_ids(
        &self,
        human_id: &BodyId,
        segment: usize,
    ) -> Option<(KeypointId, KeypointId)> {
        let humans = self.humans.lock().unwrap();
        let history = humans.get(human_id)?.lock().unwrap();
        let body = history.human().body();
        if segment >= body.num_segments() {
            return None;
        }
        let segment = body.segment(segment);
        Some((segment.head_id().clone(), segment.tail_id().clone()))
    }

    // ── Human history queries ─────────────────────────────────────────────

    pub fn has_human_instances_within(
        &self,
        id: &BodyId,
        timestamp: Timestamp,
    ) -> Result<bool, RegistryError> {
        self.with_human_history(id, |h| h.has_instances_within(timestamp))
    }

    /// The latest instance at or before `timestamp`, cloned out of the lock.
    pub fn latest_human_instance_within(
        &self,
        id: &BodyId,
        timestamp: Timestamp,
    ) -> Result<Option<HumanStateInstance>, RegistryError> {
        self.with_human_history(id, |h| h.latest_within(timestamp).ok().cloned())
    }

    pub fn latest_human_timestamp(
        &self,
        id: &BodyId,
    ) -> Result<Option<Timestamp>, RegistryError> {
        self.with_human_history(id, HumanStateHistory::latest_timestamp)
    }

    pub fn human_history_len(&self, id: &BodyId) -> Result<usize, RegistryError> {
        self.with_human_history(id, HumanStateHistory::len)
    }

    /// Number of instances between the exact timestamps `lower` and `upper`.
    pub fn instance_distance(
        &self,
        id: &BodyId,
        lower: Timestamp,
        upper: Timestamp,
    ) -> Result<usize, RegistryError> {
        Ok(self.with_human_history(id, |h| h.instance_distance(lower, upper))??)
    }

    /// Index of the instance at exactly `timestamp`.
    pub fn instance_number(
        &self,
        id: &BodyId,
        timestamp: Timestamp,
    ) -> Result<usize, RegistryError> {
        Ok(self.with_human_history(id, |h| h.instance_number(timestamp))??)
    }

    fn with_human_history<R>(
        &self,
        id: &BodyId,
        f: impl FnOnce(&HumanStateHistory) -> R,
    ) -> Result<R, RegistryError> {
        let humans = self.humans.lock().unwrap();
        let history = humans
            .get(id)
            .ok_or_else(|| RegistryError::BodyNotFound(id.clone()))?;
        let guard = history.lock().unwrap();
        Ok(f(&guard))
    }

    // ── Ingestion ─────────────────────────────────────────────────────────

    /// Create the body a presentation message describes.  Re-presenting an
    /// already-known id is a no-op (presentations may be re-broadcast).
    pub fn insert(&self, presentation: &BodyPresentationMessage) -> Result<(), RegistryError> {
        if self.contains(&presentation.id) {
            return Ok(());
        }
        if presentation.is_human {
            self.insert_human(
                presentation.id.clone(),
                &presentation.segment_pairs,
                &presentation.thicknesses,
            )
        } else {
            self.insert_robot(
                presentation.id.clone(),
                presentation.message_frequency.unwrap_or(0),
                &presentation.segment_pairs,
                &presentation.thicknesses,
            )
        }
    }

    /// Register a new human.  A duplicate id is a caller error.
    pub fn insert_human(
        &self,
        id: BodyId,
        segment_pairs: &[(KeypointId, KeypointId)],
        thicknesses: &[f64],
    ) -> Result<(), RegistryError> {
        if self.contains(&id) {
            return Err(RegistryError::DuplicateBody(id));
        }
        let human = Human::new(id.clone(), segment_pairs, thicknesses)?;
        self.humans
            .lock()
            .unwrap()
            .insert(id, Arc::new(Mutex::new(HumanStateHistory::new(human))));
        Ok(())
    }

    /// Register a new robot.  A duplicate id is a caller error.
    pub fn insert_robot(
        &self,
        id: BodyId,
        message_frequency: u64,
        segment_pairs: &[(KeypointId, KeypointId)],
        thicknesses: &[f64],
    ) -> Result<(), RegistryError> {
        if self.contains(&id) {
            return Err(RegistryError::DuplicateBody(id));
        }
        let robot = Robot::new(id.clone(), message_frequency, segment_pairs, thicknesses)?;
        self.robots
            .lock()
            .unwrap()
            .insert(id, Arc::new(RobotStateHistory::new(robot)));
        Ok(())
    }

    /// Route a human state message to the histories it addresses.  Bodies
    /// unknown to the registry are skipped; an instance is only appended
    /// when its timestamp advances the history.
    pub fn acquire_human_state(&self, message: &HumanStateMessage) {
        let humans = self.humans.lock().unwrap();
        for body in &message.bodies {
            let Some(history) = humans.get(&body.body_id) else {
                debug!(body = %body.body_id, "state for unknown human skipped");
                continue;
            };
            let mut history = history.lock().unwrap();
            let advances = history
                .latest_timestamp()
                .is_none_or(|latest| message.timestamp > latest);
            if advances {
                history.acquire(&body.keypoints, message.timestamp);
            }
        }
    }

    /// Route a robot state message to the robot's history.
    pub fn acquire_robot_state(&self, message: &RobotStateMessage) -> Result<(), RegistryError> {
        let history = self.robot_history(&message.body_id)?;
        let keypoint_ids = history.robot().body().keypoint_ids().to_vec();
        if keypoint_ids.len() != message.continuous_state.len() {
            return Err(RegistryError::History(
                prox_history::HistoryError::KeypointCountMismatch {
                    expected: keypoint_ids.len(),
                    got: message.continuous_state.len(),
                },
            ));
        }
        let points: BTreeMap<KeypointId, Vec<Point>> = keypoint_ids
            .into_iter()
            .zip(message.continuous_state.iter().cloned())
            .collect();
        history.acquire(&message.mode, &points, message.timestamp)?;
        Ok(())
    }

    /// Drop human history entries strictly older than `timestamp`.
    pub fn purge_human_history(&self, id: &BodyId, timestamp: Timestamp) {
        if let Some(history) = self.humans.lock().unwrap().get(id) {
            history.lock().unwrap().purge_older_than(timestamp);
        }
    }

    /// Drop robot history state no timestamp ≥ `timestamp` can resolve.
    pub fn purge_robot_history(&self, id: &BodyId, timestamp: Timestamp) {
        if let Some(history) = self.robots.lock().unwrap().get(id) {
            history.purge_older_than(timestamp);
        }
    }

    /// Erase a body.
    pub fn remove(&self, id: &BodyId) -> Result<(), RegistryError> {
        if self.humans.lock().unwrap().remove(id).is_some() {
            return Ok(());
        }
        if self.robots.lock().unwrap().remove(id).is_some() {
            return Ok(());
        }
        Err(RegistryError::BodyNotFound(id.clone()))
    }

    /// Remove all bodies.
    pub fn clear(&self) {
        self.humans.lock().unwrap().clear();
        self.robots.lock().unwrap().clear();
    }
}
