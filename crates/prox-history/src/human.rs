//! Human state history.

use std::collections::{BTreeMap, VecDeque};

use prox_body::{BodySegmentSample, Human, KeypointId};
use prox_core::{Point, Timestamp};

use crate::error::HistoryError;

/// One timestamped observation of a human: a sample per body segment.
#[derive(Clone, Debug)]
pub struct HumanStateInstance {
    timestamp: Timestamp,
    samples: Vec<BodySegmentSample>,
}

impl HumanStateInstance {
    /// Build the per-segment samples from keypoint observations.
    ///
    /// A keypoint missing from `points` simply contributes no observations;
    /// the affected segment samples stay empty (tolerable missing state).
    pub fn new(
        human: &Human,
        points: &BTreeMap<KeypointId, Vec<Point>>,
        timestamp: Timestamp,
    ) -> Self {
        let samples = (0..human.body().num_segments())
            .map(|i| {
                let segment = human.body().segment(i);
                let heads = points.get(segment.head_id()).map_or(&[][..], Vec::as_slice);
                let tails = points.get(segment.tail_id()).map_or(&[][..], Vec::as_slice);
                segment.create_sample_from(heads, tails)
            })
            .collect();
        Self { timestamp, samples }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The samples for each segment, in segment order.
    pub fn samples(&self) -> &[BodySegmentSample] {
        &self.samples
    }
}

/// Append-only log of the states reached by one human.
#[derive(Debug)]
pub struct HumanStateHistory {
    human: Human,
    instances: VecDeque<HumanStateInstance>,
}

impl HumanStateHistory {
    pub fn new(human: Human) -> Self {
        Self { human, instances: VecDeque::new() }
    }

    pub fn human(&self) -> &Human {
        &self.human
    }

    /// Append an instance built from keypoint observations.
    pub fn acquire(&mut self, points: &BTreeMap<KeypointId, Vec<Point>>, timestamp: Timestamp) {
        self.instances
            .push_back(HumanStateInstance::new(&self.human, points, timestamp));
    }

    /// Whether any instance has timestamp at or before `timestamp`.
    pub fn has_instances_within(&self, timestamp: Timestamp) -> bool {
        self.instances.front().is_some_and(|i| i.timestamp <= timestamp)
    }

    /// The latest instance with timestamp at or before `timestamp`.
    pub fn latest_within(
        &self,
        timestamp: Timestamp,
    ) -> Result<&HumanStateInstance, HistoryError> {
        self.instances
            .iter()
            .rev()
            .find(|i| i.timestamp <= timestamp)
            .ok_or(HistoryError::NoInstanceWithin(timestamp))
    }

    /// Number of instances between the ones at exactly `lower` and `upper`.
    ///
    /// Fails if either timestamp has no instance.
    pub fn instance_distance(
        &self,
        lower: Timestamp,
        upper: Timestamp,
    ) -> Result<usize, HistoryError> {
        let upper_idx = self.instance_number(upper)?;
        let lower_idx = self.instance_number(lower)?;
        Ok(upper_idx - lower_idx)
    }

    /// Index of the instance with exactly `timestamp`; fails if absent.
    pub fn instance_number(&self, timestamp: Timestamp) -> Result<usize, HistoryError> {
        self.instances
            .iter()
            .rposition(|i| i.timestamp == timestamp)
            .ok_or(HistoryError::InstanceNotFound(timestamp))
    }

    /// The instance at `idx`.  Panics if out of range.
    pub fn at(&self, idx: usize) -> &HumanStateInstance {
        &self.instances[idx]
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Timestamp of the newest instance, if any.
    pub fn latest_timestamp(&self) -> Option<Timestamp> {
        self.instances.back().map(|i| i.timestamp)
    }

    /// Drop instances strictly older than `timestamp`.
    pub fn purge_older_than(&mut self, timestamp: Timestamp) {
        while self
            .instances
            .front()
            .is_some_and(|i| i.timestamp < timestamp)
        {
            self.instances.pop_front();
        }
    }
}
