//! Body topology: ordered keypoints and thick segments between them.
//!
//! Segments are stored inside the body by index and reference their
//! endpoints by keypoint id; samples carry only the segment index and
//! thickness, so nothing here owns a back-reference.

use prox_core::{Frequency, Point};

use crate::error::BodyError;
use crate::sample::BodySegmentSample;

pub type BodyId = String;
pub type KeypointId = String;

/// A thick line segment between two named keypoints.
#[derive(Clone, Debug)]
pub struct BodySegment {
    index: usize,
    head_id: KeypointId,
    tail_id: KeypointId,
    thickness: f64,
}

impl BodySegment {
    /// Index of the segment within its body.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identifier of the head keypoint.
    pub fn head_id(&self) -> &KeypointId {
        &self.head_id
    }

    /// Identifier of the tail keypoint.
    pub fn tail_id(&self) -> &KeypointId {
        &self.tail_id
    }

    /// Thickness of the body segment around the geometrical segment.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Create an empty sample for this segment.
    pub fn create_sample(&self) -> BodySegmentSample {
        BodySegmentSample::empty(self.index, self.thickness)
    }

    /// Create a sample already updated with the given head/tail points.
    pub fn create_sample_from(&self, heads: &[Point], tails: &[Point]) -> BodySegmentSample {
        let mut sample = self.create_sample();
        sample.update(heads, tails);
        sample
    }
}

/// A generic body having segments.
#[derive(Clone, Debug)]
pub struct Body {
    id: BodyId,
    keypoint_ids: Vec<KeypointId>,
    segments: Vec<BodySegment>,
}

impl Body {
    /// Build from segment endpoint pairs and per-segment thicknesses.
    ///
    /// Keypoint ids are collected in order of first appearance.
    pub fn new(
        id: BodyId,
        segment_pairs: &[(KeypointId, KeypointId)],
        thicknesses: &[f64],
    ) -> Result<Self, BodyError> {
        if segment_pairs.len() != thicknesses.len() {
            return Err(BodyError::MismatchedThicknesses {
                id,
                pairs: segment_pairs.len(),
                thicknesses: thicknesses.len(),
            });
        }
        if thicknesses.iter().any(|t| *t < 0.0) {
            return Err(BodyError::NegativeThickness(id));
        }

        let mut keypoint_ids: Vec<KeypointId> = Vec::new();
        let mut segments = Vec::with_capacity(segment_pairs.len());
        for (i, ((head, tail), thickness)) in
            segment_pairs.iter().zip(thicknesses).enumerate()
        {
            if !keypoint_ids.contains(head) {
                keypoint_ids.push(head.clone());
            }
            if !keypoint_ids.contains(tail) {
                keypoint_ids.push(tail.clone());
            }
            segments.push(BodySegment {
                index: i,
                head_id: head.clone(),
                tail_id: tail.clone(),
                thickness: *thickness,
            });
        }
        Ok(Self { id, keypoint_ids, segments })
    }

    pub fn id(&self) -> &BodyId {
        &self.id
    }

    /// The identifiers for each keypoint, with defined order.
    pub fn keypoint_ids(&self) -> &[KeypointId] {
        &self.keypoint_ids
    }

    /// The segment at `idx`.  Panics if out of range.
    pub fn segment(&self, idx: usize) -> &BodySegment {
        &self.segments[idx]
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Number of keypoints; used for consistency checks on incoming samples.
    pub fn num_points(&self) -> usize {
        self.keypoint_ids.len()
    }
}

/// A human is a body able to get a singular state.
#[derive(Clone, Debug)]
pub struct Human {
    body: Body,
}

impl Human {
    pub fn new(
        id: BodyId,
        segment_pairs: &[(KeypointId, KeypointId)],
        thicknesses: &[f64],
    ) -> Result<Self, BodyError> {
        Ok(Self { body: Body::new(id, segment_pairs, thicknesses)? })
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

/// A robot is a body able to have its history.  It additionally carries the
/// frequency at which it emits state messages.
#[derive(Clone, Debug)]
pub struct Robot {
    body: Body,
    message_frequency: Frequency,
}

impl Robot {
    pub fn new(
        id: BodyId,
        message_frequency: Frequency,
        segment_pairs: &[(KeypointId, KeypointId)],
        thicknesses: &[f64],
    ) -> Result<Self, BodyError> {
        if message_frequency == 0 {
            return Err(BodyError::ZeroMessageFrequency(id));
        }
        Ok(Self {
            body: Body::new(id, segment_pairs, thicknesses)?,
            message_frequency,
        })
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The frequency of messages sent by the robot, in Hz.
    pub fn message_frequency(&self) -> Frequency {
        self.message_frequency
    }
}
