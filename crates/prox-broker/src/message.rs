//! The four wire messages.
//!
//! JSON shapes are fixed by the protocol: human keypoints travel as
//! `{"x":…,"y":…,"z":…}` objects, robot continuous state as `[x,y,z]`
//! triples, modes as plain string maps.  Timestamps are integer
//! milliseconds, frequencies integer Hz, everything else IEEE doubles.

use std::collections::BTreeMap;

use prox_body::{BodyId, KeypointId, Mode};
use prox_core::{Frequency, Point, Timestamp};
use serde::{Deserialize, Serialize};

// ── Point encodings ───────────────────────────────────────────────────────────

/// `{"x":…,"y":…,"z":…}` encoding used by human state keypoints.
mod object_points {
    use std::collections::BTreeMap;

    use prox_core::Point;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct PointObject {
        x: f64,
        y: f64,
        z: f64,
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Vec<Point>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (keypoint, points) in map {
            let objects: Vec<PointObject> = points
                .iter()
                .map(|p| PointObject { x: p.x, y: p.y, z: p.z })
                .collect();
            out.serialize_entry(keypoint, &objects)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<Point>>, D::Error> {
        let raw: BTreeMap<String, Vec<PointObject>> = Deserialize::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(k, v)| {
                (k, v.into_iter().map(|p| Point::new(p.x, p.y, p.z)).collect())
            })
            .collect())
    }
}

/// `[x,y,z]` encoding used by robot continuous state.
mod array_points {
    use prox_core::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        points: &[Vec<Point>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let raw: Vec<Vec<[f64; 3]>> = points
            .iter()
            .map(|track| track.iter().map(|p| [p.x, p.y, p.z]).collect())
            .collect();
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<Point>>, D::Error> {
        let raw: Vec<Vec<[f64; 3]>> = Deserialize::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|track| {
                track
                    .into_iter()
                    .map(|[x, y, z]| Point::new(x, y, z))
                    .collect()
            })
            .collect())
    }
}

// ── BodyPresentationMessage ───────────────────────────────────────────────────

/// Inbound: introduces a body and its topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPresentationMessage {
    pub id: BodyId,
    pub is_human: bool,
    /// Sending frequency in Hz; absent for humans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_frequency: Option<Frequency>,
    pub segment_pairs: Vec<(KeypointId, KeypointId)>,
    pub thicknesses: Vec<f64>,
}

impl BodyPresentationMessage {
    pub fn human(
        id: BodyId,
        segment_pairs: Vec<(KeypointId, KeypointId)>,
        thicknesses: Vec<f64>,
    ) -> Self {
        Self { id, is_human: true, message_frequency: None, segment_pairs, thicknesses }
    }

    pub fn robot(
        id: BodyId,
        message_frequency: Frequency,
        segment_pairs: Vec<(KeypointId, KeypointId)>,
        thicknesses: Vec<f64>,
    ) -> Self {
        Self {
            id,
            is_human: false,
            message_frequency: Some(message_frequency),
            segment_pairs,
            thicknesses,
        }
    }
}

// ── HumanStateMessage ─────────────────────────────────────────────────────────

/// One human's keypoint observations within a state message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanStateBody {
    pub body_id: BodyId,
    #[serde(with = "object_points")]
    pub keypoints: BTreeMap<KeypointId, Vec<Point>>,
}

/// Inbound: timestamped keypoint observations for one or more humans.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HumanStateMessage {
    pub bodies: Vec<HumanStateBody>,
    pub timestamp: Timestamp,
}

// ── RobotStateMessage ─────────────────────────────────────────────────────────

/// Inbound: one robot's mode and continuous state, one point track per
/// keypoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotStateMessage {
    pub body_id: BodyId,
    pub mode: Mode,
    #[serde(with = "array_points")]
    pub continuous_state: Vec<Vec<Point>>,
    pub timestamp: Timestamp,
}

// ── CollisionNotificationMessage ──────────────────────────────────────────────

/// A body segment referenced by its keypoint pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    pub body_id: BodyId,
    pub segment_id: (KeypointId, KeypointId),
}

/// A future time window, in milliseconds from the current time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceInterval {
    pub lower: Timestamp,
    pub upper: Timestamp,
}

/// Outbound: a predicted intersection of one human segment and one robot
/// segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionNotificationMessage {
    pub human: SegmentRef,
    pub robot: SegmentRef,
    pub current_time: Timestamp,
    pub collision_distance: DistanceInterval,
    /// The robot's predicted mode at the collision; omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_mode: Option<Mode>,
    pub likelihood: f64,
}
