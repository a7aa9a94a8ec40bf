//! `prox-broker` — the runtime's connection to the outside world.
//!
//! Four topic families flow through a pluggable publish/subscribe broker:
//! body presentations, human states, robot states (inbound) and collision
//! notifications (outbound).  The core consumes only the [`BrokerAccess`]
//! trait; the in-memory implementation backs tests and single-process
//! deployments, and an MQTT implementation is available behind the `mqtt`
//! feature.
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`message`] | the four wire messages with their exact JSON shapes     |
//! | [`topic`]   | topic names per family                                  |
//! | [`broker`]  | `BrokerAccess`, `Publisher`, `Subscriber` traits        |
//! | [`memory`]  | in-memory broker (shared lists + polling subscribers)   |
//! | [`mqtt`]    | MQTT access via `rumqttc` (feature `mqtt`)              |

pub mod broker;
pub mod error;
pub mod memory;
pub mod message;
pub mod topic;

#[cfg(feature = "mqtt")]
pub mod mqtt;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use broker::{BrokerAccess, Callback, Publisher, Subscriber};
pub use error::BrokerError;
pub use memory::{MemoryBroker, MemoryBrokerAccess};
pub use message::{
    BodyPresentationMessage, CollisionNotificationMessage, DistanceInterval, HumanStateBody,
    HumanStateMessage, RobotStateMessage, SegmentRef,
};
pub use topic::{
    BodyPresentationTopic, CollisionNotificationTopic, HumanStateTopic, RobotStateTopic,
};
