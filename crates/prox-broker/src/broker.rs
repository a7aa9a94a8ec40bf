//! The broker access seam the core consumes.

use crate::error::BrokerError;
use crate::message::{
    BodyPresentationMessage, CollisionNotificationMessage, HumanStateMessage, RobotStateMessage,
};
use crate::topic::{
    BodyPresentationTopic, CollisionNotificationTopic, HumanStateTopic, RobotStateTopic,
};

/// Callback invoked once per received value.
pub type Callback<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Publishes values to one topic.
pub trait Publisher<T>: Send {
    fn put(&self, message: &T) -> Result<(), BrokerError>;
}

/// A live subscription.  Dropping the handle ends delivery; implementations
/// stop their delivery thread before the callback is released.
pub trait Subscriber: Send {}

/// Access to a communication broker: publisher and subscriber factories for
/// the four topic families.
pub trait BrokerAccess: Send + Sync {
    fn body_presentation_publisher(
        &self,
        topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Publisher<BodyPresentationMessage>>, BrokerError>;

    fn human_state_publisher(
        &self,
        topic: &HumanStateTopic,
    ) -> Result<Box<dyn Publisher<HumanStateMessage>>, BrokerError>;

    fn robot_state_publisher(
        &self,
        topic: &RobotStateTopic,
    ) -> Result<Box<dyn Publisher<RobotStateMessage>>, BrokerError>;

    fn collision_notification_publisher(
        &self,
        topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Publisher<CollisionNotificationMessage>>, BrokerError>;

    fn body_presentation_subscriber(
        &self,
        callback: Callback<BodyPresentationMessage>,
        topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError>;

    fn human_state_subscriber(
        &self,
        callback: Callback<HumanStateMessage>,
        topic: &HumanStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError>;

    fn robot_state_subscriber(
        &self,
        callback: Callback<RobotStateMessage>,
        topic: &RobotStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError>;

    fn collision_notification_subscriber(
        &self,
        callback: Callback<CollisionNotificationMessage>,
        topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError>;
}
