//! MQTT broker access via `rumqttc`, QoS 2 throughout.
//!
//! Every publisher and subscriber owns its own client connection plus a
//! thread driving the event loop; dropping the handle disconnects and
//! joins.  Payloads are the JSON encodings from [`crate::message`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::broker::{BrokerAccess, Callback, Publisher, Subscriber};
use crate::error::BrokerError;
use crate::message::{
    BodyPresentationMessage, CollisionNotificationMessage, HumanStateMessage, RobotStateMessage,
};
use crate::topic::{
    BodyPresentationTopic, CollisionNotificationTopic, HumanStateTopic, RobotStateTopic,
};

static CLIENT_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_client_id(role: &str) -> String {
    format!("prox-{role}-{}", CLIENT_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// MQTT access to a broker at `host:port`.
#[derive(Clone, Debug)]
pub struct MqttBrokerAccess {
    host: String,
    port: u16,
}

impl MqttBrokerAccess {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    fn options(&self, role: &str) -> MqttOptions {
        MqttOptions::new(next_client_id(role), self.host.clone(), self.port)
    }
}

// ── Publisher ─────────────────────────────────────────────────────────────────

struct MqttPublisher<T> {
    client: Client,
    topic: String,
    driver: Option<thread::JoinHandle<()>>,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T: Serialize> MqttPublisher<T> {
    fn connect(access: &MqttBrokerAccess, topic: String) -> Result<Self, BrokerError> {
        let (client, connection) = Client::new(access.options("pub"), 16);
        let driver = drive_connection::<serde_json::Value>(connection, None);
        Ok(Self { client, topic, driver: Some(driver), _marker: std::marker::PhantomData })
    }
}

impl<T: Serialize + Send> Publisher<T> for MqttPublisher<T> {
    fn put(&self, message: &T) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(message)?;
        self.client
            .publish(&self.topic, QoS::ExactlyOnce, false, payload)
            .map_err(|e| BrokerError::Publish(e.to_string()))
    }
}

impl<T> Drop for MqttPublisher<T> {
    fn drop(&mut self) {
        let _ = self.client.disconnect();
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

// ── Subscriber ────────────────────────────────────────────────────────────────

struct MqttSubscriber {
    client: Client,
    driver: Option<thread::JoinHandle<()>>,
}

impl MqttSubscriber {
    fn connect<T: DeserializeOwned + 'static>(
        access: &MqttBrokerAccess,
        topic: String,
        callback: Callback<T>,
    ) -> Result<Self, BrokerError> {
        let (client, connection) = Client::new(access.options("sub"), 16);
        client
            .subscribe(&topic, QoS::ExactlyOnce)
            .map_err(|e| BrokerError::Subscribe(e.to_string()))?;
        let driver = drive_connection(connection, Some(callback));
        Ok(Self { client, driver: Some(driver) })
    }
}

impl Subscriber for MqttSubscriber {}

impl Drop for MqttSubscriber {
    fn drop(&mut self) {
        let _ = self.client.disconnect();
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

/// Drive the connection event loop until disconnection.  Incoming publishes
/// are decoded and handed to `callback` when one is given.
fn drive_connection<T: DeserializeOwned + 'static>(
    mut connection: Connection,
    callback: Option<Callback<T>>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("mqtt".into())
        .spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        if let Some(callback) = &callback {
                            match serde_json::from_slice::<T>(&publish.payload) {
                                Ok(message) => callback(message),
                                Err(e) => {
                                    warn!(topic = %publish.topic, error = %e, "undecodable payload");
                                }
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .expect("failed to spawn mqtt driver thread")
}

// ── BrokerAccess impl ─────────────────────────────────────────────────────────

impl BrokerAccess for MqttBrokerAccess {
    fn body_presentation_publisher(
        &self,
        topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Publisher<BodyPresentationMessage>>, BrokerError> {
        Ok(Box::new(MqttPublisher::connect(self, topic.0.clone())?))
    }

    fn human_state_publisher(
        &self,
        topic: &HumanStateTopic,
    ) -> Result<Box<dyn Publisher<HumanStateMessage>>, BrokerError> {
        Ok(Box::new(MqttPublisher::connect(self, topic.0.clone())?))
    }

    fn robot_state_publisher(
        &self,
        topic: &RobotStateTopic,
    ) -> Result<Box<dyn Publisher<RobotStateMessage>>, BrokerError> {
        Ok(Box::new(MqttPublisher::connect(self, topic.0.clone())?))
    }

    fn collision_notification_publisher(
        &self,
        topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Publisher<CollisionNotificationMessage>>, BrokerError> {
        Ok(Box::new(MqttPublisher::connect(self, topic.0.clone())?))
    }

    fn body_presentation_subscriber(
        &self,
        callback: Callback<BodyPresentationMessage>,
        topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(Box::new(MqttSubscriber::connect(self, topic.0.clone(), callback)?))
    }

    fn human_state_subscriber(
        &self,
        callback: Callback<HumanStateMessage>,
        topic: &HumanStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(Box::new(MqttSubscriber::connect(self, topic.0.clone(), callback)?))
    }

    fn robot_state_subscriber(
        &self,
        callback: Callback<RobotStateMessage>,
        topic: &RobotStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(Box::new(MqttSubscriber::connect(self, topic.0.clone(), callback)?))
    }

    fn collision_notification_subscriber(
        &self,
        callback: Callback<CollisionNotificationMessage>,
        topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(Box::new(MqttSubscriber::connect(self, topic.0.clone(), callback)?))
    }
}
