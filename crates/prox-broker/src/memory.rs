//! In-memory broker: shared append-only lists per message type, with a
//! background polling loop per subscriber.
//!
//! The broker is an explicit context object shared by `Arc`; construct it
//! once at process start and hand clones of the access to the runtime and
//! to test publishers.  Messages accumulate indefinitely (single-process
//! lifetimes only).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::broker::{BrokerAccess, Callback, Publisher, Subscriber};
use crate::error::BrokerError;
use crate::message::{
    BodyPresentationMessage, CollisionNotificationMessage, HumanStateMessage, RobotStateMessage,
};
use crate::topic::{
    BodyPresentationTopic, CollisionNotificationTopic, HumanStateTopic, RobotStateTopic,
};

const POLL_INTERVAL: Duration = Duration::from_micros(100);

// ── MemoryBroker ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Store {
    body_presentations: Vec<BodyPresentationMessage>,
    human_states: Vec<HumanStateMessage>,
    robot_states: Vec<RobotStateMessage>,
    collision_notifications: Vec<CollisionNotificationMessage>,
}

/// Holds every published message in memory, per type.
#[derive(Default)]
pub struct MemoryBroker {
    store: Mutex<Store>,
}

impl MemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Remove all content (useful between tests).
    pub fn clear(&self) {
        let mut store = self.store.lock().unwrap();
        *store = Store::default();
    }
}

/// Selects the per-type list inside the broker store.
pub(crate) trait MemoryChannel: Clone + Send + 'static {
    fn append(broker: &MemoryBroker, message: Self);
    fn get(broker: &MemoryBroker, idx: usize) -> Option<Self>;
    fn len(broker: &MemoryBroker) -> usize;
}

macro_rules! memory_channel {
    ($message:ty, $field:ident) => {
        impl MemoryChannel for $message {
            fn append(broker: &MemoryBroker, message: Self) {
                broker.store.lock().unwrap().$field.push(message);
            }
            fn get(broker: &MemoryBroker, idx: usize) -> Option<Self> {
                broker.store.lock().unwrap().$field.get(idx).cloned()
            }
            fn len(broker: &MemoryBroker) -> usize {
                broker.store.lock().unwrap().$field.len()
            }
        }
    };
}

memory_channel!(BodyPresentationMessage, body_presentations);
memory_channel!(HumanStateMessage, human_states);
memory_channel!(RobotStateMessage, robot_states);
memory_channel!(CollisionNotificationMessage, collision_notifications);

// ── Publisher / Subscriber ────────────────────────────────────────────────────

struct MemoryPublisher<T> {
    broker: Arc<MemoryBroker>,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T: MemoryChannel> Publisher<T> for MemoryPublisher<T> {
    fn put(&self, message: &T) -> Result<(), BrokerError> {
        T::append(&self.broker, message.clone());
        Ok(())
    }
}

/// Polls the shared list from the index it was created at; later messages
/// are delivered in order on a dedicated thread.
struct MemorySubscriber {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MemorySubscriber {
    fn spawn<T: MemoryChannel>(broker: Arc<MemoryBroker>, callback: Callback<T>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("mem-sub".into())
            .spawn(move || {
                let mut next = T::len(&broker);
                tracing::debug!(start = next, "memory subscriber polling");
                while !stop_flag.load(Ordering::Acquire) {
                    while let Some(message) = T::get(&broker, next) {
                        callback(message);
                        next += 1;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            })
            .expect("failed to spawn memory subscriber thread");
        Self { stop, handle: Some(handle) }
    }
}

impl Subscriber for MemorySubscriber {}

impl Drop for MemorySubscriber {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ── MemoryBrokerAccess ────────────────────────────────────────────────────────

/// Broker access backed by a shared [`MemoryBroker`].  Topics are ignored:
/// the in-memory transport keeps one list per message type.
#[derive(Clone)]
pub struct MemoryBrokerAccess {
    broker: Arc<MemoryBroker>,
}

impl MemoryBrokerAccess {
    pub fn new(broker: Arc<MemoryBroker>) -> Self {
        Self { broker }
    }

    fn publisher<T: MemoryChannel>(&self) -> Box<dyn Publisher<T>> {
        Box::new(MemoryPublisher {
            broker: Arc::clone(&self.broker),
            _marker: std::marker::PhantomData,
        })
    }

    fn subscriber<T: MemoryChannel>(&self, callback: Callback<T>) -> Box<dyn Subscriber> {
        Box::new(MemorySubscriber::spawn(Arc::clone(&self.broker), callback))
    }
}

impl BrokerAccess for MemoryBrokerAccess {
    fn body_presentation_publisher(
        &self,
        _topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Publisher<BodyPresentationMessage>>, BrokerError> {
        Ok(self.publisher())
    }

    fn human_state_publisher(
        &self,
        _topic: &HumanStateTopic,
    ) -> Result<Box<dyn Publisher<HumanStateMessage>>, BrokerError> {
        Ok(self.publisher())
    }

    fn robot_state_publisher(
        &self,
        _topic: &RobotStateTopic,
    ) -> Result<Box<dyn Publisher<RobotStateMessage>>, BrokerError> {
        Ok(self.publisher())
    }

    fn collision_notification_publisher(
        &self,
        _topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Publisher<CollisionNotificationMessage>>, BrokerError> {
        Ok(self.publisher())
    }

    fn body_presentation_subscriber(
        &self,
        callback: Callback<BodyPresentationMessage>,
        _topic: &BodyPresentationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(self.subscriber(callback))
    }

    fn human_state_subscriber(
        &self,
        callback: Callback<HumanStateMessage>,
        _topic: &HumanStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(self.subscriber(callback))
    }

    fn robot_state_subscriber(
        &self,
        callback: Callback<RobotStateMessage>,
        _topic: &RobotStateTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(self.subscriber(callback))
    }

    fn collision_notification_subscriber(
        &self,
        callback: Callback<CollisionNotificationMessage>,
        _topic: &CollisionNotificationTopic,
    ) -> Result<Box<dyn Subscriber>, BrokerError> {
        Ok(self.subscriber(callback))
    }
}
