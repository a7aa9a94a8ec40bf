//! Outbound notification pump.
//!
//! Notifications are queued by the workers and published from a dedicated
//! thread, so a slow transport never blocks job processing.  On shutdown
//! the thread is stopped and any queued unsent notifications are
//! discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use prox_broker::{CollisionNotificationMessage, Publisher};
use tracing::error;

use crate::queue::SyncQueue;

pub struct Sender {
    queue: Arc<SyncQueue<CollisionNotificationMessage>>,
    stop: Arc<AtomicBool>,
    availability: Arc<(Mutex<()>, Condvar)>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Sender {
    pub fn new(publisher: Box<dyn Publisher<CollisionNotificationMessage>>) -> Self {
        let queue = Arc::new(SyncQueue::new());
        let stop = Arc::new(AtomicBool::new(false));
        let availability = Arc::new((Mutex::new(()), Condvar::new()));

        let worker_queue = Arc::clone(&queue);
        let worker_stop = Arc::clone(&stop);
        let worker_availability = Arc::clone(&availability);
        let handle = thread::Builder::new()
            .name("cn-send".into())
            .spawn(move || {
                loop {
                    {
                        let (lock, condvar) = &*worker_availability;
                        let mut guard = lock.lock().unwrap();
                        while !worker_stop.load(Ordering::Acquire)
                            && !worker_queue.can_reserve()
                        {
                            guard = condvar.wait(guard).unwrap();
                        }
                    }
                    if worker_stop.load(Ordering::Acquire) {
                        return;
                    }
                    if worker_queue.try_reserve() {
                        if let Some(message) = worker_queue.dequeue() {
                            if let Err(e) = publisher.put(&message) {
                                error!(error = %e, "failed to publish collision notification");
                            }
                        }
                    }
                }
            })
            .expect("failed to spawn sender thread");

        Self { queue, stop, availability, handle: Some(handle) }
    }

    /// Queue a notification for publication.
    pub fn put(&self, message: CollisionNotificationMessage) {
        self.queue.enqueue(message);
        let _guard = self.availability.0.lock().unwrap();
        self.availability.1.notify_one();
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        {
            let _guard = self.availability.0.lock().unwrap();
            self.availability.1.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
