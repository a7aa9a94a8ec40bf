//! The runtime: worker pool, queue discipline, and notification emission.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use prox_broker::{
    BodyPresentationTopic, BrokerAccess, CollisionNotificationMessage, CollisionNotificationTopic,
    DistanceInterval, HumanStateTopic, RobotStateTopic, SegmentRef,
};
use prox_core::Interval;
use prox_jobs::{LookAheadJob, LookAheadJobFactory};
use tracing::{debug, error, info};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::queue::SyncQueue;
use crate::receiver::Receiver;
use crate::registry::BodyRegistry;
use crate::sender::Sender;

/// The collision-detection runtime.
///
/// Construction subscribes to the inbound topics and starts the worker
/// pool; dropping the runtime stops the workers and tears everything down.
/// In-flight jobs finish their current iteration, no job is cancelled
/// mid-processing.
pub struct Runtime {
    inner: Arc<RuntimeInner>,
    receiver: Receiver,
    workers: Vec<thread::JoinHandle<()>>,
}

struct RuntimeInner {
    registry: Arc<BodyRegistry>,
    waiting: Arc<SyncQueue<LookAheadJob>>,
    sleeping: Arc<SyncQueue<LookAheadJob>>,
    factory: LookAheadJobFactory,
    sender: Sender,
    stop: AtomicBool,
    availability: Arc<(Mutex<()>, Condvar)>,
    num_processing: AtomicUsize,
    num_processed: AtomicUsize,
    num_completed: AtomicUsize,
    num_collisions: AtomicUsize,
}

impl Runtime {
    /// Create with default topics.
    pub fn new(access: &dyn BrokerAccess, config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::with_topics(
            access,
            &BodyPresentationTopic::default(),
            &HumanStateTopic::default(),
            &RobotStateTopic::default(),
            &CollisionNotificationTopic::default(),
            config,
        )
    }

    /// Create with explicit topics.
    pub fn with_topics(
        access: &dyn BrokerAccess,
        bp_topic: &BodyPresentationTopic,
        hs_topic: &HumanStateTopic,
        rs_topic: &RobotStateTopic,
        cn_topic: &CollisionNotificationTopic,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let registry = Arc::new(BodyRegistry::new());
        let availability = Arc::new((Mutex::new(()), Condvar::new()));
        let signal = Arc::clone(&availability);
        let waiting = Arc::new(SyncQueue::with_callback(Box::new(move || {
            // Notify under the availability mutex so a worker between its
            // reservation check and its wait cannot miss the signal.
            let _guard = signal.0.lock().unwrap();
            signal.1.notify_one();
        })));
        let sleeping = Arc::new(SyncQueue::new());

        let sender = Sender::new(access.collision_notification_publisher(cn_topic)?);
        let receiver = Receiver::new(
            access,
            bp_topic,
            hs_topic,
            rs_topic,
            config.job_factory().clone(),
            config.history_retention(),
            config.history_purge_period(),
            Arc::clone(&registry),
            Arc::clone(&waiting),
            Arc::clone(&sleeping),
        )?;

        let inner = Arc::new(RuntimeInner {
            registry,
            waiting,
            sleeping,
            factory: config.job_factory().clone(),
            sender,
            stop: AtomicBool::new(false),
            availability,
            num_processing: AtomicUsize::new(0),
            num_processed: AtomicUsize::new(0),
            num_completed: AtomicUsize::new(0),
            num_collisions: AtomicUsize::new(0),
        });

        let mut workers = Vec::with_capacity(config.concurrency());
        for i in 0..config.concurrency() {
            let worker = Arc::clone(&inner);
            workers.push(
                thread::Builder::new()
                    .name(format!("la-{i}"))
                    .spawn(move || worker.worker_loop())
                    .expect("failed to spawn worker thread"),
            );
        }
        info!(workers = config.concurrency(), "runtime started");
        Ok(Self { inner, receiver, workers })
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn num_pending_human_robot_pairs(&self) -> usize {
        self.receiver.num_pending_human_robot_pairs()
    }

    pub fn num_segment_pairs(&self) -> usize {
        self.inner.registry.num_segment_pairs()
    }

    pub fn num_waiting_jobs(&self) -> usize {
        self.inner.waiting.len()
    }

    pub fn num_sleeping_jobs(&self) -> usize {
        self.inner.sleeping.len()
    }

    pub fn num_state_messages_received(&self) -> usize {
        self.receiver.num_state_messages_received()
    }

    pub fn num_processed(&self) -> usize {
        self.inner.num_processed.load(Ordering::Relaxed)
    }

    pub fn num_completed(&self) -> usize {
        self.inner.num_completed.load(Ordering::Relaxed)
    }

    pub fn num_collisions(&self) -> usize {
        self.inner.num_collisions.load(Ordering::Relaxed)
    }

    /// Whether no job is being processed and the waiting queue is empty.
    pub fn all_done(&self) -> bool {
        self.inner.num_processing.load(Ordering::Acquire) == 0 && self.inner.waiting.is_empty()
    }

    /// Reserve and process one waiting job synchronously.  Used by tests
    /// and by zero-worker (immediate) deployments.  A no-op when nothing
    /// is reservable.
    pub fn process_one_waiting_job(&self) -> Result<(), RuntimeError> {
        if !self.inner.waiting.try_reserve() {
            return Ok(());
        }
        self.inner.process_one_waiting_job()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.inner.stop.store(true, Ordering::Release);
        {
            let _guard = self.inner.availability.0.lock().unwrap();
            self.inner.availability.1.notify_all();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl RuntimeInner {
    fn worker_loop(&self) {
        loop {
            {
                let (lock, condvar) = &*self.availability;
                let mut guard = lock.lock().unwrap();
                loop {
                    if self.stop.load(Ordering::Acquire) {
                        return;
                    }
                    if self.waiting.try_reserve() {
                        self.num_processing.fetch_add(1, Ordering::AcqRel);
                        break;
                    }
                    guard = condvar.wait(guard).unwrap();
                }
            }
            let result = self.process_one_waiting_job();
            self.num_processing.fetch_sub(1, Ordering::AcqRel);
            if let Err(e) = result {
                // Invariant violations are not absorbed: the worker exits.
                error!(error = %e, "worker stopping on processing failure");
                return;
            }
        }
    }

    fn process_one_waiting_job(&self) -> Result<(), RuntimeError> {
        let Some(mut job) = self.waiting.dequeue() else {
            return Ok(());
        };
        let Some((human_head, human_tail)) = self
            .registry
            .human_keypoint_ids(job.id().human(), job.id().human_segment())
        else {
            debug!(id = %job.id(), "aborting job, human has been removed");
            return Ok(());
        };
        let robot_history = self.registry.robot_history(job.id().robot())?;
        let robot = robot_history.robot();
        let frequency = robot.message_frequency();
        self.num_processed.fetch_add(1, Ordering::Relaxed);

        debug!(
            id = %job.id(),
            path = %job.path(),
            time = job.initial_time(),
            trace_len = job.prediction_trace().len(),
            "processing job"
        );

        match job.earliest_collision_index(&robot_history)? {
            Some(collision_index) => {
                let snapshot = robot_history.snapshot_at(job.snapshot_time());
                let trace = job.prediction_trace();
                let starting_mode = trace.starting_mode();

                // How many samples away the collision is, as an interval
                // accumulated over the presences along the trace.
                let mut samples_between = Interval::singleton(collision_index);
                let sample_index =
                    snapshot.checked_sample_index(starting_mode, job.initial_time())?;
                let initial_range = snapshot.range_of_num_samples_in(starting_mode);
                if trace.len() == 1 {
                    samples_between = samples_between - sample_index;
                } else if sample_index > initial_range.lower() {
                    samples_between = samples_between
                        + Interval::new(0, initial_range.upper() - sample_index);
                } else {
                    samples_between = samples_between + initial_range - sample_index;
                }
                for i in 1..trace.len() - 1 {
                    samples_between =
                        samples_between + snapshot.range_of_num_samples_in(&trace.at(i).mode);
                }

                let to_ms = |n: usize| (1000 * n as u64) / frequency;
                let notification = CollisionNotificationMessage {
                    human: SegmentRef {
                        body_id: job.id().human().clone(),
                        segment_id: (human_head, human_tail),
                    },
                    robot: SegmentRef {
                        body_id: job.id().robot().clone(),
                        segment_id: (
                            robot.body().segment(job.id().robot_segment()).head_id().clone(),
                            robot.body().segment(job.id().robot_segment()).tail_id().clone(),
                        ),
                    },
                    current_time: job.initial_time(),
                    collision_distance: DistanceInterval {
                        lower: to_ms(samples_between.lower()),
                        upper: to_ms(samples_between.upper()),
                    },
                    collision_mode: Some(trace.ending_mode().clone()),
                    likelihood: trace.likelihood(),
                };
                info!(
                    id = %job.id(),
                    lower = notification.collision_distance.lower,
                    upper = notification.collision_distance.upper,
                    likelihood = notification.likelihood,
                    "collision predicted"
                );
                self.sender.put(notification);
                self.num_completed.fetch_add(1, Ordering::Relaxed);
                self.num_collisions.fetch_add(1, Ordering::Relaxed);
                if self.registry.has_human(job.id().human()) {
                    self.sleeping.enqueue(job);
                }
            }
            None => {
                if !self.registry.has_human(job.id().human()) {
                    return Ok(());
                }
                let successors = self.factory.create_next(&job, &robot_history)?;
                debug!(id = %job.id(), successors = successors.len(), "no collision found");
                if successors.is_empty() {
                    self.num_completed.fetch_add(1, Ordering::Relaxed);
                    self.sleeping.enqueue(job);
                } else {
                    for next in successors {
                        let duplicate = next.path().len() > job.path().len()
                            && self.factory.has_registered(
                                next.initial_time(),
                                next.id(),
                                next.path(),
                            );
                        if !duplicate {
                            self.waiting.enqueue(next);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
