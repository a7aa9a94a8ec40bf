//! The `prox` daemon: runs the collision-prediction runtime against a
//! broker until interrupted.
//!
//! Without the `mqtt` feature the daemon serves an in-process memory
//! broker, which is mostly useful for smoke-testing the pipeline; compiled
//! with `mqtt` it connects to the broker named by `PROX_MQTT_HOST` /
//! `PROX_MQTT_PORT` (default `localhost:1883`).

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use prox_runtime::{Runtime, RuntimeConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Predictive human-robot collision detection runtime.
#[derive(Parser, Debug)]
#[command(name = "prox", version, about)]
struct Args {
    /// How jobs are scheduled onto workers.
    #[arg(short, long, value_enum, default_value_t = Scheduler::Blocking)]
    scheduler: Scheduler,

    /// Log output theme.
    #[arg(short, long, value_enum, default_value_t = Theme::None)]
    theme: Theme,

    /// Logging verbosity (0 = errors only, 4+ = trace).
    #[arg(short, long, default_value_t = 0)]
    verbosity: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scheduler {
    /// No worker pool; jobs are processed inline on the main thread.
    Immediate,
    /// Workers park on the availability condition while the queue is empty.
    Blocking,
    /// Workers run while the main thread polls and reports statistics.
    Nonblocking,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Theme {
    None,
    Light,
    Dark,
}

fn init_tracing(args: &Args) {
    let level = match args.verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_ansi(args.theme != Theme::None)
        .init();
}

#[cfg(feature = "mqtt")]
fn broker_access() -> Box<dyn prox_broker::BrokerAccess> {
    let host = std::env::var("PROX_MQTT_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("PROX_MQTT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1883);
    info!(host, port, "using MQTT broker");
    Box::new(prox_broker::mqtt::MqttBrokerAccess::new(host, port))
}

#[cfg(not(feature = "mqtt"))]
fn broker_access() -> Box<dyn prox_broker::BrokerAccess> {
    info!("using in-process memory broker");
    Box::new(prox_broker::MemoryBrokerAccess::new(
        prox_broker::MemoryBroker::new(),
    ))
}

fn main() -> ExitCode {
    // Unknown or duplicate arguments and missing values print the help
    // summary and exit non-zero through clap.
    let args = Args::parse();
    init_tracing(&args);

    let access = broker_access();
    let config = match args.scheduler {
        Scheduler::Immediate => RuntimeConfig::default().with_concurrency(0),
        Scheduler::Blocking | Scheduler::Nonblocking => RuntimeConfig::default(),
    };

    let runtime = match Runtime::new(access.as_ref(), config) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start the runtime");
            return ExitCode::FAILURE;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let stop_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || stop_flag.store(false, Ordering::Release)) {
        error!(error = %e, "failed to install the interrupt handler");
        return ExitCode::FAILURE;
    }
    info!(scheduler = ?args.scheduler, "prox running, interrupt to stop");

    while running.load(Ordering::Acquire) {
        match args.scheduler {
            Scheduler::Immediate => {
                if runtime.num_waiting_jobs() == 0 {
                    std::thread::sleep(Duration::from_millis(1));
                } else if let Err(e) = runtime.process_one_waiting_job() {
                    error!(error = %e, "job processing failed");
                    return ExitCode::FAILURE;
                }
            }
            Scheduler::Blocking => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Scheduler::Nonblocking => {
                std::thread::sleep(Duration::from_secs(1));
                info!(
                    waiting = runtime.num_waiting_jobs(),
                    sleeping = runtime.num_sleeping_jobs(),
                    processed = runtime.num_processed(),
                    collisions = runtime.num_collisions(),
                    "runtime statistics"
                );
            }
        }
    }

    info!("shutting down");
    drop(runtime);
    ExitCode::SUCCESS
}
