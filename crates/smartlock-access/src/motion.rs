//! Motion sensor monitor.
//!
//! A dedicated thread blocks on the sensor and publishes `MotionDetected`
//! for every trigger outside the cooldown window. Publishing never blocks,
//! so a chatty sensor cannot stall anything; whatever reacts to motion does
//! so on the consumer side of the event bridge.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use smartlock_core::constants::MOTION_COOLDOWN_MS;
use smartlock_core::{DomainEvent, EventSender};
use smartlock_hardware::MotionSensor;
use tracing::{debug, error, info};

/// Default gap between two reported motion events.
pub fn default_motion_cooldown() -> Duration {
    Duration::from_millis(MOTION_COOLDOWN_MS)
}

/// Start the monitor thread.
///
/// The thread ends when the sensor reports an error (e.g. disconnected) or
/// when it wakes up with `shutdown` set.
///
/// # Errors
///
/// Returns an error if the OS refuses to spawn the thread.
pub fn spawn_motion_monitor<S>(
    mut sensor: S,
    events: EventSender,
    cooldown: Duration,
    shutdown: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    S: MotionSensor + 'static,
{
    thread::Builder::new()
        .name("motion-monitor".to_string())
        .spawn(move || {
            info!(cooldown_ms = cooldown.as_millis() as u64, "Motion monitor started");
            let mut last_reported: Option<Instant> = None;

            loop {
                if let Err(e) = sensor.wait_for_motion() {
                    error!(error = %e, "Motion sensor failed, stopping monitor");
                    break;
                }
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }

                let now = Instant::now();
                if last_reported.is_some_and(|last| now.duration_since(last) < cooldown) {
                    debug!("Motion retrigger within cooldown, ignored");
                    continue;
                }

                last_reported = Some(now);
                info!("Motion detected");
                events.publish(DomainEvent::MotionDetected);
            }

            info!("Motion monitor stopped");
        })
}
