//! `smartlock`: the lock controller with console-simulated devices.
//!
//! Keypad, motion sensor and chat are driven from stdin; notifications are
//! printed on stdout. Logging goes through `RUST_LOG` (default `info`).

mod config;
mod console;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use smartlock_access::{
    AppContext, DisplayMessages, default_motion_cooldown, run_keypad_loop, spawn_motion_monitor,
};
use smartlock_core::{UserId, event_bridge};
use smartlock_hardware::VirtualLcd;
use smartlock_hardware::mock::{MockKeypad, MockKeypadHandle, MockMotionSensor, MockMotionSensorHandle, MockRelay};
use smartlock_remote::{CommandDispatcher, EventHook, TracingHook, run_notifier};
use smartlock_storage::{CredentialStore, EncryptedFileGateway, StorageKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::console::{ConsoleChannel, ConsoleInput};

const BANNER: &str = "\
Type keypad keys (e.g. 4821#, A, B, *), `motion`, chat commands (/help),
`@<id> <text>` to chat as another user, or `quit`.";

/// Stdin-side handles of the simulated devices.
struct Devices {
    operator: UserId,
    keypad: MockKeypadHandle,
    motion: MockMotionSensorHandle,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = AppConfig::from_env()?;
    info!(
        version = smartlock_core::VERSION,
        codes_file = %config.codes_file.display(),
        "Starting smart lock"
    );

    let key = StorageKey::load_or_generate(&config.key_file)
        .with_context(|| format!("loading key file {}", config.key_file.display()))?;
    let store = Arc::new(CredentialStore::load(EncryptedFileGateway::new(
        &config.codes_file,
        key,
    )));

    let (events, drain) = event_bridge();
    let (relay, _relay_state) = MockRelay::new();
    let ctx = AppContext::new(store, relay, config.lockout_policy(), events);
    let dispatcher = CommandDispatcher::new(ctx.clone(), config.authorized_user);
    let shutdown = Arc::new(AtomicBool::new(false));

    let (keypad, keypad_input) = MockKeypad::new();
    let display = VirtualLcd::builder()
        .with_idle_message(DisplayMessages::PROMPT)
        .build();
    let keypad_thread = {
        let ctx = ctx.clone();
        let shutdown = Arc::clone(&shutdown);
        let keypad_config = config.keypad_config();
        thread::Builder::new()
            .name("keypad".to_string())
            .spawn(move || {
                if let Err(e) = run_keypad_loop(ctx, keypad, display, keypad_config, &shutdown) {
                    warn!(error = %e, "Keypad loop ended with an error");
                }
            })
            .context("spawning keypad thread")?
    };

    let (sensor, motion_input) = MockMotionSensor::new();
    let motion_thread = spawn_motion_monitor(
        sensor,
        ctx.events.clone(),
        default_motion_cooldown(),
        Arc::clone(&shutdown),
    )
    .context("spawning motion monitor")?;

    let devices = Devices {
        operator: config.authorized_user,
        keypad: keypad_input,
        motion: motion_input,
    };

    let hooks: Vec<Box<dyn EventHook>> = vec![Box::new(TracingHook)];
    let mut notifier = std::pin::pin!(run_notifier(drain, ConsoleChannel, hooks));
    let mut early_stats = None;

    println!("{BANNER}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&line, &dispatcher, &devices) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            stats = &mut notifier => {
                warn!("Notifier stopped unexpectedly");
                early_stats = Some(stats);
                break;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                }
                break;
            }
        }
    }

    info!("Shutting down");
    shutdown.store(true, Ordering::SeqCst);
    // Wake the motion monitor so it sees the flag.
    let _ = devices.motion.trigger();

    join_worker("keypad", keypad_thread).await;
    join_worker("motion-monitor", motion_thread).await;

    // Last senders; the notifier drains what is left and stops.
    drop(dispatcher);
    drop(ctx);
    let stats = match early_stats {
        Some(stats) => stats,
        None => notifier.await,
    };

    info!(
        delivered = stats.delivered,
        failed_deliveries = stats.failed_deliveries,
        failed_hooks = stats.failed_hooks,
        "Stopped"
    );
    Ok(())
}

/// Route one stdin line. Returns `false` when the user asked to quit.
fn handle_line(line: &str, dispatcher: &CommandDispatcher, devices: &Devices) -> bool {
    match ConsoleInput::parse(line, devices.operator) {
        ConsoleInput::Empty => {}
        ConsoleInput::Quit => return false,
        ConsoleInput::Motion => {
            if let Err(e) = devices.motion.trigger() {
                warn!(error = %e, "Motion sensor unavailable");
            }
        }
        ConsoleInput::Keypad(keys) => {
            if let Err(e) = devices.keypad.press_str(&keys) {
                warn!(error = %e, "Keypad unavailable");
            }
        }
        ConsoleInput::Chat { caller, text } => match dispatcher.handle(caller, &text) {
            Some(reply) => println!("[bot] {reply}"),
            None => println!("[bot] (no reply for user {caller})"),
        },
    }
    true
}

async fn join_worker(name: &'static str, handle: JoinHandle<()>) {
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => error!(worker = name, "Worker thread panicked"),
        Err(e) => error!(worker = name, error = %e, "Failed to join worker thread"),
    }
}
