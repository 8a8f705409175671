//! Mock PIR motion sensor.

use tokio::sync::mpsc;

use crate::{HardwareError, Result, traits::MotionSensor};

/// Mock motion sensor fired through a [`MockMotionSensorHandle`].
///
/// `wait_for_motion` blocks the calling thread; call it from a plain OS
/// thread, never from inside an async runtime.
#[derive(Debug)]
pub struct MockMotionSensor {
    trigger_rx: mpsc::UnboundedReceiver<()>,
}

impl MockMotionSensor {
    pub fn new() -> (Self, MockMotionSensorHandle) {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        (Self { trigger_rx }, MockMotionSensorHandle { trigger_tx })
    }
}

impl MotionSensor for MockMotionSensor {
    fn wait_for_motion(&mut self) -> Result<()> {
        self.trigger_rx
            .blocking_recv()
            .ok_or_else(|| HardwareError::disconnected("Motion sensor channel closed"))
    }
}

/// Handle used to simulate motion.
#[derive(Debug, Clone)]
pub struct MockMotionSensorHandle {
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl MockMotionSensorHandle {
    /// Simulate one rising edge on the sensor pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor has been dropped.
    pub fn trigger(&self) -> Result<()> {
        self.trigger_tx
            .send(())
            .map_err(|_| HardwareError::disconnected("Motion sensor channel closed"))
    }
}
