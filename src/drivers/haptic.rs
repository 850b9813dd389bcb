// Magic Wand - Haptic Feedback
//
// GPIO-driven vibration motor. Gestures are buzzed on a thread of their own
// so the sampling loop never waits on the motor.

use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::config::*;
use crate::events::Gesture;
use crate::sink::{ChannelSink, GestureSink};

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }

    /// One pulse per gesture ordinal: wing 1, ring 2, slope 3.
    pub fn signal(&mut self, gesture: Gesture) {
        let pulses = gesture.class_index() + 1;
        for i in 0..pulses {
            if i > 0 {
                thread::sleep(Duration::from_millis(HAPTIC_GAP_MS));
            }
            self.buzz(Duration::from_millis(HAPTIC_PULSE_MS));
        }
    }
}

/// Forwards gestures to a dedicated haptic thread through a queue of
/// `HAPTIC_QUEUE_DEPTH` slots, allocated once at spawn.
pub struct HapticSink {
    queue: ChannelSink,
}

impl HapticSink {
    pub fn spawn(driver: HapticDriver<'static>) -> anyhow::Result<Self> {
        let (queue, rx) = ChannelSink::bounded(HAPTIC_QUEUE_DEPTH);
        thread::Builder::new()
            .name("haptic".into())
            .stack_size(STACK_HAPTIC)
            .spawn(move || haptic_task(driver, rx))?;
        Ok(Self { queue })
    }
}

impl GestureSink for HapticSink {
    fn on_gesture(&mut self, gesture: Gesture) {
        self.queue.on_gesture(gesture);
    }
}

fn haptic_task(mut driver: HapticDriver<'static>, rx: Receiver<Gesture>) {
    log::info!("Haptic task started");
    while let Ok(gesture) = rx.recv() {
        driver.signal(gesture);
    }
    log::warn!("Gesture channel closed, exiting haptic task");
}
