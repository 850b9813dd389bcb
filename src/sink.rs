// Magic Wand - Event Sinks
//
// Whatever should happen when a gesture is confirmed. The loop calls
// `on_gesture` at most once per debounced event.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use log::{info, warn};

use crate::events::Gesture;

pub trait GestureSink {
    fn on_gesture(&mut self, gesture: Gesture);
}

impl<K: GestureSink + ?Sized> GestureSink for &mut K {
    fn on_gesture(&mut self, gesture: Gesture) {
        (**self).on_gesture(gesture)
    }
}

/// Both sinks, in order.
impl<A: GestureSink, B: GestureSink> GestureSink for (A, B) {
    fn on_gesture(&mut self, gesture: Gesture) {
        self.0.on_gesture(gesture);
        self.1.on_gesture(gesture);
    }
}

/// Prints the gesture name and its ASCII picture.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl GestureSink for LogSink {
    fn on_gesture(&mut self, gesture: Gesture) {
        info!("{gesture}:\n{}", gesture.glyph());
    }
}

/// Hands gestures to another thread over a bounded queue. Never blocks the
/// loop and never allocates after construction; a gesture that finds the
/// queue full is dropped.
pub struct ChannelSink {
    tx: SyncSender<Gesture>,
}

impl ChannelSink {
    pub fn bounded(depth: usize) -> (Self, Receiver<Gesture>) {
        let (tx, rx) = mpsc::sync_channel(depth);
        (Self { tx }, rx)
    }
}

impl GestureSink for ChannelSink {
    fn on_gesture(&mut self, gesture: Gesture) {
        match self.tx.try_send(gesture) {
            Ok(()) => {}
            Err(TrySendError::Full(g)) => warn!("Gesture queue full, dropping {g}"),
            Err(TrySendError::Disconnected(g)) => warn!("Gesture consumer gone, dropping {g}"),
        }
    }
}

/// Keeps every gesture it is handed, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub seen: Vec<Gesture>,
}

impl GestureSink for RecordingSink {
    fn on_gesture(&mut self, gesture: Gesture) {
        self.seen.push(gesture);
    }
}
