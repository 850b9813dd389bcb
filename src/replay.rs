// Magic Wand - Trace Replay Sensor
//
// An `AccelSensor` that plays back a recorded trace instead of talking to
// hardware. Used by the host build and the test suite; the rest of the
// pipeline cannot tell it apart from a real accelerometer.

use thiserror::Error;

use crate::accel::AccelSensor;
use crate::config::ACCEL_GAIN;
use crate::events::{Axis, Gesture};
use crate::traces::{Trace, RING_TRACE, SLOPE_TRACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Play once, then keep reporting the final sample (wand at rest).
    Once,
    /// Start over after the last sample.
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("axis read before any sample was fetched")]
    NotFetched,
}

/// Recorded trace for a gesture, if one is bundled.
pub fn reference_trace(gesture: Gesture) -> Option<&'static Trace> {
    match gesture {
        Gesture::Ring => Some(&RING_TRACE),
        Gesture::Slope => Some(&SLOPE_TRACE),
        Gesture::Wing => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trace '{0}', expected 'ring' or 'slope'")]
pub struct UnknownTrace(pub String);

/// Bundled trace picked by name (as given on the command line). No name
/// means `ring`.
pub fn select_trace(name: Option<&str>) -> Result<(Gesture, &'static Trace), UnknownTrace> {
    let gesture = match name {
        None | Some("ring") => Gesture::Ring,
        Some("slope") => Gesture::Slope,
        Some(other) => return Err(UnknownTrace(other.to_owned())),
    };
    reference_trace(gesture)
        .map(|trace| (gesture, trace))
        .ok_or_else(|| UnknownTrace(gesture.label().to_lowercase()))
}

pub struct TraceReplay<'t> {
    trace: &'t [[f32; 3]],
    playback: Playback,
    gain: f64,
    cursor: usize,
    current: Option<[f32; 3]>,
}

impl<'t> TraceReplay<'t> {
    /// `trace` is in model units; readings are reported divided by the
    /// reader's default gain so scaling restores the recorded values.
    pub fn new(trace: &'t [[f32; 3]], playback: Playback) -> Self {
        Self::with_gain(trace, playback, ACCEL_GAIN)
    }

    pub fn with_gain(trace: &'t [[f32; 3]], playback: Playback, gain: f64) -> Self {
        Self {
            trace,
            playback,
            gain,
            cursor: 0,
            current: None,
        }
    }

    /// Number of samples fetched so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.current = None;
    }

    fn next_sample(&self) -> Option<[f32; 3]> {
        let len = self.trace.len();
        if len == 0 {
            return None;
        }
        let idx = match self.playback {
            Playback::Once => self.cursor.min(len - 1),
            Playback::Loop => self.cursor % len,
        };
        Some(self.trace[idx])
    }
}

impl AccelSensor for TraceReplay<'_> {
    type Error = ReplayError;

    fn fetch(&mut self) -> Result<(), Self::Error> {
        // An empty trace reads as all zeros.
        self.current = Some(self.next_sample().unwrap_or([0.0; 3]));
        self.cursor += 1;
        Ok(())
    }

    fn read_axis(&mut self, axis: Axis) -> Result<f64, Self::Error> {
        let [x, y, z] = self.current.ok_or(ReplayError::NotFetched)?;
        let value = match axis {
            Axis::X => x,
            Axis::Y => y,
            Axis::Z => z,
        };
        Ok(f64::from(value) / self.gain)
    }
}
