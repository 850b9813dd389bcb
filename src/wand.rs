// Magic Wand - Orchestration Loop
//
// One tick: read a sample, and once the window is full run the model, feed
// the debouncer and hand confirmed gestures to the sink. A bad tick is
// logged and counted; the next tick carries on as if nothing happened.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use crate::accel::{AccelSensor, AccelerometerReader};
use crate::config::{SAMPLE_INTERVAL_MS, STATS_LOG_INTERVAL_TICKS};
use crate::debounce::GestureDebouncer;
use crate::events::Gesture;
use crate::model::GestureModel;
use crate::sink::GestureSink;

/// What happened on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The sensor read failed; nothing was buffered.
    NoData,
    /// Sample stored, window not full yet.
    Filling { have: usize, need: usize },
    /// Inference failed; the frame was dropped.
    Dropped,
    /// Inference ran, nothing confirmed.
    Quiet,
    Gesture(Gesture),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WandStats {
    pub ticks: u64,
    pub sensor_faults: u64,
    pub dropped_frames: u64,
    pub inferences: u64,
    pub gestures: u64,
}

pub struct Wand<S, M, K, const W: usize> {
    reader: AccelerometerReader<S, W>,
    model: M,
    debouncer: GestureDebouncer,
    sink: K,
    interval: Duration,
    stats: WandStats,
}

impl<S, M, K, const W: usize> Wand<S, M, K, W>
where
    S: AccelSensor,
    M: GestureModel<W>,
    K: GestureSink,
{
    pub fn new(
        reader: AccelerometerReader<S, W>,
        model: M,
        debouncer: GestureDebouncer,
        sink: K,
    ) -> Self {
        Self {
            reader,
            model,
            debouncer,
            sink,
            interval: Duration::from_millis(SAMPLE_INTERVAL_MS),
            stats: WandStats::default(),
        }
    }

    /// Override the tick period used by [`Wand::run`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn tick(&mut self) -> Tick {
        self.stats.ticks += 1;
        let outcome = self.step();

        if self.stats.ticks % STATS_LOG_INTERVAL_TICKS == 0 {
            let s = &self.stats;
            debug!(
                "ticks={} inferences={} gestures={} sensor_faults={} dropped={}",
                s.ticks, s.inferences, s.gestures, s.sensor_faults, s.dropped_frames
            );
        }
        outcome
    }

    fn step(&mut self) -> Tick {
        if let Err(e) = self.reader.sample_tick() {
            self.stats.sensor_faults += 1;
            warn!("Accelerometer read failed: {}", e);
            return Tick::NoData;
        }

        let window = self.reader.window();
        if !window.is_full() {
            return Tick::Filling {
                have: window.len(),
                need: W,
            };
        }

        let scores = match self.model.infer(window) {
            Ok(scores) => scores,
            Err(e) => {
                self.stats.dropped_frames += 1;
                error!("Inference failed: {}", e);
                return Tick::Dropped;
            }
        };
        self.stats.inferences += 1;
        trace!("scores {:?}", scores.as_slice());

        match self.debouncer.classify(&scores) {
            Some(gesture) => {
                self.stats.gestures += 1;
                info!("Gesture: {}", gesture);
                self.sink.on_gesture(gesture);
                Tick::Gesture(gesture)
            }
            None => Tick::Quiet,
        }
    }

    /// Tick forever at the configured cadence.
    pub fn run(&mut self) -> ! {
        info!(
            "Wand loop started ({} ms/tick, {} sample window)",
            self.interval.as_millis(),
            W
        );

        loop {
            let tick_start = Instant::now();

            self.tick();

            // Sleep for the remainder of the interval to keep the cadence the
            // model was trained on.
            let elapsed = tick_start.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
    }

    pub fn stats(&self) -> WandStats {
        self.stats
    }

    pub fn reader(&self) -> &AccelerometerReader<S, W> {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut AccelerometerReader<S, W> {
        &mut self.reader
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn debouncer(&self) -> &GestureDebouncer {
        &self.debouncer
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleBuffer;
    use crate::config::{DebounceConfig, CLASS_COUNT, NO_GESTURE_CLASS};
    use crate::events::{Axis, Scores};
    use crate::model::{InferenceError, OpKind};
    use crate::sink::RecordingSink;

    const W: usize = 4;

    /// Constant readings; fetches listed in `fail_on` (0-based) fail.
    #[derive(Default)]
    struct FlakySensor {
        fetches: usize,
        fail_on: Vec<usize>,
    }

    impl AccelSensor for FlakySensor {
        type Error = &'static str;

        fn fetch(&mut self) -> Result<(), Self::Error> {
            let n = self.fetches;
            self.fetches += 1;
            if self.fail_on.contains(&n) {
                Err("i2c nack")
            } else {
                Ok(())
            }
        }

        fn read_axis(&mut self, _axis: Axis) -> Result<f64, Self::Error> {
            Ok(0.01)
        }
    }

    /// Plays back a fixed list of results, repeating the last one.
    struct ScriptedModel {
        script: Vec<Result<Scores, InferenceError>>,
        calls: usize,
    }

    impl ScriptedModel {
        fn new(script: Vec<Result<Scores, InferenceError>>) -> Self {
            Self { script, calls: 0 }
        }
    }

    impl GestureModel<W> for ScriptedModel {
        fn infer(&mut self, window: &SampleBuffer<W>) -> Result<Scores, InferenceError> {
            assert!(window.is_full());
            let i = self.calls.min(self.script.len() - 1);
            self.calls += 1;
            self.script[i]
        }
    }

    fn scores(class: usize) -> Scores {
        let mut raw = [0.0; CLASS_COUNT];
        raw[class] = 0.99;
        Scores(raw)
    }

    const FAILED: InferenceError = InferenceError::InvocationFailed {
        index: 0,
        op: OpKind::Conv2D,
    };

    fn wand(
        sensor: FlakySensor,
        script: Vec<Result<Scores, InferenceError>>,
        config: DebounceConfig,
    ) -> Wand<FlakySensor, ScriptedModel, RecordingSink, W> {
        Wand::new(
            AccelerometerReader::new(sensor),
            ScriptedModel::new(script),
            GestureDebouncer::new(config),
            RecordingSink::default(),
        )
    }

    fn instant() -> DebounceConfig {
        DebounceConfig { threshold: 0.5, consistency: [1, 1, 1], refractory: 0 }
    }

    #[test]
    fn fills_the_window_before_inferring() {
        let mut w = wand(FlakySensor::default(), vec![Ok(scores(NO_GESTURE_CLASS))], instant());
        for have in 1..W {
            assert_eq!(w.tick(), Tick::Filling { have, need: W });
        }
        assert_eq!(w.tick(), Tick::Quiet);
        assert_eq!(w.model().calls, 1);
    }

    #[test]
    fn sensor_fault_skips_the_tick() {
        let sensor = FlakySensor { fail_on: vec![1], ..Default::default() };
        let mut w = wand(sensor, vec![Ok(scores(NO_GESTURE_CLASS))], instant());

        assert_eq!(w.tick(), Tick::Filling { have: 1, need: W });
        assert_eq!(w.tick(), Tick::NoData);
        assert_eq!(w.reader().window().len(), 1);
        assert_eq!(w.tick(), Tick::Filling { have: 2, need: W });
        assert_eq!(w.stats().sensor_faults, 1);
    }

    #[test]
    fn sensor_fault_on_a_full_window_does_not_infer() {
        let sensor = FlakySensor { fail_on: vec![W], ..Default::default() };
        let mut w = wand(sensor, vec![Ok(scores(NO_GESTURE_CLASS))], instant());
        for _ in 0..W {
            w.tick();
        }
        assert_eq!(w.tick(), Tick::NoData);
        assert_eq!(w.model().calls, 1);
    }

    #[test]
    fn dropped_frame_does_not_stop_the_loop() {
        let script = vec![Err(FAILED), Ok(scores(1))];
        let mut w = wand(FlakySensor::default(), script, instant());
        for _ in 0..W - 1 {
            w.tick();
        }
        assert_eq!(w.tick(), Tick::Dropped);
        assert_eq!(w.tick(), Tick::Gesture(Gesture::Ring));

        let stats = w.stats();
        assert_eq!(stats.dropped_frames, 1);
        assert_eq!(stats.inferences, 1);
        assert_eq!(w.sink().seen, vec![Gesture::Ring]);
    }

    #[test]
    fn confirmed_gestures_reach_the_sink_once() {
        let config = DebounceConfig { threshold: 0.8, consistency: [3, 3, 3], refractory: 10 };
        let mut w = wand(FlakySensor::default(), vec![Ok(scores(2))], config);

        let outcomes: Vec<Tick> = (0..W - 1 + 12).map(|_| w.tick()).collect();
        let emitted: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t, Tick::Gesture(_)))
            .map(|(i, _)| i)
            .collect();

        assert_eq!(emitted, vec![W - 1 + 2]);
        assert_eq!(w.sink().seen, vec![Gesture::Slope]);
        assert_eq!(w.stats().gestures, 1);
    }

    #[test]
    fn stats_track_every_tick() {
        let sensor = FlakySensor { fail_on: vec![0, 5], ..Default::default() };
        let script = vec![Ok(scores(NO_GESTURE_CLASS)), Err(FAILED), Ok(scores(0))];
        let mut w = wand(sensor, script, instant());
        for _ in 0..10 {
            w.tick();
        }
        assert_eq!(
            w.stats(),
            WandStats {
                ticks: 10,
                sensor_faults: 2,
                dropped_frames: 1,
                inferences: 4,
                gestures: 3,
            }
        );
    }
}
