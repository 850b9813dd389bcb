// Magic Wand - Gesture Recognition Core
//
// Streaming accelerometer gesture recognition in fixed memory:
//
//   AccelSensor -> AccelerometerReader (sample ring) -> ModelRunner (arena)
//     -> GestureDebouncer -> GestureSink
//
// `Wand` drives one pass of that pipeline per sampling tick. Everything
// except `drivers` is target-independent and runs on the host.

pub mod accel;
pub mod buffer;
pub mod config;
pub mod debounce;
pub mod events;
pub mod model;
pub mod replay;
pub mod sink;
pub mod traces;
pub mod wand;

#[cfg(target_os = "espidf")]
pub mod drivers;

pub use accel::{AccelSensor, AccelerometerReader, SensorReadError};
pub use buffer::SampleBuffer;
pub use config::{ConfigError, DebounceConfig};
pub use debounce::{DebounceState, GestureDebouncer};
pub use events::{Axis, Gesture, Sample, Scores};
pub use model::{GestureModel, InferenceError, ModelRunner, SetupError, TensorArena};
pub use replay::{Playback, TraceReplay};
pub use sink::{ChannelSink, GestureSink, LogSink};
pub use wand::{Tick, Wand, WandStats};
