// Magic Wand - Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) with an MPU6050 on I2C.
//
// Everything the model artifact was trained against (window length, channel
// count, sampling cadence, gain) lives here next to the board wiring so the
// two can be audited together.

use thiserror::Error;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_HAPTIC: i32 = 4;      // D2/A2 - Haptic motor control
pub const PIN_I2C_SDA: i32 = 6;     // D4    - I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5    - I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const I2C_BAUDRATE_KHZ: u32 = 400;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_WAND: usize = 16384;
pub const STACK_HAPTIC: usize = 4096;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
/// Fixed delay between accelerometer reads (25 Hz). The model's time axis
/// was recorded at this rate; changing it requires retraining.
pub const SAMPLE_INTERVAL_MS: u64 = 40;
pub const STATS_LOG_INTERVAL_TICKS: u64 = 250;   // every 10 s at 25 Hz
pub const HAPTIC_PULSE_MS: u64 = 60;
pub const HAPTIC_GAP_MS: u64 = 90;
pub const HAPTIC_QUEUE_DEPTH: usize = 4; // gestures waiting for the motor

// ---------------------------------------------------------------------------
// Sampling window / model input contract
// ---------------------------------------------------------------------------
pub const WINDOW_SAMPLES: usize = 128;            // 5.12 s @ 25 Hz
pub const CHANNELS: usize = 3;                    // accX, accY, accZ
pub const INPUT_LEN: usize = WINDOW_SAMPLES * CHANNELS; // 384
/// Multiplier from sensor units (m/s^2) to the units the model expects.
pub const ACCEL_GAIN: f64 = 100.0;

// ---------------------------------------------------------------------------
// Model artifact
// ---------------------------------------------------------------------------
pub const SCHEMA_VERSION: u32 = 3;
pub const CLASS_COUNT: usize = 4;                 // wing, ring, slope, none
pub const GESTURE_COUNT: usize = 3;
pub const NO_GESTURE_CLASS: usize = 3;
pub const MAX_OPERATORS: usize = 16;

// ---------------------------------------------------------------------------
// Inference arena
// ---------------------------------------------------------------------------
pub const ARENA_BYTES: usize = 60 * 1024;
pub const ARENA_WORDS: usize = ARENA_BYTES / core::mem::size_of::<f32>();

// ---------------------------------------------------------------------------
// Gesture debouncing
// ---------------------------------------------------------------------------
pub const PREDICTION_THRESHOLD: f32 = 0.8;
/// Consecutive passes a gesture must win before it is reported, indexed
/// by gesture (wing, ring, slope).
pub const CONSECUTIVE_PASSES: [u16; GESTURE_COUNT] = [8, 5, 4];
pub const REFRACTORY_PASSES: u16 = 25;            // 1 s at 25 Hz

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_8G: f32 = 4096.0;   // LSB/g  at ±8 g
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Runtime knobs of the gesture debouncer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceConfig {
    /// A top score must be strictly greater than this to count.
    pub threshold: f32,
    /// Required consecutive winning passes, per gesture.
    pub consistency: [u16; GESTURE_COUNT],
    /// Passes suppressed after an emission.
    pub refractory: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("confidence threshold {0} is outside [0, 1)")]
    ThresholdOutOfRange(f32),
    #[error("consistency count for gesture {0} must be at least 1")]
    ZeroConsistency(usize),
}

impl DebounceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if let Some(idx) = self.consistency.iter().position(|&n| n == 0) {
            return Err(ConfigError::ZeroConsistency(idx));
        }
        Ok(())
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            threshold: PREDICTION_THRESHOLD,
            consistency: CONSECUTIVE_PASSES,
            refractory: REFRACTORY_PASSES,
        }
    }
}
