// Magic Wand - Accelerometer Reader
//
// Pulls one (x, y, z) triple per tick from the sensor driver, scales it to
// model units and appends it to the sample ring. A failed read leaves the
// ring untouched; the caller simply waits for the next tick.

use core::fmt;

use thiserror::Error;

use crate::buffer::SampleBuffer;
use crate::config::ACCEL_GAIN;
use crate::events::{Axis, Sample};

/// What the core needs from a sensor driver: latch a new reading, then
/// read each axis of it in m/s^2.
pub trait AccelSensor {
    type Error: fmt::Debug + fmt::Display;

    fn fetch(&mut self) -> Result<(), Self::Error>;

    fn read_axis(&mut self, axis: Axis) -> Result<f64, Self::Error>;
}

impl<S: AccelSensor + ?Sized> AccelSensor for &mut S {
    type Error = S::Error;

    fn fetch(&mut self) -> Result<(), Self::Error> {
        (**self).fetch()
    }

    fn read_axis(&mut self, axis: Axis) -> Result<f64, Self::Error> {
        (**self).read_axis(axis)
    }
}

#[derive(Debug, Error)]
pub enum SensorReadError<E: fmt::Debug + fmt::Display> {
    #[error("sample fetch failed: {0}")]
    Fetch(E),
    #[error("reading {0} axis failed: {1}")]
    Channel(Axis, E),
}

pub struct AccelerometerReader<S, const W: usize> {
    sensor: S,
    buffer: SampleBuffer<W>,
    gain: f64,
}

impl<S: AccelSensor, const W: usize> AccelerometerReader<S, W> {
    pub fn new(sensor: S) -> Self {
        Self::with_gain(sensor, ACCEL_GAIN)
    }

    pub fn with_gain(sensor: S, gain: f64) -> Self {
        Self {
            sensor,
            buffer: SampleBuffer::new(),
            gain,
        }
    }

    /// Read, scale and store one sample.
    pub fn sample_tick(&mut self) -> Result<Sample, SensorReadError<S::Error>> {
        self.sensor.fetch().map_err(SensorReadError::Fetch)?;

        let mut axes = [0.0f32; 3];
        for (slot, axis) in axes.iter_mut().zip(Axis::ALL) {
            let raw = self
                .sensor
                .read_axis(axis)
                .map_err(|e| SensorReadError::Channel(axis, e))?;
            *slot = (raw * self.gain) as f32;
        }

        let sample = Sample::from(axes);
        self.buffer.push(sample);
        Ok(sample)
    }

    pub fn window(&self) -> &SampleBuffer<W> {
        &self.buffer
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
