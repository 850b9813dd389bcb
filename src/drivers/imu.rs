// Magic Wand - MPU6050 Accelerometer Driver
//
// Register-level driver over the shared I2C bus. Only the accelerometer is
// used; `fetch` burst-reads the three axes and `read_axis` serves them from
// that snapshot.

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use esp_idf_hal::i2c::I2cDriver;

use crate::accel::AccelSensor;
use crate::config::*;
use crate::events::Axis;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// MPU6050 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // X, Y, Z high/low bytes follow
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

pub struct Mpu6050 {
    bus: SharedBus,
    latched: Option<[i16; 3]>,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus, latched: None }
    }

    fn bus(&self) -> anyhow::Result<MutexGuard<'static, I2cDriver<'static>>> {
        self.bus.lock().map_err(|_| anyhow!("I2C bus mutex poisoned"))
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = self.bus() else {
            return false;
        };
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure the accelerometer for ±8 g, DLPF 21 Hz.
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = self.bus()?;

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

        // DLPF bandwidth 21 Hz
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x04], I2C_TIMEOUT_TICKS)?;

        // Accelerometer: ±8 g
        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x10], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±8g, DLPF 21Hz)");
        Ok(())
    }
}

impl AccelSensor for Mpu6050 {
    type Error = anyhow::Error;

    fn fetch(&mut self) -> anyhow::Result<()> {
        let mut raw = [0u8; 6];
        self.bus()?.write_read(
            I2C_ADDR_MPU6050,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        self.latched = Some([
            i16::from_be_bytes([raw[0], raw[1]]),
            i16::from_be_bytes([raw[2], raw[3]]),
            i16::from_be_bytes([raw[4], raw[5]]),
        ]);
        Ok(())
    }

    /// Latched reading for `axis` in m/s².
    fn read_axis(&mut self, axis: Axis) -> anyhow::Result<f64> {
        let raw = self.latched.ok_or_else(|| anyhow!("no sample fetched"))?;
        let counts = match axis {
            Axis::X => raw[0],
            Axis::Y => raw[1],
            Axis::Z => raw[2],
        };
        Ok(f64::from(counts) / f64::from(ACCEL_SCALE_8G) * STANDARD_GRAVITY)
    }
}
