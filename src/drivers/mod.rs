// Board drivers (ESP32-C3 only).

pub mod haptic;
pub mod imu;
