// Magic Wand - Firmware Entry Point
//
// Boot sequence (device):
//   1. Bring up logging and the shared I2C bus.
//   2. Check for and configure the MPU6050.
//   3. Load the gesture model into the tensor arena. Any setup error is
//      reported once and the firmware parks without sampling.
//   4. Spawn the haptic task and the wand loop, then park the main thread.
//
// On the host the same loop runs against a recorded trace (`ring` by
// default, or `slope` as the first argument) and prints gestures to the log.

#[cfg(target_os = "espidf")]
use std::{thread, time::Duration};

use magic_wand::config::*;
use magic_wand::model::{ModelRunner, TensorArena, MAGIC_WAND_MODEL};
use magic_wand::{AccelerometerReader, GestureDebouncer, LogSink, Wand};

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::Mutex;

    use esp_idf_hal::gpio::{OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use magic_wand::drivers::haptic::{HapticDriver, HapticSink};
    use magic_wand::drivers::imu::{Mpu6050, SharedBus};

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Magic Wand firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // PIN_I2C_SDA
        peripherals.pins.gpio7, // PIN_I2C_SCL
        &i2c_config,
    )?;
    // The bus lives for the whole program; firmware never exits.
    let i2c_bus: SharedBus = Box::leak(Box::new(Mutex::new(i2c)));

    let imu = Mpu6050::new(i2c_bus);
    if !imu.is_connected() {
        halt("MPU6050 not responding on I2C");
    }
    if let Err(e) = imu.init() {
        halt(&format!("MPU6050 init failed: {e}"));
    }

    // ---- Model ------------------------------------------------------------
    let runner = match ModelRunner::<WINDOW_SAMPLES>::initialize(
        MAGIC_WAND_MODEL,
        TensorArena::leak(ARENA_BYTES),
    ) {
        Ok(runner) => runner,
        Err(e) => halt(&format!("Model setup failed: {e}")),
    };

    let config = DebounceConfig::default();
    if let Err(e) = config.validate() {
        halt(&format!("Bad debounce config: {e}"));
    }

    // ---- Tasks ------------------------------------------------------------
    // PIN_HAPTIC
    let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
    let haptic = HapticSink::spawn(HapticDriver::new(haptic_pin))?;

    let mut wand = Wand::new(
        AccelerometerReader::new(imu),
        runner,
        GestureDebouncer::new(config),
        (LogSink, haptic),
    );

    thread::Builder::new()
        .name("wand".into())
        .stack_size(STACK_WAND)
        .spawn(move || {
            wand.run();
        })?;

    // Main thread has nothing left to do; park it.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

/// Report a fatal setup problem once and stay out of the sampling loop.
#[cfg(target_os = "espidf")]
fn halt(reason: &str) -> ! {
    log::error!("{reason}; not starting the wand loop");
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use magic_wand::replay::{select_trace, Playback, TraceReplay};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (gesture, trace) = select_trace(std::env::args().nth(1).as_deref())?;
    log::info!("Replaying the {gesture} trace every {} ms", SAMPLE_INTERVAL_MS);

    let runner = ModelRunner::<WINDOW_SAMPLES>::initialize(
        MAGIC_WAND_MODEL,
        TensorArena::leak(ARENA_BYTES),
    )?;

    let config = DebounceConfig::default();
    config.validate()?;

    let mut wand = Wand::new(
        AccelerometerReader::new(TraceReplay::new(trace, Playback::Loop)),
        runner,
        GestureDebouncer::new(config),
        LogSink,
    );

    wand.run()
}
