/// Sensor Framework - host sensor service abstraction
///
/// Design philosophy:
/// - The host owns the hardware and pushes samples to listeners
/// - Listeners subscribe per sensor handle at a requested delivery rate
/// - A missing sensor is not an error, it simply never delivers
/// - Adding a new backend = implement `SensorService`
use std::sync::Arc;
use std::time::Duration;

/// Kinds of hardware sensors the orientation pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// 3-axis accelerometer including gravity (m/s²)
    Accelerometer,
    /// 3-axis magnetometer (µT)
    MagneticField,
}

impl SensorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::MagneticField => "magnetometer",
        }
    }
}

/// Requested delivery rate for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorDelay {
    Fastest,
    Game,
    Ui,
    /// Suitable for orientation changes
    #[default]
    Normal,
}

impl SensorDelay {
    /// Nominal period between samples
    pub fn period(&self) -> Duration {
        match self {
            SensorDelay::Fastest => Duration::ZERO,
            SensorDelay::Game => Duration::from_millis(20),
            SensorDelay::Ui => Duration::from_millis(66),
            SensorDelay::Normal => Duration::from_millis(200),
        }
    }
}

/// Handle to a physical sensor, as returned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorHandle {
    pub kind: SensorKind,
    pub name: String,
}

impl SensorHandle {
    pub fn new(kind: SensorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A single 3-axis reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub values: [f32; 3],
    pub timestamp_us: u64,
}

impl SensorSample {
    pub fn accelerometer(values: [f32; 3]) -> Self {
        Self {
            kind: SensorKind::Accelerometer,
            values,
            timestamp_us: 0,
        }
    }

    pub fn magnetic_field(values: [f32; 3]) -> Self {
        Self {
            kind: SensorKind::MagneticField,
            values,
            timestamp_us: 0,
        }
    }

    pub fn at(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }
}

/// Receiver of pushed sensor events
///
/// Called from whatever context the service delivers on, so implementations
/// must be `Send + Sync`.
pub trait SensorListener: Send + Sync {
    /// New sample available
    fn on_sensor_changed(&self, sample: &SensorSample);

    /// Accuracy of a sensor changed
    fn on_accuracy_changed(&self, sensor: &SensorHandle, accuracy: i32) {
        log::debug!("{} accuracy changed to {}", sensor.name, accuracy);
    }
}

/// Host sensor service
pub trait SensorService: Send + Sync {
    /// Default sensor of the given kind, `None` if the device has none
    fn default_sensor(&self, kind: SensorKind) -> Option<SensorHandle>;

    /// Subscribe `listener` to `sensor`. Returns false if the subscription
    /// could not be made.
    fn register_listener(
        &self,
        listener: Arc<dyn SensorListener>,
        sensor: &SensorHandle,
        delay: SensorDelay,
    ) -> bool;

    /// Drop every subscription held by `listener`
    fn unregister_listener(&self, listener: &Arc<dyn SensorListener>);
}
