//! Simulated sensor service
//!
//! Stands in for device hardware: a phone lying flat and slowly turning about
//! the vertical axis, with small deterministic noise on every reading. Each
//! subscription gets its own delivery timer running at the requested rate.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use orientation_telemetry::scheduler::FixedRateTimer;
use orientation_telemetry::{
    SensorDelay, SensorHandle, SensorKind, SensorListener, SensorSample, SensorService,
};

use crate::config::SimulationConfig;

const G: f32 = 9.80665;

/// Simple pseudo-random noise generator (deterministic for reproducibility)
struct NoiseGen {
    state: u32,
}

impl NoiseGen {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns noise in range [-amplitude, +amplitude]
    fn next(&mut self, amplitude: f32) -> f32 {
        // Simple LCG
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        let normalized = (self.state as f32 / u32::MAX as f32) * 2.0 - 1.0;
        normalized * amplitude
    }
}

/// Ideal reading of a flat device whose top points at `heading` (radians,
/// clockwise from magnetic north)
fn ideal_reading(kind: SensorKind, heading: f32, config: &SimulationConfig) -> [f32; 3] {
    match kind {
        SensorKind::Accelerometer => [0.0, 0.0, G],
        SensorKind::MagneticField => [
            -config.field_horizontal * heading.sin(),
            config.field_horizontal * heading.cos(),
            -config.field_vertical,
        ],
    }
}

struct Subscription {
    listener: Arc<dyn SensorListener>,
    // Dropping the timer stops delivery
    _timer: FixedRateTimer,
}

pub struct SimulatedSensorService {
    config: SimulationConfig,
    start: Instant,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SimulatedSensorService {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            start: Instant::now(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl SensorService for SimulatedSensorService {
    fn default_sensor(&self, kind: SensorKind) -> Option<SensorHandle> {
        let name = match kind {
            SensorKind::Accelerometer => "Simulated Accelerometer",
            SensorKind::MagneticField => "Simulated Magnetometer",
        };
        Some(SensorHandle::new(kind, name))
    }

    fn register_listener(
        &self,
        listener: Arc<dyn SensorListener>,
        sensor: &SensorHandle,
        delay: SensorDelay,
    ) -> bool {
        let kind = sensor.kind;
        let config = self.config.clone();
        let start = self.start;
        let target = Arc::clone(&listener);
        let (amplitude, seed) = match kind {
            SensorKind::Accelerometer => (config.accel_noise, config.seed),
            SensorKind::MagneticField => (config.mag_noise, config.seed.wrapping_add(1)),
        };
        let mut noise = NoiseGen::new(seed);

        let timer = FixedRateTimer::schedule(
            &format!("sim-{}", kind.name()),
            delay.period(),
            delay.period(),
            move || {
                let elapsed = start.elapsed();
                let heading = (config.heading_rate_dps * elapsed.as_secs_f32()).to_radians();
                let ideal = ideal_reading(kind, heading, &config);
                let values = [
                    ideal[0] + noise.next(amplitude),
                    ideal[1] + noise.next(amplitude),
                    ideal[2] + noise.next(amplitude),
                ];
                let sample = SensorSample {
                    kind,
                    values,
                    timestamp_us: elapsed.as_micros() as u64,
                };
                target.on_sensor_changed(&sample);
            },
        );

        match timer {
            Ok(timer) => {
                log::debug!("Registered listener for {} at {:?}", sensor.name, delay);
                self.subscriptions
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(Subscription {
                        listener,
                        _timer: timer,
                    });
                true
            }
            Err(e) => {
                log::warn!("Failed to start {} delivery: {}", sensor.name, e);
                false
            }
        }
    }

    fn unregister_listener(&self, listener: &Arc<dyn SensorListener>) {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|s| !Arc::ptr_eq(&s.listener, listener));
    }
}
