//! Telemetry message and topic formatting
//!
//! Payloads use the IoT device event envelope: a single `"d"` object holding
//! the readings, serialized as JSON.

use serde::Serialize;

use crate::error::Result;

/// Event kinds published by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Generic device status (only event type accepted in quick-start mode)
    Status,
    /// Accelerometer/orientation event
    Accel,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Status => "status",
            EventKind::Accel => "accel",
        }
    }
}

/// Topic for publishing a device event in JSON format
pub fn event_topic(kind: EventKind) -> String {
    format!("iot-2/evt/{}/fmt/json", kind.as_str())
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    d: T,
}

/// Body of an accel event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelData {
    pub acceleration_x: f32,
    pub acceleration_y: f32,
    pub acceleration_z: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub lon: f64,
    pub lat: f64,
    pub acceleration_watch_x: f32,
    pub acceleration_watch_y: f32,
    pub acceleration_watch_z: f32,
}

impl AccelData {
    /// # Arguments
    /// * `accel` - Device accelerometer (m/s²)
    /// * `orientation` - azimuth, pitch, roll (radians)
    /// * `yaw` - Azimuth delta (radians)
    /// * `lon`, `lat` - Device location (degrees)
    /// * `watch_accel` - Paired watch accelerometer (m/s²)
    pub fn new(
        accel: [f32; 3],
        orientation: [f32; 3],
        yaw: f32,
        lon: f64,
        lat: f64,
        watch_accel: [f32; 3],
    ) -> Self {
        Self {
            acceleration_x: accel[0],
            acceleration_y: accel[1],
            acceleration_z: accel[2],
            roll: orientation[2],
            pitch: orientation[1],
            yaw,
            lon,
            lat,
            acceleration_watch_x: watch_accel[0],
            acceleration_watch_y: watch_accel[1],
            acceleration_watch_z: watch_accel[2],
        }
    }
}

/// Serialize an accel event payload
pub fn accel_message(
    accel: [f32; 3],
    orientation: [f32; 3],
    yaw: f32,
    lon: f64,
    lat: f64,
    watch_accel: [f32; 3],
) -> Result<String> {
    let data = AccelData::new(accel, orientation, yaw, lon, lat, watch_accel);
    Ok(serde_json::to_string(&Envelope { d: data })?)
}
