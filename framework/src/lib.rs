//! Orientation Telemetry Framework
//!
//! Derives device orientation from accelerometer and magnetometer samples and
//! publishes a composed telemetry message at a fixed rate through any
//! messaging client.
//!
//! ## Features
//!
//! - **Sensor Abstraction**: Push-based `SensorService` / `SensorListener` traits
//! - **Orientation**: Rotation matrix from gravity + geomagnetic field, azimuth/pitch/roll, yaw delta
//! - **Fixed-Rate Publishing**: 1 Hz accel events with skip-on-overrun scheduling
//! - **Pluggable Outputs**: `MessagePublisher` for the broker, `UiNotifier` for screen refresh
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  DeviceSensor (lifecycle + publisher)   │
//! ├─────────────────────────────────────────┤
//! │  Orientation Estimator │ Telemetry fmt  │
//! ├─────────────────────────────────────────┤
//! │  SensorService │ MessagePublisher │ UI  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orientation_telemetry::{AppContext, ConnectionType, DeviceSensor, LogPublisher, NullNotifier};
//! # fn sensors() -> Arc<dyn orientation_telemetry::SensorService> { unimplemented!() }
//!
//! let context = Arc::new(AppContext::new(ConnectionType::QuickStart));
//! let device = DeviceSensor::new(context, sensors(), Arc::new(LogPublisher), Arc::new(NullNotifier));
//!
//! device.enable()?;
//! // ... samples arrive, one accel event per second is published ...
//! device.disable();
//! # Ok::<(), orientation_telemetry::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`sensor_framework`] - Sensor kinds, samples and host service traits
//! - [`orientation`] - Rotation matrix and orientation estimation
//! - [`telemetry`] - Message payload and topic formatting
//! - [`publisher`] - Messaging client trait and counters
//! - [`context`] - Shared application state and UI notification
//! - [`scheduler`] - Fixed-rate timer
//! - [`device_sensor`] - The orientation publisher component

pub mod config;
pub mod context;
pub mod device_sensor;
pub mod error;
pub mod orientation;
pub mod publisher;
pub mod scheduler;
pub mod sensor_framework;
pub mod telemetry;

// Re-export commonly used types
pub use config::PublisherConfig;
pub use context::{AppContext, ConnectionType, Location, LogNotifier, NullNotifier, UiNotifier};
pub use device_sensor::DeviceSensor;
pub use error::{Error, PublishError, Result};
pub use orientation::{OrientationEstimator, OrientationState};
pub use publisher::{LogPublisher, MessagePublisher, QoS};
pub use sensor_framework::{
    SensorDelay, SensorHandle, SensorKind, SensorListener, SensorSample, SensorService,
};
