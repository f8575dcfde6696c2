//! Application state shared between the composition root and components
//!
//! Replaces a process-wide singleton: create one and pass it around in an `Arc`.

use std::sync::Mutex;

/// Action string of the UI refresh broadcast
pub const INTENT_ACTION: &str = "orientation-telemetry.INTENT_IOT";

/// Screen identifier that listens for accel broadcasts
pub const IOT_SCREEN: &str = "iot";

/// Device location (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// How the device is connected to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    /// Unauthenticated demo mode
    #[default]
    QuickStart,
    /// Registered device with credentials
    Iotf,
    /// Local broker
    Local,
}

impl ConnectionType {
    /// Parse a config/env value, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "quickstart" | "quick_start" | "quick-start" => Some(ConnectionType::QuickStart),
            "iotf" | "registered" => Some(ConnectionType::Iotf),
            "local" | "m2m" => Some(ConnectionType::Local),
            _ => None,
        }
    }
}

/// Thread-safe application state
#[derive(Debug, Default)]
pub struct AppContext {
    location: Mutex<Option<Location>>,
    watch_accel: Mutex<Option<[f32; 3]>>,
    connection_type: Mutex<ConnectionType>,
    current_screen: Mutex<Option<String>>,
    last_accel: Mutex<Option<[f32; 3]>>,
}

impl AppContext {
    pub fn new(connection_type: ConnectionType) -> Self {
        Self {
            connection_type: Mutex::new(connection_type),
            ..Default::default()
        }
    }

    pub fn current_location(&self) -> Option<Location> {
        *self.location.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_current_location(&self, location: Option<Location>) {
        *self.location.lock().unwrap_or_else(|e| e.into_inner()) = location;
    }

    /// Accelerometer data forwarded from a paired watch
    pub fn watch_accel(&self) -> Option<[f32; 3]> {
        *self.watch_accel.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_watch_accel(&self, values: Option<[f32; 3]>) {
        *self.watch_accel.lock().unwrap_or_else(|e| e.into_inner()) = values;
    }

    pub fn connection_type(&self) -> ConnectionType {
        *self.connection_type.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_connection_type(&self, connection_type: ConnectionType) {
        *self.connection_type.lock().unwrap_or_else(|e| e.into_inner()) = connection_type;
    }

    /// Identifier of the screen currently in the foreground
    pub fn current_screen(&self) -> Option<String> {
        self.current_screen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_current_screen(&self, screen: Option<&str>) {
        *self.current_screen.lock().unwrap_or_else(|e| e.into_inner()) =
            screen.map(str::to_string);
    }

    /// Accelerometer vector included in the last published message
    pub fn last_accel(&self) -> Option<[f32; 3]> {
        *self.last_accel.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_last_accel(&self, values: [f32; 3]) {
        *self.last_accel.lock().unwrap_or_else(|e| e.into_inner()) = Some(values);
    }
}

/// Local notification channel observed by the UI
pub trait UiNotifier: Send + Sync {
    /// Send `action` carrying `event` as its data extra
    fn broadcast(&self, action: &str, event: &str);
}

/// Drops every notification
pub struct NullNotifier;

impl UiNotifier for NullNotifier {
    fn broadcast(&self, _action: &str, _event: &str) {}
}

/// Writes notifications to the log
pub struct LogNotifier;

impl UiNotifier for LogNotifier {
    fn broadcast(&self, action: &str, event: &str) {
        log::debug!("[BROADCAST] {} data={}", action, event);
    }
}
