//! Device sensor component
//!
//! Subscribes to the accelerometer and magnetometer, keeps orientation up to
//! date as samples arrive, and publishes an accel event once per period while
//! enabled.
//!
//! ```text
//!  sensor service ──samples──▶ OrientationListener ──▶ Mutex<OrientationEstimator>
//!                                                             │ snapshot
//!  FixedRateTimer ──tick──▶ AccelPublisher::publish_once ◀────┘
//!                               │            │
//!                               ▼            ▼
//!                     MessagePublisher   UiNotifier
//! ```

use std::sync::{Arc, Mutex};

use crate::config::PublisherConfig;
use crate::context::{AppContext, ConnectionType, UiNotifier, INTENT_ACTION, IOT_SCREEN};
use crate::error::Result;
use crate::orientation::{OrientationEstimator, OrientationState};
use crate::publisher::{MessagePublisher, PublishStats};
use crate::scheduler::FixedRateTimer;
use crate::sensor_framework::{
    SensorDelay, SensorHandle, SensorKind, SensorListener, SensorSample, SensorService,
};
use crate::telemetry::{accel_message, event_topic, EventKind};

/// Feeds pushed samples into the shared estimator
struct OrientationListener {
    estimator: Arc<Mutex<OrientationEstimator>>,
}

impl SensorListener for OrientationListener {
    fn on_sensor_changed(&self, sample: &SensorSample) {
        log::trace!(
            "{} -- x: {} y: {} z: {}",
            sample.kind.name(),
            sample.values[0],
            sample.values[1],
            sample.values[2]
        );
        self.estimator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .update(sample);
    }
}

/// Everything the timer thread needs to build and send one message
struct AccelPublisher {
    context: Arc<AppContext>,
    estimator: Arc<Mutex<OrientationEstimator>>,
    publisher: Arc<dyn MessagePublisher>,
    notifier: Arc<dyn UiNotifier>,
    config: PublisherConfig,
    stats: PublishStats,
}

impl AccelPublisher {
    fn publish_once(&self) -> Result<()> {
        let (lon, lat) = self
            .context
            .current_location()
            .map(|l| (l.longitude, l.latitude))
            .unwrap_or((0.0, 0.0));
        let watch_accel = self.context.watch_accel().unwrap_or([0.0; 3]);

        // Accel and orientation must come from the same instant
        let (accel, orientation) = {
            let estimator = self.estimator.lock().unwrap_or_else(|e| e.into_inner());
            (estimator.accel().unwrap_or([0.0; 3]), estimator.state())
        };

        let payload = accel_message(
            accel,
            orientation.angles,
            orientation.yaw,
            lon,
            lat,
            watch_accel,
        )?;

        let topic = match self.context.connection_type() {
            ConnectionType::QuickStart => event_topic(EventKind::Status),
            _ => event_topic(EventKind::Accel),
        };

        let sent = self
            .publisher
            .publish(&topic, &payload, self.config.retain, self.config.qos);
        match &sent {
            Ok(()) => {
                self.stats.record_sent();
                log::debug!("Published to {}: {}", topic, payload);
            }
            Err(e) => {
                self.stats.record_failed();
                log::warn!("Publish to {} failed: {}", topic, e);
            }
        }

        self.context.set_last_accel(accel);

        if self.context.current_screen().as_deref() == Some(IOT_SCREEN) {
            self.notifier
                .broadcast(INTENT_ACTION, EventKind::Accel.as_str());
        }

        sent.map_err(Into::into)
    }
}

enum Lifecycle {
    Idle,
    Scheduled(FixedRateTimer),
}

/// Accelerometer/magnetometer listener with a periodic accel publisher
///
/// `enable()` and `disable()` are idempotent and may be called from any
/// thread.
pub struct DeviceSensor {
    sensors: Arc<dyn SensorService>,
    accelerometer: Option<SensorHandle>,
    magnetometer: Option<SensorHandle>,
    listener: Arc<dyn SensorListener>,
    publisher: Arc<AccelPublisher>,
    lifecycle: Mutex<Lifecycle>,
}

impl DeviceSensor {
    pub fn new(
        context: Arc<AppContext>,
        sensors: Arc<dyn SensorService>,
        publisher: Arc<dyn MessagePublisher>,
        notifier: Arc<dyn UiNotifier>,
    ) -> Self {
        Self::with_config(
            context,
            sensors,
            publisher,
            notifier,
            PublisherConfig::default(),
        )
    }

    pub fn with_config(
        context: Arc<AppContext>,
        sensors: Arc<dyn SensorService>,
        publisher: Arc<dyn MessagePublisher>,
        notifier: Arc<dyn UiNotifier>,
        config: PublisherConfig,
    ) -> Self {
        log::info!("Creating new DeviceSensor");

        let accelerometer = sensors.default_sensor(SensorKind::Accelerometer);
        let magnetometer = sensors.default_sensor(SensorKind::MagneticField);
        if accelerometer.is_none() {
            log::warn!("No accelerometer available, orientation will not be computed");
        }
        if magnetometer.is_none() {
            log::warn!("No magnetometer available, orientation will not be computed");
        }

        let estimator = Arc::new(Mutex::new(OrientationEstimator::new()));
        let listener: Arc<dyn SensorListener> = Arc::new(OrientationListener {
            estimator: Arc::clone(&estimator),
        });

        Self {
            sensors,
            accelerometer,
            magnetometer,
            listener,
            publisher: Arc::new(AccelPublisher {
                context,
                estimator,
                publisher,
                notifier,
                config,
                stats: PublishStats::new(),
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Subscribe to the sensors and start the periodic publisher
    ///
    /// No-op if already enabled.
    pub fn enable(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*lifecycle, Lifecycle::Scheduled(_)) {
            log::debug!("DeviceSensor already enabled");
            return Ok(());
        }
        log::info!("Enabling device sensors");

        for handle in [&self.accelerometer, &self.magnetometer].into_iter().flatten() {
            if !self.sensors.register_listener(
                Arc::clone(&self.listener),
                handle,
                SensorDelay::Normal,
            ) {
                log::warn!("Failed to register listener for {}", handle.name);
            }
        }

        let publisher = Arc::clone(&self.publisher);
        let timer = FixedRateTimer::schedule(
            "accel-publisher",
            self.publisher.config.initial_delay(),
            self.publisher.config.interval(),
            move || {
                if let Err(e) = publisher.publish_once() {
                    log::debug!("Accel publish tick failed: {}", e);
                }
            },
        );

        match timer {
            Ok(timer) => {
                *lifecycle = Lifecycle::Scheduled(timer);
                Ok(())
            }
            Err(e) => {
                self.sensors.unregister_listener(&self.listener);
                Err(e)
            }
        }
    }

    /// Stop the periodic publisher and unsubscribe from all sensors
    ///
    /// No-op if not enabled. A publish already running is not waited for.
    pub fn disable(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());
        if let Lifecycle::Scheduled(mut timer) = std::mem::replace(&mut *lifecycle, Lifecycle::Idle)
        {
            log::info!("Disabling device sensors");
            timer.cancel();
            self.sensors.unregister_listener(&self.listener);
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(
            *self.lifecycle.lock().unwrap_or_else(|e| e.into_inner()),
            Lifecycle::Scheduled(_)
        )
    }

    /// Build and publish one accel event now
    pub fn publish_once(&self) -> Result<()> {
        self.publisher.publish_once()
    }

    /// Listener to hand to a sensor service, or to feed samples directly
    pub fn listener(&self) -> Arc<dyn SensorListener> {
        Arc::clone(&self.listener)
    }

    pub fn orientation(&self) -> OrientationState {
        self.publisher
            .estimator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .state()
    }

    /// (sent, failed) publish counters
    pub fn stats(&self) -> (u32, u32) {
        self.publisher.stats.get()
    }
}

impl Drop for DeviceSensor {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Location;
    use crate::error::{Error, PublishError};
    use crate::publisher::QoS;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Sensor service that counts (un)registrations
    struct CountingSensorService {
        has_magnetometer: bool,
        registered: AtomicU32,
        unregistered: AtomicU32,
        listeners: Mutex<Vec<(SensorKind, Arc<dyn SensorListener>)>>,
    }

    impl CountingSensorService {
        fn new(has_magnetometer: bool) -> Arc<Self> {
            Arc::new(Self {
                has_magnetometer,
                registered: AtomicU32::new(0),
                unregistered: AtomicU32::new(0),
                listeners: Mutex::new(Vec::new()),
            })
        }

        fn push(&self, sample: SensorSample) {
            for (kind, l) in self.listeners.lock().unwrap().iter() {
                if *kind == sample.kind {
                    l.on_sensor_changed(&sample);
                }
            }
        }
    }

    impl SensorService for CountingSensorService {
        fn default_sensor(&self, kind: SensorKind) -> Option<SensorHandle> {
            match kind {
                SensorKind::MagneticField if !self.has_magnetometer => None,
                _ => Some(SensorHandle::new(kind, kind.name())),
            }
        }

        fn register_listener(
            &self,
            listener: Arc<dyn SensorListener>,
            sensor: &SensorHandle,
            delay: SensorDelay,
        ) -> bool {
            assert_eq!(delay, SensorDelay::Normal);
            self.registered.fetch_add(1, Ordering::SeqCst);
            self.listeners.lock().unwrap().push((sensor.kind, listener));
            true
        }

        fn unregister_listener(&self, listener: &Arc<dyn SensorListener>) {
            self.unregistered.fetch_add(1, Ordering::SeqCst);
            self.listeners
                .lock()
                .unwrap()
                .retain(|(_, l)| !Arc::ptr_eq(l, listener));
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        messages: Mutex<Vec<(String, String, bool, QoS)>>,
        fail: bool,
    }

    impl MessagePublisher for RecordingPublisher {
        fn publish(
            &self,
            topic: &str,
            payload: &str,
            retain: bool,
            qos: QoS,
        ) -> std::result::Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::NotConnected);
            }
            self.messages.lock().unwrap().push((
                topic.to_string(),
                payload.to_string(),
                retain,
                qos,
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<(String, String)>>,
    }

    impl UiNotifier for RecordingNotifier {
        fn broadcast(&self, action: &str, event: &str) {
            self.events
                .lock()
                .unwrap()
                .push((action.to_string(), event.to_string()));
        }
    }

    struct Fixture {
        context: Arc<AppContext>,
        sensors: Arc<CountingSensorService>,
        publisher: Arc<RecordingPublisher>,
        notifier: Arc<RecordingNotifier>,
        device: DeviceSensor,
    }

    fn fixture_with(config: PublisherConfig, connection: ConnectionType, fail: bool) -> Fixture {
        let context = Arc::new(AppContext::new(connection));
        let sensors = CountingSensorService::new(true);
        let publisher = Arc::new(RecordingPublisher {
            fail,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let device = DeviceSensor::with_config(
            Arc::clone(&context),
            sensors.clone(),
            publisher.clone(),
            notifier.clone(),
            config,
        );
        Fixture {
            context,
            sensors,
            publisher,
            notifier,
            device,
        }
    }

    fn fixture(connection: ConnectionType) -> Fixture {
        fixture_with(PublisherConfig::default(), connection, false)
    }

    fn fast_config() -> PublisherConfig {
        PublisherConfig {
            interval_ms: 20,
            initial_delay_ms: 20,
            ..Default::default()
        }
    }

    fn last_payload(publisher: &RecordingPublisher) -> Value {
        let messages = publisher.messages.lock().unwrap();
        let (_, payload, _, _) = messages.last().expect("nothing published");
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn test_enable_twice_registers_once() {
        let f = fixture(ConnectionType::Iotf);
        assert!(!f.device.is_enabled());

        f.device.enable().unwrap();
        f.device.enable().unwrap();

        assert!(f.device.is_enabled());
        assert_eq!(f.sensors.registered.load(Ordering::SeqCst), 2);
        assert_eq!(f.sensors.listeners.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_disable_before_enable_is_noop() {
        let f = fixture(ConnectionType::Iotf);
        f.device.disable();
        assert!(!f.device.is_enabled());
        assert_eq!(f.sensors.unregistered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_enable_disable_cycle() {
        let f = fixture(ConnectionType::Iotf);
        f.device.enable().unwrap();
        f.device.disable();
        f.device.disable();

        assert!(!f.device.is_enabled());
        assert_eq!(f.sensors.unregistered.load(Ordering::SeqCst), 1);
        assert!(f.sensors.listeners.lock().unwrap().is_empty());

        f.device.enable().unwrap();
        assert_eq!(f.sensors.registered.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_missing_magnetometer_is_not_an_error() {
        let context = Arc::new(AppContext::default());
        let sensors = CountingSensorService::new(false);
        let device = DeviceSensor::new(
            context,
            sensors.clone(),
            Arc::new(RecordingPublisher::default()),
            Arc::new(RecordingNotifier::default()),
        );

        device.enable().unwrap();
        assert_eq!(sensors.registered.load(Ordering::SeqCst), 1);

        sensors.push(SensorSample::accelerometer([0.0, 9.8, 0.0]));
        assert_eq!(device.orientation(), OrientationState::default());
    }

    #[test]
    fn test_samples_update_orientation() {
        let f = fixture(ConnectionType::Iotf);
        f.device.enable().unwrap();

        f.sensors.push(SensorSample::accelerometer([0.0, 0.0, 9.8]));
        f.sensors.push(SensorSample::magnetic_field([0.0, 20.0, -40.0]));
        let first = f.device.orientation().azimuth();

        f.sensors.push(SensorSample::magnetic_field([20.0, 0.0, -40.0]));
        let second = f.device.orientation();
        assert!((second.yaw - (second.azimuth() - first)).abs() < 1e-5);
        assert!(second.yaw.abs() > 1.0);
    }

    #[test]
    fn test_quickstart_publishes_to_status_topic() {
        let f = fixture(ConnectionType::QuickStart);
        f.device.publish_once().unwrap();

        let messages = f.publisher.messages.lock().unwrap();
        assert_eq!(messages[0].0, "iot-2/evt/status/fmt/json");
        assert!(!messages[0].2);
        assert_eq!(messages[0].3, QoS::AtMostOnce);
    }

    #[test]
    fn test_registered_publishes_to_accel_topic() {
        let f = fixture(ConnectionType::Iotf);
        f.device.publish_once().unwrap();
        assert_eq!(
            f.publisher.messages.lock().unwrap()[0].0,
            "iot-2/evt/accel/fmt/json"
        );
    }

    #[test]
    fn test_unknown_location_publishes_zeros() {
        let f = fixture(ConnectionType::Iotf);
        f.device.publish_once().unwrap();

        let v = last_payload(&f.publisher);
        assert_eq!(v["d"]["lon"], 0.0);
        assert_eq!(v["d"]["lat"], 0.0);
    }

    #[test]
    fn test_payload_carries_state() {
        let f = fixture(ConnectionType::Iotf);
        f.context.set_current_location(Some(Location {
            latitude: 48.5,
            longitude: 2.25,
        }));
        f.context.set_watch_accel(Some([0.5, 0.25, 9.75]));
        f.device
            .listener()
            .on_sensor_changed(&SensorSample::accelerometer([0.0, 0.0, 9.75]));
        f.device
            .listener()
            .on_sensor_changed(&SensorSample::magnetic_field([0.0, 20.0, -40.0]));

        f.device.publish_once().unwrap();

        let v = last_payload(&f.publisher);
        assert_eq!(v["d"]["acceleration_z"], 9.75);
        assert_eq!(v["d"]["lon"], 2.25);
        assert_eq!(v["d"]["lat"], 48.5);
        assert_eq!(v["d"]["acceleration_watch_x"], 0.5);
        assert_eq!(f.context.last_accel(), Some([0.0, 0.0, 9.75]));
    }

    #[test]
    fn test_broadcast_only_when_iot_screen_active() {
        let f = fixture(ConnectionType::Iotf);
        f.device.publish_once().unwrap();
        assert!(f.notifier.events.lock().unwrap().is_empty());

        f.context.set_current_screen(Some("settings"));
        f.device.publish_once().unwrap();
        assert!(f.notifier.events.lock().unwrap().is_empty());

        f.context.set_current_screen(Some(IOT_SCREEN));
        f.device.publish_once().unwrap();
        let events = f.notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], (INTENT_ACTION.to_string(), "accel".to_string()));
    }

    #[test]
    fn test_publish_failure_is_counted_and_state_still_recorded() {
        let f = fixture_with(PublisherConfig::default(), ConnectionType::Iotf, true);
        f.context.set_current_screen(Some(IOT_SCREEN));

        let result = f.device.publish_once();
        assert!(matches!(
            result,
            Err(Error::Publish(PublishError::NotConnected))
        ));
        assert_eq!(f.device.stats(), (0, 1));
        assert_eq!(f.context.last_accel(), Some([0.0; 3]));
        assert_eq!(f.notifier.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_timer_publishes_while_enabled() {
        let f = fixture_with(fast_config(), ConnectionType::Iotf, false);
        f.device.enable().unwrap();
        thread::sleep(Duration::from_millis(150));
        f.device.disable();

        thread::sleep(Duration::from_millis(30));
        let published = f.publisher.messages.lock().unwrap().len();
        assert!(published >= 2, "expected periodic publishes, got {}", published);
        assert_eq!(f.device.stats().0 as usize, published);

        thread::sleep(Duration::from_millis(80));
        assert_eq!(f.publisher.messages.lock().unwrap().len(), published);
    }

    #[test]
    fn test_default_initial_delay_holds_first_publish() {
        let f = fixture(ConnectionType::Iotf);
        f.device.enable().unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(f.publisher.messages.lock().unwrap().is_empty());
        f.device.disable();
    }

    #[test]
    fn test_drop_unregisters() {
        let f = fixture(ConnectionType::Iotf);
        f.device.enable().unwrap();
        let sensors = Arc::clone(&f.sensors);
        drop(f);
        assert_eq!(sensors.unregistered.load(Ordering::SeqCst), 1);
    }
}
