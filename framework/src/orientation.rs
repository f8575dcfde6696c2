//! Orientation from gravity and geomagnetic vectors
//!
//! Builds the device rotation matrix from an accelerometer reading (assumed
//! to be dominated by gravity) and a magnetometer reading, then extracts
//! azimuth/pitch/roll. World frame is East-North-Up.

use crate::sensor_framework::{SensorKind, SensorSample};

/// Standard gravity (m/s²)
const G: f32 = 9.80665;

/// Below 10% of g the device is treated as being in free fall
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * G * G;

/// Minimum |E × A|; smaller means the field is too weak or parallel to gravity
const MIN_HORIZONTAL_FIELD: f32 = 0.1;

/// Row-major 3x3 matrix
pub type Matrix3 = [f32; 9];

/// Rotation (device → world) and inclination matrices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrices {
    pub rotation: Matrix3,
    pub inclination: Matrix3,
}

/// Compute rotation and inclination matrices
///
/// # Arguments
/// * `gravity` - Accelerometer vector in device frame (m/s²)
/// * `geomagnetic` - Magnetometer vector in device frame (µT)
///
/// # Returns
/// * `None` when the input is degenerate (free fall, or magnetic field
///   parallel to gravity / vanishing)
pub fn rotation_matrix(gravity: [f32; 3], geomagnetic: [f32; 3]) -> Option<RotationMatrices> {
    let [mut ax, mut ay, mut az] = gravity;
    let [ex, ey, ez] = geomagnetic;

    let norm_sq_a = ax * ax + ay * ay + az * az;
    if norm_sq_a < FREE_FALL_GRAVITY_SQUARED {
        return None;
    }

    // H = E x A points east
    let mut hx = ey * az - ez * ay;
    let mut hy = ez * ax - ex * az;
    let mut hz = ex * ay - ey * ax;
    let norm_h = (hx * hx + hy * hy + hz * hz).sqrt();
    if norm_h < MIN_HORIZONTAL_FIELD {
        return None;
    }

    let inv_h = 1.0 / norm_h;
    hx *= inv_h;
    hy *= inv_h;
    hz *= inv_h;

    let inv_a = 1.0 / norm_sq_a.sqrt();
    ax *= inv_a;
    ay *= inv_a;
    az *= inv_a;

    // M = A x H points north
    let mx = ay * hz - az * hy;
    let my = az * hx - ax * hz;
    let mz = ax * hy - ay * hx;

    let rotation = [hx, hy, hz, mx, my, mz, ax, ay, az];

    let inv_e = 1.0 / (ex * ex + ey * ey + ez * ez).sqrt();
    let c = (ex * mx + ey * my + ez * mz) * inv_e;
    let s = (ex * ax + ey * ay + ez * az) * inv_e;
    let inclination = [1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c];

    Some(RotationMatrices {
        rotation,
        inclination,
    })
}

/// Extract orientation angles from a rotation matrix
///
/// # Returns
/// * `[azimuth, pitch, roll]` in radians. Azimuth is rotation about -Z
///   (0 = magnetic north), pitch about -X, roll about Y.
pub fn orientation_angles(rotation: &Matrix3) -> [f32; 3] {
    [
        rotation[1].atan2(rotation[4]),
        (-rotation[7]).clamp(-1.0, 1.0).asin(),
        (-rotation[6]).atan2(rotation[8]),
    ]
}

/// Geomagnetic inclination (dip) angle in radians
pub fn inclination(inclination: &Matrix3) -> f32 {
    inclination[5].atan2(inclination[4])
}

/// Snapshot of the estimator output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationState {
    /// azimuth, pitch, roll (radians)
    pub angles: [f32; 3],
    /// azimuth change since the previous successful computation
    pub yaw: f32,
}

impl OrientationState {
    pub fn azimuth(&self) -> f32 {
        self.angles[0]
    }

    pub fn pitch(&self) -> f32 {
        self.angles[1]
    }

    pub fn roll(&self) -> f32 {
        self.angles[2]
    }
}

/// Tracks the latest sensor vectors and derives orientation and yaw
///
/// The previous orientation starts as the zero vector, so the first
/// successful update reports `yaw == azimuth`.
#[derive(Debug, Clone, Default)]
pub struct OrientationEstimator {
    accel: Option<[f32; 3]>,
    magnetic: Option<[f32; 3]>,
    orientation: [f32; 3],
    previous: [f32; 3],
    yaw: f32,
    updates: u64,
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sample and recompute orientation if both vectors are known
    ///
    /// # Returns
    /// * `true` if the orientation was updated
    pub fn update(&mut self, sample: &SensorSample) -> bool {
        match sample.kind {
            SensorKind::Accelerometer => self.accel = Some(sample.values),
            SensorKind::MagneticField => self.magnetic = Some(sample.values),
        }

        let (Some(accel), Some(magnetic)) = (self.accel, self.magnetic) else {
            return false;
        };

        // Degenerate input leaves the stale orientation in place
        let Some(matrices) = rotation_matrix(accel, magnetic) else {
            log::trace!("Degenerate gravity/geomagnetic pair, orientation not updated");
            return false;
        };

        self.previous = self.orientation;
        self.orientation = orientation_angles(&matrices.rotation);
        self.yaw = self.orientation[0] - self.previous[0];
        self.updates += 1;

        log::trace!(
            "Orientation: azimuth: {} pitch: {} roll: {} yaw: {}",
            self.orientation[0],
            self.orientation[1],
            self.orientation[2],
            self.yaw
        );
        true
    }

    /// Latest accelerometer vector, if one has been received
    pub fn accel(&self) -> Option<[f32; 3]> {
        self.accel
    }

    /// Latest magnetometer vector, if one has been received
    pub fn magnetic(&self) -> Option<[f32; 3]> {
        self.magnetic
    }

    pub fn state(&self) -> OrientationState {
        OrientationState {
            angles: self.orientation,
            yaw: self.yaw,
        }
    }

    pub fn previous(&self) -> [f32; 3] {
        self.previous
    }

    /// Number of successful orientation computations
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}
