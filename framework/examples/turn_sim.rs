//! Simulates a device turning on a table to show orientation and yaw output
//!
//! The device lies flat and turns clockwise in 30° steps, pauses, then a
//! free-fall reading shows that degenerate input leaves orientation unchanged.
//!
//! Run with: cargo run -p orientation-telemetry --example turn_sim

use orientation_telemetry::orientation::OrientationEstimator;
use orientation_telemetry::telemetry::accel_message;
use orientation_telemetry::SensorSample;

const G: f32 = 9.80665;
const FIELD_H: f32 = 22.0; // µT
const FIELD_V: f32 = 42.0; // µT, pointing down

fn magnetic_for_heading(heading_deg: f32) -> [f32; 3] {
    let h = heading_deg.to_radians();
    [-FIELD_H * h.sin(), FIELD_H * h.cos(), -FIELD_V]
}

fn main() {
    let mut estimator = OrientationEstimator::new();

    println!("=== Orientation Simulation ===\n");

    println!("Phase 1: ACCEL ONLY (no magnetometer yet)");
    estimator.update(&SensorSample::accelerometer([0.0, 0.0, G]));
    println!(
        "  updates: {}, yaw: {:.3}\n",
        estimator.update_count(),
        estimator.state().yaw
    );

    println!("Phase 2: TURNING (0° → 150° in 30° steps)");
    println!("  note: first yaw is measured against a zero orientation");
    for step in 0..6 {
        let heading = step as f32 * 30.0;
        estimator.update(&SensorSample::magnetic_field(magnetic_for_heading(heading)));
        let state = estimator.state();
        println!(
            "  heading {:>5.1}° → azimuth {:>6.1}° pitch {:>5.1}° roll {:>5.1}° yaw {:>6.1}°",
            heading,
            state.azimuth().to_degrees(),
            state.pitch().to_degrees(),
            state.roll().to_degrees(),
            state.yaw.to_degrees()
        );
    }

    println!("\nPhase 3: FREE FALL (orientation must not change)");
    let before = estimator.state();
    let updated = estimator.update(&SensorSample::accelerometer([0.0, 0.0, 0.2]));
    println!(
        "  updated: {}, azimuth unchanged: {}",
        updated,
        estimator.state() == before
    );

    println!("\nLast message payload:");
    let state = estimator.state();
    match accel_message(
        estimator.accel().unwrap_or([0.0; 3]),
        state.angles,
        state.yaw,
        0.0,
        0.0,
        [0.0; 3],
    ) {
        Ok(payload) => println!("  {}", payload),
        Err(e) => println!("  failed to format payload: {}", e),
    }
}
