//! Demo Mode - Synthetic telemetry log generator
//!
//! Builds a plausible match log for testing the replay pipeline without a
//! robot: driver-station phase flags, correlated drive waveforms, battery
//! drain, and a vision target channel. Generation is seeded so the same
//! seed always yields byte-identical logs.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::wpilog::LogBuilder;

const ENTRY_ENABLED: u32 = 1;
const ENTRY_AUTONOMOUS: u32 = 2;
const ENTRY_LEFT_VEL: u32 = 3;
const ENTRY_RIGHT_VEL: u32 = 4;
const ENTRY_BATTERY: u32 = 5;
const ENTRY_MODE: u32 = 6;
const ENTRY_TARGETS: u32 = 7;

/// Autonomous phase begins this many seconds in
const AUTO_START_S: f64 = 1.0;

/// Teleop takes over this many seconds in (when the log is long enough)
const TELEOP_START_S: f64 = 16.0;

/// Telemetry sample spacing
const SAMPLE_PERIOD_S: f64 = 0.02;

/// Generate a synthetic match log of the given duration.
///
/// The phase structure is fixed (disabled, then autonomous, then teleop);
/// the waveforms and vision targets vary with the seed.
pub fn generate(seed: u64, duration: Duration) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let duration_s = duration.as_secs_f64();
    let mut builder = LogBuilder::with_extra_header("relog demo");

    builder
        .start_entry(ENTRY_ENABLED, "DS:enabled", "boolean", "", 0)
        .start_entry(ENTRY_AUTONOMOUS, "DS:autonomous", "boolean", "", 0)
        .start_entry(ENTRY_LEFT_VEL, "Drive:leftVelocity", "double", "{\"unit\":\"mps\"}", 0)
        .start_entry(ENTRY_RIGHT_VEL, "Drive:rightVelocity", "double", "{\"unit\":\"mps\"}", 0)
        .start_entry(ENTRY_BATTERY, "Robot:batteryVoltage", "double", "{\"unit\":\"V\"}", 0)
        .start_entry(ENTRY_MODE, "Robot:mode", "string", "", 0)
        .start_entry(ENTRY_TARGETS, "Vision:targetIds", "int64[]", "", 0);

    builder
        .append_boolean(ENTRY_ENABLED, 0, false)
        .append_boolean(ENTRY_AUTONOMOUS, 0, false)
        .append_string(ENTRY_MODE, 0, "disabled");

    let ticks = (duration_s / SAMPLE_PERIOD_S) as u64;
    let auto_tick = (AUTO_START_S / SAMPLE_PERIOD_S) as u64;
    let teleop_tick = (TELEOP_START_S / SAMPLE_PERIOD_S) as u64;
    let ticks_per_second = (1.0 / SAMPLE_PERIOD_S) as u64;

    for tick in 0..=ticks {
        let t = tick as f64 * SAMPLE_PERIOD_S;
        let us = (t * 1e6) as u64;

        if tick == auto_tick && ticks > auto_tick {
            builder
                .append_boolean(ENTRY_ENABLED, us, true)
                .append_boolean(ENTRY_AUTONOMOUS, us, true)
                .append_string(ENTRY_MODE, us, "autonomous");
        }
        if tick == teleop_tick && ticks > teleop_tick {
            builder
                .append_boolean(ENTRY_AUTONOMOUS, us, false)
                .append_string(ENTRY_MODE, us, "teleop");
        }

        let enabled = tick >= auto_tick && ticks > auto_tick;
        if enabled {
            // Correlated drive velocities: shared base speed, small
            // per-side noise so the two channels differ.
            let base = 2.0 * (t * 0.7).sin() + 1.5 * (t * 0.23).cos();
            let left = base + rng.gen_range(-0.1..0.1);
            let right = base + rng.gen_range(-0.1..0.1);
            builder
                .append_double(ENTRY_LEFT_VEL, us, left)
                .append_double(ENTRY_RIGHT_VEL, us, right);
        }

        // Battery sags slowly under load with sensor ripple, at 1 Hz
        if tick % ticks_per_second == 0 {
            let load = if enabled { 0.8 } else { 0.0 };
            let volts = 12.8 - load * (t / 60.0) + rng.gen_range(-0.05..0.05);
            builder.append_double(ENTRY_BATTERY, us, volts);
        }

        // Vision reports a varying target set twice a second
        if enabled && tick % (ticks_per_second / 2) == 0 {
            let count = rng.gen_range(0..4);
            let targets: Vec<i64> = (0..count).map(|_| rng.gen_range(1..17)).collect();
            builder.append_int64_array(ENTRY_TARGETS, us, &targets);
        }
    }

    builder.into_bytes()
}
