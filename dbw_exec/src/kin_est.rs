//! # Kinematic state estimator
//!
//! Integrates a kinematic bicycle model once per misc report to estimate the pose and velocity of
//! the vehicle's centre of gravity.
//!
//! Symbols used below:
//!
//! - `δ`: front tire angle relative to the vehicle's longitudinal axis
//! - `β`: slip angle, the direction the centre of gravity moves relative to the same axis,
//!   `atan(rear_axle_to_cog * tan(δ) / wheelbase)`
//! - `v0`: speed of the centre of gravity, signed by the longitudinal velocity
//! - `ω`: yaw rate, `cos(β) * tan(δ) / wheelbase * v0`
//!
//! Over one step the course (`yaw + β`) turns at a constant `ω` and the speed changes at a
//! constant acceleration. The displacement along that path has a closed form with a removable
//! singularity at `ω = 0`; [`integrate_curved`] evaluates it through half-angle terms which stay
//! accurate as `ω` shrinks, and [`integrate_straight`] is used once `|ω|` drops below
//! [`STRAIGHT_YAW_RATE_THRESHOLD`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use comms_if::{state::VehicleKinematicState, Stamp};
use util::maths::{sinc, wrap_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Yaw rates smaller than this are integrated as straight lines.
///
/// Units: radians/second
pub const STRAIGHT_YAW_RATE_THRESHOLD: f64 = 1e-18;

/// Below this half angle `(cos(h) - sinc(h)) / h` is evaluated by its series.
const HALF_ANGLE_SERIES_THRESHOLD: f64 = 1e-3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic bicycle model estimator.
#[derive(Debug, Clone)]
pub struct KinEstimator {
    front_axle_to_cog_m: f64,
    rear_axle_to_cog_m: f64,

    /// Latest front tire angle from the steering report.
    front_wheel_angle_rad: f64,

    /// `None` until the first misc report seeds it.
    state: Option<VehicleKinematicState>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum KinEstError {
    #[error("Received a stamp ({received:?}) earlier than the current state's ({current:?})")]
    NonMonotonicStamp { current: Stamp, received: Stamp },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinEstimator {
    pub fn new(front_axle_to_cog_m: f64, rear_axle_to_cog_m: f64) -> Self {
        Self {
            front_axle_to_cog_m,
            rear_axle_to_cog_m,
            front_wheel_angle_rad: 0.0,
            state: None,
        }
    }

    /// The current estimate, `None` before the first misc report.
    pub fn state(&self) -> Option<&VehicleKinematicState> {
        self.state.as_ref()
    }

    /// Record the front tire angle measured by the steering report. The rear wheels don't steer.
    pub fn set_front_wheel_angle(&mut self, angle_rad: f64) {
        self.front_wheel_angle_rad = angle_rad;

        if let Some(s) = self.state.as_mut() {
            s.front_wheel_angle_rad = angle_rad;
            s.rear_wheel_angle_rad = 0.0;
        }
    }

    /// Advance the estimate to `stamp` given the newly measured signed speed.
    ///
    /// `derive` should be set once both steering and wheel speed reports have been received.
    /// Without it only the stamp and velocities are updated, the acceleration, heading rate and
    /// pose are held.
    ///
    /// Returns the new state when one should be published. The first call seeds the state at the
    /// origin and returns `None`. A stamp earlier than the current one is rejected and the state
    /// is left untouched.
    ///
    /// The path speed `v0 = sqrt(v_lat² + v_lon²)` takes the sign of `speed_mps`, so when reversing
    /// the pose moves backwards along the heading and the heading rate flips sign. With an
    /// unsigned `v0` a reversing vehicle would be integrated as if driving forwards.
    pub fn update(
        &mut self,
        stamp: Stamp,
        speed_mps: f64,
        derive: bool,
    ) -> Result<Option<VehicleKinematicState>, KinEstError> {
        let wheelbase = self.front_axle_to_cog_m + self.rear_axle_to_cog_m;
        let delta = self.front_wheel_angle_rad;

        // Measured speed is at the rear axle, where there is no lateral velocity. Lateral velocity
        // grows linearly to tan(δ) * v_lon at the front axle.
        let lat_velocity_mps = self.rear_axle_to_cog_m / wheelbase * speed_mps * delta.tan();

        let state = match self.state.as_mut() {
            Some(s) => s,
            None => {
                self.state = Some(VehicleKinematicState {
                    stamp,
                    longitudinal_velocity_mps: speed_mps,
                    lateral_velocity_mps: lat_velocity_mps,
                    front_wheel_angle_rad: delta,
                    ..Default::default()
                });
                return Ok(None);
            }
        };

        let dt = stamp.secs_since(&state.stamp);
        if dt < 0.0 {
            return Err(KinEstError::NonMonotonicStamp {
                current: state.stamp,
                received: stamp,
            });
        }

        let prev_speed_mps = state.longitudinal_velocity_mps;

        state.stamp = stamp;
        state.longitudinal_velocity_mps = speed_mps;
        state.lateral_velocity_mps = lat_velocity_mps;
        state.front_wheel_angle_rad = delta;

        if !derive {
            return Ok(None);
        }

        // Hold the previous acceleration rather than divide by zero
        if dt > 0.0 {
            state.acceleration_mps2 = (speed_mps - prev_speed_mps) / dt;
        }

        step_bicycle_model(state, self.rear_axle_to_cog_m, wheelbase, dt);

        Ok(Some(*state))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Displacement `(dx, dy)` over `dt` of a point starting along `course` at signed speed `v0`,
/// accelerating at `accel` while the course turns at `yaw_rate`.
///
/// Equal to
///
/// ```text
/// dx = (v0 + a t)/ω sin(c + ω t) - v0/ω sin(c) + a/ω² cos(c + ω t) - a/ω² cos(c)
/// dy = -(v0 + a t)/ω cos(c + ω t) + v0/ω cos(c) + a/ω² sin(c + ω t) - a/ω² sin(c)
/// ```
///
/// rewritten in terms of the half angle `h = ω t / 2` so that no term divides by `ω`.
pub fn integrate_curved(course: f64, v0: f64, accel: f64, yaw_rate: f64, dt: f64) -> (f64, f64) {
    let h = 0.5 * yaw_rate * dt;
    let mid = course + h;
    let (sin_mid, cos_mid) = mid.sin_cos();

    let s = sinc(h);
    let g = if h.abs() < HALF_ANGLE_SERIES_THRESHOLD {
        -h / 3.0 + h * h * h / 30.0
    } else {
        (h.cos() - s) / h
    };

    let lin = v0 * dt * s;
    let quad = 0.5 * accel * dt * dt;

    (
        lin * cos_mid + quad * (cos_mid * s + sin_mid * g),
        lin * sin_mid + quad * (sin_mid * s - cos_mid * g),
    )
}

/// Displacement `(dx, dy)` over `dt` of a point moving in a straight line along `course`.
pub fn integrate_straight(course: f64, v0: f64, accel: f64, dt: f64) -> (f64, f64) {
    let dist = v0 * dt + 0.5 * accel * dt * dt;

    (course.cos() * dist, course.sin() * dist)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance pose and heading rate of `state` by `dt`.
fn step_bicycle_model(
    state: &mut VehicleKinematicState,
    rear_axle_to_cog_m: f64,
    wheelbase_m: f64,
    dt: f64,
) {
    let delta = state.front_wheel_angle_rad;
    let accel = state.acceleration_mps2;

    let v0 = state
        .lateral_velocity_mps
        .hypot(state.longitudinal_velocity_mps)
        .copysign(state.longitudinal_velocity_mps);

    let beta = (rear_axle_to_cog_m * delta.tan()).atan2(wheelbase_m);
    let course = state.pose.yaw + beta;

    // Yaw change per meter travelled
    let yaw_change = beta.cos() * delta.tan() / wheelbase_m;
    let yaw_rate = yaw_change * v0;

    let (dx, dy) = if yaw_rate.abs() < STRAIGHT_YAW_RATE_THRESHOLD {
        integrate_straight(course, v0, accel, dt)
    } else {
        integrate_curved(course, v0, accel, yaw_rate, dt)
    };

    state.pose.x += dx;
    state.pose.y += dy;

    let yaw = state.pose.yaw + yaw_change * (v0 * dt + 0.5 * accel * dt * dt);
    state.pose.yaw = if (-std::f64::consts::PI..std::f64::consts::PI).contains(&yaw) {
        yaw
    } else {
        wrap_pi(yaw)
    };

    state.heading_rate_rps = yaw_rate;
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    const FRONT: f64 = 1.2;
    const REAR: f64 = 1.6;

    /// The curved integral written directly, without the half angle rewrite.
    fn curved_direct(c: f64, v0: f64, a: f64, w: f64, t: f64) -> (f64, f64) {
        (
            (v0 + a * t) / w * (c + w * t).sin() - v0 / w * c.sin() + a / (w * w) * (c + w * t).cos()
                - a / (w * w) * c.cos(),
            -(v0 + a * t) / w * (c + w * t).cos() + v0 / w * c.cos() + a / (w * w) * (c + w * t).sin()
                - a / (w * w) * c.sin(),
        )
    }

    fn stamp(s: f64) -> Stamp {
        let sec = s.floor();
        Stamp::new(sec as i32, ((s - sec) * 1e9).round() as u32)
    }

    #[test]
    fn test_first_report_seeds() {
        let mut est = KinEstimator::new(FRONT, REAR);
        est.set_front_wheel_angle(0.1);

        assert_eq!(est.update(stamp(10.0), 5.0, true), Ok(None));

        let s = est.state().unwrap();
        assert_eq!(s.stamp, stamp(10.0));
        assert_eq!((s.pose.x, s.pose.y, s.pose.yaw), (0.0, 0.0, 0.0));
        assert_eq!(s.longitudinal_velocity_mps, 5.0);
    }

    #[test]
    fn test_earlier_stamp_rejected() {
        let mut est = KinEstimator::new(FRONT, REAR);
        est.update(stamp(10.0), 1.0, true).unwrap();
        est.update(stamp(11.0), 2.0, true).unwrap();
        let before = *est.state().unwrap();

        assert_eq!(
            est.update(stamp(10.5), 7.0, true),
            Err(KinEstError::NonMonotonicStamp {
                current: stamp(11.0),
                received: stamp(10.5)
            })
        );
        assert_eq!(*est.state().unwrap(), before);
    }

    #[test]
    fn test_no_derive_holds_pose() {
        let mut est = KinEstimator::new(FRONT, REAR);
        est.update(stamp(0.0), 1.0, false).unwrap();

        assert_eq!(est.update(stamp(1.0), 2.0, false), Ok(None));

        let s = est.state().unwrap();
        assert_eq!(s.stamp, stamp(1.0));
        assert_eq!(s.longitudinal_velocity_mps, 2.0);
        assert_eq!(s.acceleration_mps2, 0.0);
        assert_eq!((s.pose.x, s.pose.y), (0.0, 0.0));
    }

    #[test]
    fn test_straight_line() {
        let mut est = KinEstimator::new(FRONT, REAR);
        est.update(stamp(0.0), 2.0, true).unwrap();

        let s = est.update(stamp(1.0), 4.0, true).unwrap().unwrap();

        // The step integrates forwards from the latest measured speed, 4 m/s at 2 m/s^2
        assert_eq!(s.acceleration_mps2, 2.0);
        assert!((s.pose.x - 5.0).abs() < 1e-12);
        assert_eq!(s.pose.y, 0.0);
        assert_eq!(s.pose.yaw, 0.0);
        assert_eq!(s.heading_rate_rps, 0.0);
    }

    #[test]
    fn test_reversing() {
        let mut est = KinEstimator::new(FRONT, REAR);
        est.update(stamp(0.0), -1.0, true).unwrap();

        let s = est.update(stamp(2.0), -1.0, true).unwrap().unwrap();
        assert!((s.pose.x + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quarter_circle() {
        // With no rear overhang β = 0 and the reference point drives a circle of radius
        // wheelbase / tan(δ)
        let mut est = KinEstimator::new(2.0, 0.0);
        est.set_front_wheel_angle((0.5f64).atan());
        est.update(stamp(0.0), 1.0, true).unwrap();

        // Radius 4 m, so a quarter turn is 2π m long
        let t = std::f64::consts::PI * 2.0;
        let s = est.update(stamp(t), 1.0, true).unwrap().unwrap();

        assert!((s.pose.x - 4.0).abs() < 1e-6);
        assert!((s.pose.y - 4.0).abs() < 1e-6);
        assert!((s.pose.yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((s.heading_rate_rps - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_matches_direct_formula() {
        for &(c, v0, a, w, t) in &[
            (0.3, 5.0, 1.0, 0.4, 0.1),
            (-2.0, 12.0, -3.0, -0.05, 0.5),
            (1.0, 0.0, 2.0, 1.5, 2.0),
        ] {
            let (dx, dy) = integrate_curved(c, v0, a, w, t);
            let (ex, ey) = curved_direct(c, v0, a, w, t);

            assert!((dx - ex).abs() < 1e-9, "dx {} != {}", dx, ex);
            assert!((dy - ey).abs() < 1e-9, "dy {} != {}", dy, ey);
        }
    }

    proptest! {
        #[test]
        fn zero_dt_leaves_pose_unchanged(
            speed in -40.0..40.0f64,
            next_speed in -40.0..40.0f64,
            angle in -0.6..0.6f64,
            yaw_steps in 1u32..5,
        ) {
            let mut est = KinEstimator::new(FRONT, REAR);
            est.set_front_wheel_angle(angle);
            est.update(stamp(0.0), speed, true).unwrap();

            // Move somewhere non-trivial first
            for i in 1..=yaw_steps {
                est.update(stamp(i as f64 * 0.1), speed, true).unwrap();
            }
            let before = est.state().unwrap().pose;

            let after = est
                .update(stamp(yaw_steps as f64 * 0.1), next_speed, true)
                .unwrap()
                .unwrap()
                .pose;

            prop_assert_eq!(before, after);
        }

        #[test]
        fn zero_dt_integrals_vanish(
            course in -4.0..4.0f64,
            v0 in -40.0..40.0f64,
            accel in -10.0..10.0f64,
            yaw_rate in -2.0..2.0f64,
        ) {
            prop_assert_eq!(integrate_curved(course, v0, accel, yaw_rate, 0.0), (0.0, 0.0));
            prop_assert_eq!(integrate_straight(course, v0, accel, 0.0), (0.0, 0.0));
        }

        #[test]
        fn curved_converges_to_straight(
            course in -4.0..4.0f64,
            v0 in -40.0..40.0f64,
            accel in -10.0..10.0f64,
            dt in 0.0..1.0f64,
            exponent in 10.0..20.0f64,
            negative in any::<bool>(),
        ) {
            let yaw_rate = if negative { -1.0 } else { 1.0 } * 10f64.powf(-exponent);

            let (cx, cy) = integrate_curved(course, v0, accel, yaw_rate, dt);
            let (sx, sy) = integrate_straight(course, v0, accel, dt);

            prop_assert!((cx - sx).abs() < 1e-8, "x: {} vs {}", cx, sx);
            prop_assert!((cy - sy).abs() < 1e-8, "y: {} vs {}", cy, sy);
        }
    }
}
