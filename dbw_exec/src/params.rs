//! Parameters structure for the DBW interface

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the DBW interface.
///
/// Loaded from `dbw_exec.toml`. Use [`DbwParams::validate`] before handing them to the interface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DbwParams {
    // ---- HARDWARE ----

    /// Build number of the DBW ECU firmware, echoed in every global enable command.
    pub ecu_build_num: u16,

    // ---- GEOMETRY ----

    /// Distance from the front axle to the centre of gravity.
    ///
    /// Units: meters
    pub front_axle_to_cog_m: f64,

    /// Distance from the rear axle to the centre of gravity.
    ///
    /// Units: meters
    pub rear_axle_to_cog_m: f64,

    /// Ratio of steering wheel angle to tire angle.
    pub steer_to_tire_ratio: f64,

    /// Largest steering angle that may be commanded, in either direction.
    ///
    /// Units: steering command units, degrees of steering wheel for vehicle and ackermann
    /// commands.
    pub max_steer_angle: f64,

    // ---- CAPABILITIES ----

    /// Units: meters/second^2
    pub acceleration_limit_mps2: f64,

    /// Magnitude of the largest permitted deceleration, the sign in the file is ignored.
    ///
    /// Units: meters/second^2
    pub deceleration_limit_mps2: f64,

    /// Units: meters/second^3
    pub acceleration_positive_jerk_limit_mps3: f64,

    /// Units: meters/second^3
    pub deceleration_negative_jerk_limit_mps3: f64,

    // ---- TIMING ----

    /// Period of the command publisher.
    ///
    /// Units: milliseconds
    pub pub_period_ms: u64,

    /// Number of consecutive publish cycles the vehicle must report ready before an enable
    /// request engages autonomy.
    #[serde(default = "default_dbw_enable_cycles")]
    pub dbw_enable_cycles: u32,

    /// Minimum time between two log records from the same call site.
    ///
    /// Units: seconds
    #[serde(default = "default_log_throttle_period_s")]
    pub log_throttle_period_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a set of parameters can be rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Wheelbase must be positive, axle distances sum to {0} m")]
    InvalidWheelbase(f64),

    #[error("Steer to tire ratio must be non-zero and finite, found {0}")]
    InvalidSteerRatio(f64),

    #[error("Max steer angle must be positive, found {0}")]
    InvalidMaxSteerAngle(f64),

    #[error("Acceleration limit must not be negative, found {0} m/s^2")]
    InvalidAccelLimit(f64),

    #[error("Publish period must be at least 1 ms")]
    InvalidPubPeriod,

    #[error("At least one enable cycle is required")]
    InvalidEnableCycles,

    #[error("Log throttle period must not be negative, found {0} s")]
    InvalidThrottlePeriod(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DbwParams {
    /// Check the parameters and normalise the deceleration limit to a magnitude.
    pub fn validate(mut self) -> Result<Self, ParamsError> {
        let wheelbase = self.wheelbase_m();
        if !(wheelbase > 0.0) {
            return Err(ParamsError::InvalidWheelbase(wheelbase));
        }
        if self.steer_to_tire_ratio == 0.0 || !self.steer_to_tire_ratio.is_finite() {
            return Err(ParamsError::InvalidSteerRatio(self.steer_to_tire_ratio));
        }
        if !(self.max_steer_angle > 0.0) {
            return Err(ParamsError::InvalidMaxSteerAngle(self.max_steer_angle));
        }
        if !(self.acceleration_limit_mps2 >= 0.0) {
            return Err(ParamsError::InvalidAccelLimit(self.acceleration_limit_mps2));
        }
        if self.pub_period_ms == 0 {
            return Err(ParamsError::InvalidPubPeriod);
        }
        if self.dbw_enable_cycles == 0 {
            return Err(ParamsError::InvalidEnableCycles);
        }
        if !(self.log_throttle_period_s >= 0.0) {
            return Err(ParamsError::InvalidThrottlePeriod(self.log_throttle_period_s));
        }

        self.deceleration_limit_mps2 = self.deceleration_limit_mps2.abs();

        Ok(self)
    }

    /// Distance between the front and rear axles.
    pub fn wheelbase_m(&self) -> f64 {
        self.front_axle_to_cog_m + self.rear_axle_to_cog_m
    }
}

impl Default for DbwParams {
    fn default() -> Self {
        Self {
            ecu_build_num: 0,
            front_axle_to_cog_m: 1.5,
            rear_axle_to_cog_m: 1.5,
            steer_to_tire_ratio: 16.0,
            max_steer_angle: 500.0,
            acceleration_limit_mps2: 3.0,
            deceleration_limit_mps2: 3.0,
            acceleration_positive_jerk_limit_mps3: 0.0,
            deceleration_negative_jerk_limit_mps3: 0.0,
            pub_period_ms: 20,
            dbw_enable_cycles: default_dbw_enable_cycles(),
            log_throttle_period_s: default_log_throttle_period_s(),
        }
    }
}

fn default_dbw_enable_cycles() -> u32 {
    3
}

fn default_log_throttle_period_s() -> f64 {
    1.0
}
