//! # Outbound vehicle state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::Stamp;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Each state enum has a `None` variant used when the last report couldn't be decoded or before
/// any report has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gear {
    #[default]
    None,
    Drive,
    Reverse,
    Park,
    Low,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Blinker {
    #[default]
    None,
    Off,
    Left,
    Right,
    Hazard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Headlight {
    #[default]
    None,
    Off,
    On,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Wiper {
    #[default]
    None,
    Off,
    Low,
    High,
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    None,
    Autonomous,
    Manual,
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Aggregated view of the vehicle's discrete state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStateReport {
    pub stamp: Stamp,

    /// Units: percent
    pub fuel: u8,

    pub blinker: Blinker,
    pub headlight: Headlight,
    pub wiper: Wiper,
    pub rear_wiper: Wiper,
    pub gear: Gear,
    pub mode: Mode,
    pub hand_brake: bool,
    pub horn: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    pub stamp: Stamp,

    /// Signed by direction of travel.
    ///
    /// Units: meters/second
    pub velocity_mps: f64,

    /// Units: radians
    pub front_wheel_angle_rad: f64,

    /// Units: radians
    pub rear_wheel_angle_rad: f64,
}

/// Planar pose in the odometry frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Heading about the upwards axis, in `[-pi, pi)`.
    ///
    /// Units: radians
    pub yaw: f64,
}

/// Estimated kinematic state of the vehicle's centre of gravity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleKinematicState {
    pub stamp: Stamp,
    pub pose: Pose2,

    /// Units: meters/second
    pub longitudinal_velocity_mps: f64,

    /// Units: meters/second
    pub lateral_velocity_mps: f64,

    /// Units: meters/second^2
    pub acceleration_mps2: f64,

    /// Units: radians/second
    pub heading_rate_rps: f64,

    /// Units: radians
    pub front_wheel_angle_rad: f64,

    /// Units: radians
    pub rear_wheel_angle_rad: f64,
}
