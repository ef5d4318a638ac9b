//! # Inbound commands
//!
//! Commands sent to the DBW interface by the autonomy stack. Enumerated fields are carried as raw
//! `u8` codes so that a malformed or newer producer can send values this crate doesn't know about,
//! the interface decodes them with the `TryFrom<u8>` impls on the intent enums below.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::Stamp;

// ------------------------------------------------------------------------------------------------
// CONTROL COMMANDS
// ------------------------------------------------------------------------------------------------

/// Target speed and path curvature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighLevelControlCommand {
    pub stamp: Stamp,

    /// Target speed, negative to drive backwards.
    ///
    /// Units: meters/second
    pub velocity_mps: f64,

    /// Curvature of the path, positive to the left.
    ///
    /// Units: 1/meters
    pub curvature: f64,
}

/// Longitudinal acceleration, target speed and front wheel angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleControlCommand {
    pub stamp: Stamp,

    /// Units: meters/second^2
    pub long_accel_mps2: f64,

    /// Units: meters/second
    pub velocity_mps: f64,

    /// Units: radians
    pub front_wheel_angle_rad: f64,

    /// Units: radians
    pub rear_wheel_angle_rad: f64,
}

/// Lateral half of an [`AckermannControlCommand`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AckermannLateralCommand {
    /// Units: radians
    pub steering_tire_angle: f64,

    /// Units: radians/second
    pub steering_tire_rotation_rate: f64,
}

/// Longitudinal half of an [`AckermannControlCommand`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongitudinalCommand {
    /// Units: meters/second
    pub speed: f64,

    /// Units: meters/second^2
    pub acceleration: f64,

    /// Units: meters/second^3
    pub jerk: f64,
}

/// Ackermann steering command split into lateral and longitudinal parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AckermannControlCommand {
    pub stamp: Stamp,
    pub lateral: AckermannLateralCommand,
    pub longitudinal: LongitudinalCommand,
}

/// Raw pedal and steering values.
///
/// The units of these fields are not defined by the producer, so the interface never accepts them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawControlCommand {
    pub stamp: Stamp,
    pub throttle: u32,
    pub brake: u32,
    pub front_steer: i32,
    pub rear_steer: i32,
}

/// Any one of the control command kinds the interface accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    HighLevel(HighLevelControlCommand),
    Vehicle(VehicleControlCommand),
    Ackermann(AckermannControlCommand),
    Raw(RawControlCommand),
}

// ------------------------------------------------------------------------------------------------
// STATE COMMANDS
// ------------------------------------------------------------------------------------------------

/// Gear, blinker and parking brake intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleStateCommand {
    pub stamp: Stamp,

    /// A [`BlinkerIntent`] code.
    pub blinker: u8,

    /// A [`GearIntent`] code.
    pub gear: u8,

    /// `true` to engage the parking brake.
    pub hand_brake: bool,
}

/// Gear requested by a [`VehicleStateCommand`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum GearIntent {
    NoCommand = 0,
    Drive = 1,
    Reverse = 2,
    Park = 3,
    Low = 4,
    Neutral = 5,
}

/// Blinker state requested by a [`VehicleStateCommand`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum BlinkerIntent {
    NoCommand = 0,
    Off = 1,
    Left = 2,
    Right = 3,
    Hazard = 4,
}

/// Request to switch between manual and autonomous driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeChangeRequest {
    pub stamp: Stamp,

    /// A [`ModeIntent`] code.
    pub mode: u8,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum ModeIntent {
    Autonomous = 0,
    Manual = 1,
}

/// Headlight request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlightsCommand {
    pub stamp: Stamp,

    /// A [`HeadlightsIntent`] code.
    pub command: u8,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum HeadlightsIntent {
    NoCommand = 0,
    Disable = 1,
    EnableLow = 2,
    EnableHigh = 3,
}

/// Horn request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HornCommand {
    pub stamp: Stamp,
    pub active: bool,
}

/// Wiper request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipersCommand {
    pub stamp: Stamp,

    /// A [`WipersIntent`] code.
    pub command: u8,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum WipersIntent {
    NoCommand = 0,
    Disable = 1,
    EnableLow = 2,
    EnableHigh = 3,
    EnableClean = 4,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_intent_codes() {
        assert!(matches!(GearIntent::try_from(1), Ok(GearIntent::Drive)));
        assert!(GearIntent::try_from(6).is_err());
        assert_eq!(u8::from(BlinkerIntent::Hazard), 4);
        assert!(WipersIntent::try_from(200).is_err());
    }
}
