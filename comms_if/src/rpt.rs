//! # Inbound DBW reports
//!
//! Reports published by the drive-by-wire hardware. As with the inbound commands enumerated fields
//! are raw codes, decoded with the `TryFrom<u8>` impls of the enums in this module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::Stamp;

// ------------------------------------------------------------------------------------------------
// REPORTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeReport {
    pub stamp: Stamp,

    /// A [`ParkingBrakeState`] code.
    pub parking_brake: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearReport {
    pub stamp: Stamp,

    /// A [`GearState`] code.
    pub state: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscReport {
    pub stamp: Stamp,

    /// Unsigned vehicle speed.
    ///
    /// Units: kilometers/hour
    pub vehicle_speed_kph: f64,

    /// Units: percent
    pub fuel_level_pct: f64,

    /// The DBW system is currently driving the vehicle.
    pub drive_by_wire_enabled: bool,

    /// The DBW system is able to accept commands.
    pub by_wire_ready: bool,

    /// The driver is touching the controls.
    pub general_driver_activity: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherActuatorsReport {
    pub stamp: Stamp,

    /// A [`HornState`] code.
    pub horn_state: u8,

    /// A [`TurnSignalState`] code.
    pub turn_signal_state: u8,

    /// A [`HighBeamState`] code.
    pub high_beam_state: u8,

    /// A [`LowBeamState`] code.
    pub low_beam_state: u8,

    /// A [`WiperState`] code.
    pub front_wiper_state: u8,

    /// A [`WiperState`] code.
    pub rear_wiper_state: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringReport {
    pub stamp: Stamp,

    /// Units: degrees
    pub steering_wheel_angle_deg: f64,
}

/// Signed wheel speeds, positive when rolling forwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSpeedReport {
    pub stamp: Stamp,

    /// Units: radians/second
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

// ------------------------------------------------------------------------------------------------
// REPORT CODES
// ------------------------------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum ParkingBrakeState {
    Off = 0,
    On = 1,
    NoRequest = 2,
    Fault = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum GearState {
    None = 0,
    Park = 1,
    Reverse = 2,
    Neutral = 3,
    Drive = 4,
    Low = 5,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum HornState {
    Off = 0,
    On = 1,
    Sna = 2,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum TurnSignalState {
    None = 0,
    Left = 1,
    Right = 2,
    Hazards = 3,
    Sna = 4,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum HighBeamState {
    Off = 0,
    On = 1,
    Reserved = 2,
    Sna = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum LowBeamState {
    Off = 0,
    On = 1,
    Sna = 2,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum WiperState {
    Off = 0,
    ConstantLow = 1,
    ConstantHigh = 2,
    WashBrief = 3,
    Sna = 4,
}
