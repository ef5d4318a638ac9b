//! # Outbound DBW commands
//!
//! Commands sent to the drive-by-wire hardware on every publish cycle. Only the DBW interface
//! writes these so they use typed enums rather than raw codes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// How the `pedal_cmd` of a [`ThrottleCmd`] or [`BrakeCmd`] is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PedalCmdType {
    None,
    Pedal,
    Percent,
}

/// Which control loop the DBW hardware closes around a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorControlMode {
    OpenLoop,
    ClosedLoopActuator,
    ClosedLoopVehicle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteeringCmdType {
    Angle,
    Torque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkingBrakeRequest {
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearRequest {
    None,
    Park,
    Reverse,
    Neutral,
    Drive,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSignalRequest {
    None,
    Left,
    Right,
    Hazards,
    /// Signal not available, sent when the requested blinker state could not be decoded.
    Sna,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamRequest {
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WiperRequest {
    Off,
    ConstantLow,
    ConstantHigh,
    WashBrief,
}

// ------------------------------------------------------------------------------------------------
// COMMANDS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleCmd {
    pub pedal_cmd: f64,
    pub pedal_cmd_type: PedalCmdType,
    pub control_type: ActuatorControlMode,

    /// Target speed magnitude under closed loop vehicle control.
    ///
    /// Units: meters/second
    pub speed_cmd: f64,

    /// Units: meters/second^2
    pub accel_limit: f64,

    pub enable: bool,
    pub ignore: bool,
    pub clear: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrakeCmd {
    pub pedal_cmd: f64,
    pub pedal_cmd_type: PedalCmdType,
    pub control_type: ActuatorControlMode,

    /// Deceleration magnitude limit, never negative.
    ///
    /// Units: meters/second^2
    pub decel_limit: f64,

    pub park_brake_cmd: ParkingBrakeRequest,

    pub enable: bool,
    pub ignore: bool,
    pub clear: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringCmd {
    pub cmd_type: SteeringCmdType,
    pub control_type: ActuatorControlMode,

    /// Units: radians
    pub angle_cmd: f64,

    /// Units: radians/second
    pub angle_velocity: f64,

    pub enable: bool,
    pub ignore: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearCmd {
    pub cmd: GearRequest,
    pub clear: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEnableCmd {
    pub global_enable: bool,
    pub enable_joystick_limits: bool,
    pub ecu_build_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscCmd {
    pub cmd: TurnSignalRequest,
    pub low_beam_cmd: BeamRequest,
    pub high_beam_cmd: BeamRequest,
    pub front_wiper_cmd: WiperRequest,
    pub rear_wiper_cmd: WiperRequest,
    pub horn_cmd: bool,
    pub block_standard_cruise_buttons: bool,
    pub block_adaptive_cruise_buttons: bool,
    pub block_turn_signal_stalk: bool,
}

/// Every command sent on one publish cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbwCmdSet {
    pub throttle: ThrottleCmd,
    pub brake: BrakeCmd,
    pub gear: GearCmd,
    pub global_enable: GlobalEnableCmd,
    pub misc: MiscCmd,
    pub steering: SteeringCmd,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for ThrottleCmd {
    fn default() -> Self {
        Self {
            pedal_cmd: 0.0,
            pedal_cmd_type: PedalCmdType::Percent,
            control_type: ActuatorControlMode::OpenLoop,
            speed_cmd: 0.0,
            accel_limit: 0.0,
            enable: false,
            ignore: false,
            clear: false,
        }
    }
}

impl Default for BrakeCmd {
    fn default() -> Self {
        Self {
            pedal_cmd: 0.0,
            pedal_cmd_type: PedalCmdType::Percent,
            control_type: ActuatorControlMode::OpenLoop,
            decel_limit: 0.0,
            park_brake_cmd: ParkingBrakeRequest::Off,
            enable: false,
            ignore: false,
            clear: false,
        }
    }
}

impl Default for SteeringCmd {
    fn default() -> Self {
        Self {
            cmd_type: SteeringCmdType::Angle,
            control_type: ActuatorControlMode::ClosedLoopActuator,
            angle_cmd: 0.0,
            angle_velocity: 0.0,
            enable: false,
            ignore: false,
        }
    }
}

impl Default for GearCmd {
    fn default() -> Self {
        Self {
            cmd: GearRequest::None,
            clear: false,
        }
    }
}

impl Default for MiscCmd {
    fn default() -> Self {
        Self {
            cmd: TurnSignalRequest::None,
            low_beam_cmd: BeamRequest::Off,
            high_beam_cmd: BeamRequest::Off,
            front_wiper_cmd: WiperRequest::Off,
            rear_wiper_cmd: WiperRequest::Off,
            horn_cmd: false,
            block_standard_cruise_buttons: false,
            block_adaptive_cruise_buttons: false,
            block_turn_signal_stalk: false,
        }
    }
}

impl GlobalEnableCmd {
    pub fn new(ecu_build_number: u16) -> Self {
        Self {
            global_enable: false,
            enable_joystick_limits: false,
            ecu_build_number,
        }
    }
}
