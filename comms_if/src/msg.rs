//! # Message envelope
//!
//! Any inbound message can be wrapped in a [`Msg`], which serialises to JSON as
//!
//! ```json
//! {"type": "MISC_RPT", "payload": {"stamp": {"sec": 1, "nanosec": 0}, "vehicle_speed_kph": 3.6}}
//! ```
//!
//! Payload fields which are left out take their default value.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cmd::*;
use crate::rpt::*;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// An inbound message on any of the DBW interface's channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Msg {
    // ---- COMMANDS ----
    HighLevelCmd(HighLevelControlCommand),
    VehicleCmd(VehicleControlCommand),
    AckermannCmd(AckermannControlCommand),
    RawCmd(RawControlCommand),
    StateCmd(VehicleStateCommand),
    ModeChange(ModeChangeRequest),
    HeadlightsCmd(HeadlightsCommand),
    HornCmd(HornCommand),
    WipersCmd(WipersCommand),

    // ---- REPORTS ----
    BrakeRpt(BrakeReport),
    GearRpt(GearReport),
    MiscRpt(MiscReport),
    OtherActuatorsRpt(OtherActuatorsReport),
    SteeringRpt(SteeringReport),
    WheelSpeedRpt(WheelSpeedReport),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum MsgParseError {
    #[error("Message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Msg {
    /// Parse a message from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, MsgParseError> {
        serde_json::from_str(json_str).map_err(MsgParseError::InvalidJson)
    }

    /// If this message is a control command return it as a [`ControlCommand`].
    pub fn as_control_command(&self) -> Option<ControlCommand> {
        match *self {
            Msg::HighLevelCmd(c) => Some(ControlCommand::HighLevel(c)),
            Msg::VehicleCmd(c) => Some(ControlCommand::Vehicle(c)),
            Msg::AckermannCmd(c) => Some(ControlCommand::Ackermann(c)),
            Msg::RawCmd(c) => Some(ControlCommand::Raw(c)),
            _ => None,
        }
    }
}
