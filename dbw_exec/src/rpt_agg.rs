//! # Report aggregation
//!
//! Decoding of the DBW hardware's reports into the canonical vehicle state. Each function maps one
//! report field, returning an [`RptError`] for values which can't be decoded so the caller can
//! log the problem and substitute the default noted on each function.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use comms_if::{
    rpt::*,
    state::{Blinker, Gear, Headlight, Mode, Wiper},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Conversion from kilometers/hour to meters/second.
pub const KPH_TO_MPS: f64 = 1.0 / 3.6;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction of travel derived from the signs of the four wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TravelDirection {
    Forward,
    Backward,

    /// All wheels exactly stopped.
    Stationary,

    /// Wheels turning in different directions, which shouldn't happen on a healthy vehicle.
    Inconsistent,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum RptError {
    #[error("Received invalid {field} value from the DBW system: {value}")]
    InvalidValue { field: &'static str, value: u8 },

    #[error("Received non-finite {field} from the DBW system: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TravelDirection {
    /// Sign applied to the unsigned vehicle speed.
    pub fn sign(&self) -> i8 {
        match self {
            TravelDirection::Forward => 1,
            TravelDirection::Backward => -1,
            TravelDirection::Stationary | TravelDirection::Inconsistent => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parking brake engaged. Defaults to `false`.
pub fn hand_brake(rpt: &BrakeReport) -> Result<bool, RptError> {
    match ParkingBrakeState::try_from(rpt.parking_brake) {
        Ok(ParkingBrakeState::Off) => Ok(false),
        Ok(ParkingBrakeState::On) => Ok(true),
        Ok(ParkingBrakeState::NoRequest) | Ok(ParkingBrakeState::Fault) | Err(_) => {
            Err(invalid("parking brake", rpt.parking_brake))
        }
    }
}

/// Current gear. Defaults to [`Gear::None`].
pub fn gear(rpt: &GearReport) -> Result<Gear, RptError> {
    match GearState::try_from(rpt.state) {
        Ok(GearState::Park) => Ok(Gear::Park),
        Ok(GearState::Reverse) => Ok(Gear::Reverse),
        Ok(GearState::Neutral) => Ok(Gear::Neutral),
        Ok(GearState::Drive) => Ok(Gear::Drive),
        Ok(GearState::Low) => Ok(Gear::Low),
        Ok(GearState::None) | Err(_) => Err(invalid("gear", rpt.state)),
    }
}

/// Horn sounding. Defaults to `false`.
pub fn horn(rpt: &OtherActuatorsReport) -> Result<bool, RptError> {
    match HornState::try_from(rpt.horn_state) {
        Ok(HornState::Off) => Ok(false),
        Ok(HornState::On) => Ok(true),
        Ok(HornState::Sna) | Err(_) => Err(invalid("horn", rpt.horn_state)),
    }
}

/// Blinker state. Defaults to [`Blinker::None`].
pub fn blinker(rpt: &OtherActuatorsReport) -> Result<Blinker, RptError> {
    match TurnSignalState::try_from(rpt.turn_signal_state) {
        Ok(TurnSignalState::None) => Ok(Blinker::Off),
        Ok(TurnSignalState::Left) => Ok(Blinker::Left),
        Ok(TurnSignalState::Right) => Ok(Blinker::Right),
        Ok(TurnSignalState::Hazards) => Ok(Blinker::Hazard),
        Ok(TurnSignalState::Sna) | Err(_) => Err(invalid("turn signal", rpt.turn_signal_state)),
    }
}

/// Headlight state from the high and low beams, high beam taking priority. Defaults to
/// [`Headlight::None`].
pub fn headlight(rpt: &OtherActuatorsReport) -> Result<Headlight, RptError> {
    match HighBeamState::try_from(rpt.high_beam_state) {
        Ok(HighBeamState::On) => Ok(Headlight::High),
        Ok(HighBeamState::Off) => match LowBeamState::try_from(rpt.low_beam_state) {
            Ok(LowBeamState::On) => Ok(Headlight::On),
            Ok(LowBeamState::Off) => Ok(Headlight::Off),
            Ok(LowBeamState::Sna) | Err(_) => Err(invalid("low beam", rpt.low_beam_state)),
        },
        Ok(HighBeamState::Reserved) | Ok(HighBeamState::Sna) | Err(_) => {
            Err(invalid("high beam", rpt.high_beam_state))
        }
    }
}

/// Front wiper state. Defaults to [`Wiper::None`].
pub fn front_wiper(rpt: &OtherActuatorsReport) -> Result<Wiper, RptError> {
    wiper("front wiper", rpt.front_wiper_state)
}

/// Rear wiper state. Defaults to [`Wiper::None`].
pub fn rear_wiper(rpt: &OtherActuatorsReport) -> Result<Wiper, RptError> {
    wiper("rear wiper", rpt.rear_wiper_state)
}

/// Driving mode from the misc report.
pub fn mode(rpt: &MiscReport) -> Mode {
    if rpt.drive_by_wire_enabled {
        Mode::Autonomous
    } else {
        Mode::Manual
    }
}

/// Whether the vehicle can accept autonomous control, fed to the arbitration state machine.
pub fn dbw_ready(rpt: &MiscReport) -> bool {
    rpt.by_wire_ready && !rpt.general_driver_activity
}

/// Fuel level, saturated into `0..=255` percent.
pub fn fuel(rpt: &MiscReport) -> u8 {
    rpt.fuel_level_pct as u8
}

/// Vehicle speed signed by the direction of travel.
pub fn speed_mps(rpt: &MiscReport, direction: i8) -> Result<f64, RptError> {
    if !rpt.vehicle_speed_kph.is_finite() {
        return Err(RptError::NonFinite {
            field: "vehicle speed",
            value: rpt.vehicle_speed_kph,
        });
    }

    Ok(rpt.vehicle_speed_kph * KPH_TO_MPS * direction as f64)
}

/// Front tire angle from the steering wheel angle.
pub fn front_wheel_angle_rad(rpt: &SteeringReport, steer_to_tire_ratio: f64) -> f64 {
    rpt.steering_wheel_angle_deg * DEG_TO_RAD / steer_to_tire_ratio
}

/// Direction of travel from the signs of the wheel speeds.
pub fn travel_direction(rpt: &WheelSpeedReport) -> TravelDirection {
    let speeds = [rpt.front_right, rpt.front_left, rpt.rear_right, rpt.rear_left];

    if speeds.iter().all(|&s| s == 0.0) {
        TravelDirection::Stationary
    } else if speeds.iter().all(|&s| s >= 0.0) {
        TravelDirection::Forward
    } else if speeds.iter().all(|&s| s <= 0.0) {
        TravelDirection::Backward
    } else {
        TravelDirection::Inconsistent
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn invalid(field: &'static str, value: u8) -> RptError {
    RptError::InvalidValue { field, value }
}

fn wiper(field: &'static str, value: u8) -> Result<Wiper, RptError> {
    match WiperState::try_from(value) {
        Ok(WiperState::Off) => Ok(Wiper::Off),
        Ok(WiperState::ConstantLow) => Ok(Wiper::Low),
        Ok(WiperState::ConstantHigh) => Ok(Wiper::High),
        Ok(WiperState::WashBrief) => Ok(Wiper::Clean),
        Ok(WiperState::Sna) | Err(_) => Err(invalid(field, value)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn wheels(fr: f64, fl: f64, rr: f64, rl: f64) -> WheelSpeedReport {
        WheelSpeedReport {
            front_right: fr,
            front_left: fl,
            rear_right: rr,
            rear_left: rl,
            ..Default::default()
        }
    }

    #[test]
    fn test_travel_direction() {
        assert_eq!(
            travel_direction(&wheels(1.0, 1.0, -1.0, 1.0)),
            TravelDirection::Inconsistent
        );
        assert_eq!(
            travel_direction(&wheels(0.0, 0.0, 0.0, 0.0)),
            TravelDirection::Stationary
        );
        assert_eq!(
            travel_direction(&wheels(0.0, 0.5, 0.0, 0.0)),
            TravelDirection::Forward
        );
        assert_eq!(
            travel_direction(&wheels(-2.0, -2.0, -1.9, 0.0)),
            TravelDirection::Backward
        );

        assert_eq!(TravelDirection::Inconsistent.sign(), 0);
        assert_eq!(TravelDirection::Stationary.sign(), 0);
        assert_eq!(TravelDirection::Backward.sign(), -1);
    }

    #[test]
    fn test_brake_and_gear() {
        let brake = |v: ParkingBrakeState| BrakeReport {
            parking_brake: v.into(),
            ..Default::default()
        };
        assert_eq!(hand_brake(&brake(ParkingBrakeState::On)), Ok(true));
        assert_eq!(hand_brake(&brake(ParkingBrakeState::Off)), Ok(false));
        assert!(hand_brake(&brake(ParkingBrakeState::Fault)).is_err());
        assert!(hand_brake(&brake(ParkingBrakeState::NoRequest)).is_err());

        let g = |v: u8| GearReport {
            state: v,
            ..Default::default()
        };
        assert_eq!(gear(&g(GearState::Drive.into())), Ok(Gear::Drive));
        assert_eq!(gear(&g(GearState::Low.into())), Ok(Gear::Low));
        assert_eq!(
            gear(&g(GearState::None.into())),
            Err(RptError::InvalidValue {
                field: "gear",
                value: 0
            })
        );
        assert!(gear(&g(99)).is_err());
    }

    #[test]
    fn test_other_actuators() {
        let rpt = OtherActuatorsReport {
            horn_state: HornState::On.into(),
            turn_signal_state: TurnSignalState::Hazards.into(),
            high_beam_state: HighBeamState::Off.into(),
            low_beam_state: LowBeamState::On.into(),
            front_wiper_state: WiperState::WashBrief.into(),
            rear_wiper_state: WiperState::Sna.into(),
            ..Default::default()
        };

        assert_eq!(horn(&rpt), Ok(true));
        assert_eq!(blinker(&rpt), Ok(Blinker::Hazard));
        assert_eq!(headlight(&rpt), Ok(Headlight::On));
        assert_eq!(front_wiper(&rpt), Ok(Wiper::Clean));
        assert!(rear_wiper(&rpt).is_err());

        let rpt = OtherActuatorsReport {
            high_beam_state: HighBeamState::On.into(),
            low_beam_state: LowBeamState::Sna.into(),
            turn_signal_state: TurnSignalState::Sna.into(),
            horn_state: 17,
            ..Default::default()
        };
        assert_eq!(headlight(&rpt), Ok(Headlight::High));
        assert!(blinker(&rpt).is_err());
        assert!(horn(&rpt).is_err());

        let rpt = OtherActuatorsReport {
            high_beam_state: HighBeamState::Reserved.into(),
            ..Default::default()
        };
        assert!(headlight(&rpt).is_err());
    }

    #[test]
    fn test_misc() {
        let rpt = MiscReport {
            vehicle_speed_kph: 36.0,
            fuel_level_pct: 55.9,
            drive_by_wire_enabled: true,
            by_wire_ready: true,
            general_driver_activity: true,
            ..Default::default()
        };

        assert!((speed_mps(&rpt, 1).unwrap() - 10.0).abs() < 1e-12);
        assert!((speed_mps(&rpt, -1).unwrap() + 10.0).abs() < 1e-12);
        assert_eq!(speed_mps(&rpt, 0), Ok(0.0));

        let bad = MiscReport {
            vehicle_speed_kph: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            speed_mps(&bad, 1),
            Err(RptError::NonFinite { .. })
        ));
        assert_eq!(fuel(&rpt), 55);
        assert_eq!(mode(&rpt), Mode::Autonomous);
        assert!(!dbw_ready(&rpt));
        assert!(dbw_ready(&MiscReport {
            general_driver_activity: false,
            ..rpt
        }));
    }

    #[test]
    fn test_steering() {
        let rpt = SteeringReport {
            steering_wheel_angle_deg: 180.0,
            ..Default::default()
        };

        assert!((front_wheel_angle_rad(&rpt, 10.0) - std::f64::consts::PI / 10.0).abs() < 1e-12);
    }
}
