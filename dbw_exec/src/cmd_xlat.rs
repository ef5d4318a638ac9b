//! # Command translation
//!
//! Converts the commands received from the autonomy stack into the DBW hardware's own commands.
//! Every function here is pure: it only writes into the command structs it is given, the caller
//! is responsible for locking them.
//!
//! Validation problems are reported through an [`XlatReport`] rather than an error, since the
//! commands are still applied (clamped or zeroed) when they are detected. Only commands which
//! can't be applied at all produce an [`XlatError`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use comms_if::{
    cmd::*,
    dbw::*,
    state::Gear,
};
use util::maths::clamp;

use crate::params::DbwParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Throttle pedal demand used by high level commands when below the target speed.
///
/// Units: percent (0 to 1)
pub const HIGH_LEVEL_THROTTLE_PCT: f64 = 0.3;

/// Brake pedal demand used by high level commands when above the target speed.
///
/// Units: percent (0 to 1)
pub const HIGH_LEVEL_BRAKE_PCT: f64 = 0.5;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The measured vehicle state a control command is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleContext {
    /// Gear most recently reported by the vehicle.
    pub gear: Gear,

    /// Most recent measured speed, signed by direction of travel.
    ///
    /// Units: meters/second
    pub velocity_mps: f64,
}

/// The command groups written by a control command.
pub struct ControlCmds<'a> {
    pub throttle: &'a mut ThrottleCmd,
    pub brake: &'a mut BrakeCmd,
    pub steering: &'a mut SteeringCmd,
}

/// The command groups written by a vehicle state command.
pub struct StateCmds<'a> {
    pub brake: &'a mut BrakeCmd,
    pub gear: &'a mut GearCmd,
    pub misc: &'a mut MiscCmd,
}

/// Status report for a translation.
///
/// The `*_limited` flags are informational, the others mean the command was not applied as
/// requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct XlatReport {
    /// Requested direction of travel contradicts the current gear, speed was commanded to zero.
    pub speed_dir_mismatch: bool,

    /// Requested steering angle was beyond the maximum and has been clipped.
    pub steer_angle_exceeded: bool,

    /// Steering angle of a high level command was clipped.
    pub steer_angle_limited: bool,

    /// The configured acceleration limit was used instead of the requested acceleration.
    pub accel_limited: bool,

    /// The configured deceleration limit was used instead of the requested deceleration.
    pub decel_limited: bool,

    /// Requested gear couldn't be decoded.
    pub invalid_gear: bool,

    /// Requested blinker state couldn't be decoded.
    pub invalid_blinker: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum XlatError {
    #[error("Raw control commands are not supported, their units are undefined")]
    Unsupported,

    #[error("Received an invalid {field} code: {value}")]
    InvalidCode { field: &'static str, value: u8 },

    #[error("Received a non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl XlatReport {
    /// `true` if the command was applied as requested, ignoring informational limits.
    pub fn is_ok(&self) -> bool {
        !(self.speed_dir_mismatch
            || self.steer_angle_exceeded
            || self.invalid_gear
            || self.invalid_blinker)
    }
}

impl VehicleContext {
    /// `true` if moving at `velocity_mps` would mean travelling against the current gear.
    fn contradicts(&self, velocity_mps: f64) -> bool {
        (self.gear == Gear::Drive && velocity_mps < 0.0)
            || (self.gear == Gear::Reverse && velocity_mps > 0.0)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Translate any control command.
///
/// Raw commands, and commands carrying a NaN or infinite value, are rejected without touching
/// `out`.
pub fn translate_control(
    cmd: &ControlCommand,
    ctx: &VehicleContext,
    params: &DbwParams,
    out: ControlCmds,
) -> Result<XlatReport, XlatError> {
    match cmd {
        ControlCommand::HighLevel(c) => check_finite(&[
            ("velocity", c.velocity_mps),
            ("curvature", c.curvature),
        ])?,
        ControlCommand::Vehicle(c) => check_finite(&[
            ("acceleration", c.long_accel_mps2),
            ("velocity", c.velocity_mps),
            ("front wheel angle", c.front_wheel_angle_rad),
        ])?,
        ControlCommand::Ackermann(c) => check_finite(&[
            ("acceleration", c.longitudinal.acceleration),
            ("speed", c.longitudinal.speed),
            ("steering tire angle", c.lateral.steering_tire_angle),
        ])?,
        ControlCommand::Raw(_) => (),
    }

    match cmd {
        ControlCommand::HighLevel(c) => Ok(translate_high_level(c, ctx, params, out)),
        ControlCommand::Vehicle(c) => Ok(translate_vehicle(
            c.long_accel_mps2,
            c.velocity_mps,
            c.front_wheel_angle_rad,
            ctx,
            params,
            out,
        )),
        ControlCommand::Ackermann(c) => Ok(translate_vehicle(
            c.longitudinal.acceleration,
            c.longitudinal.speed,
            c.lateral.steering_tire_angle,
            ctx,
            params,
            out,
        )),
        ControlCommand::Raw(_) => Err(XlatError::Unsupported),
    }
}

/// Convert a tire angle into a steering command angle.
pub fn tire_to_steer_angle(tire_angle_rad: f64, steer_to_tire_ratio: f64) -> f64 {
    tire_angle_rad * steer_to_tire_ratio / DEG_TO_RAD
}

/// Translate a vehicle state command into gear, blinker and parking brake requests.
///
/// An undecodable gear sets the gear request to `None`, an undecodable blinker sets the turn
/// signal to `Sna`. The parking brake is always applied.
pub fn translate_state(cmd: &VehicleStateCommand, out: StateCmds) -> XlatReport {
    let mut report = XlatReport::default();

    out.gear.cmd = match GearIntent::try_from(cmd.gear) {
        Ok(GearIntent::NoCommand) => GearRequest::None,
        Ok(GearIntent::Drive) => GearRequest::Drive,
        Ok(GearIntent::Reverse) => GearRequest::Reverse,
        Ok(GearIntent::Park) => GearRequest::Park,
        Ok(GearIntent::Low) => GearRequest::Low,
        Ok(GearIntent::Neutral) => GearRequest::Neutral,
        Err(_) => {
            report.invalid_gear = true;
            GearRequest::None
        }
    };

    match BlinkerIntent::try_from(cmd.blinker) {
        Ok(BlinkerIntent::NoCommand) => (),
        Ok(BlinkerIntent::Off) => out.misc.cmd = TurnSignalRequest::None,
        Ok(BlinkerIntent::Left) => out.misc.cmd = TurnSignalRequest::Left,
        Ok(BlinkerIntent::Right) => out.misc.cmd = TurnSignalRequest::Right,
        Ok(BlinkerIntent::Hazard) => out.misc.cmd = TurnSignalRequest::Hazards,
        Err(_) => {
            report.invalid_blinker = true;
            out.misc.cmd = TurnSignalRequest::Sna;
        }
    }

    out.brake.park_brake_cmd = if cmd.hand_brake {
        ParkingBrakeRequest::On
    } else {
        ParkingBrakeRequest::Off
    };

    report
}

/// Apply a headlight command. Invalid codes leave the beams as they were.
pub fn apply_headlights(cmd: &HeadlightsCommand, misc: &mut MiscCmd) -> Result<(), XlatError> {
    match HeadlightsIntent::try_from(cmd.command) {
        Ok(HeadlightsIntent::NoCommand) => (),
        Ok(HeadlightsIntent::Disable) => {
            misc.low_beam_cmd = BeamRequest::Off;
            misc.high_beam_cmd = BeamRequest::Off;
        }
        Ok(HeadlightsIntent::EnableLow) => {
            misc.low_beam_cmd = BeamRequest::On;
            misc.high_beam_cmd = BeamRequest::Off;
        }
        Ok(HeadlightsIntent::EnableHigh) => {
            misc.low_beam_cmd = BeamRequest::Off;
            misc.high_beam_cmd = BeamRequest::On;
        }
        Err(_) => {
            return Err(XlatError::InvalidCode {
                field: "headlights",
                value: cmd.command,
            })
        }
    }

    Ok(())
}

pub fn apply_horn(cmd: &HornCommand, misc: &mut MiscCmd) {
    misc.horn_cmd = cmd.active;
}

/// Apply a wiper command to both the front and rear wipers. Invalid codes leave them as they were.
pub fn apply_wipers(cmd: &WipersCommand, misc: &mut MiscCmd) -> Result<(), XlatError> {
    let req = match WipersIntent::try_from(cmd.command) {
        Ok(WipersIntent::NoCommand) => return Ok(()),
        Ok(WipersIntent::Disable) => WiperRequest::Off,
        Ok(WipersIntent::EnableLow) => WiperRequest::ConstantLow,
        Ok(WipersIntent::EnableHigh) => WiperRequest::ConstantHigh,
        Ok(WipersIntent::EnableClean) => WiperRequest::WashBrief,
        Err(_) => {
            return Err(XlatError::InvalidCode {
                field: "wipers",
                value: cmd.command,
            })
        }
    };

    misc.front_wiper_cmd = req;
    misc.rear_wiper_cmd = req;

    Ok(())
}

/// Decode a mode change request into whether autonomy should be enabled.
pub fn decode_mode(req: &ModeChangeRequest) -> Result<bool, XlatError> {
    match ModeIntent::try_from(req.mode) {
        Ok(ModeIntent::Autonomous) => Ok(true),
        Ok(ModeIntent::Manual) => Ok(false),
        Err(_) => Err(XlatError::InvalidCode {
            field: "mode",
            value: req.mode,
        }),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_finite(values: &[(&'static str, f64)]) -> Result<(), XlatError> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some(&(field, value)) => Err(XlatError::NonFinite { field, value }),
        None => Ok(()),
    }
}

/// Speed target and fixed pedal demands from a curvature.
///
/// Pedal demands are not closed loop, the throttle is opened to a fixed amount while below the
/// target and the brake applied by a fixed amount while above it.
fn translate_high_level(
    cmd: &HighLevelControlCommand,
    ctx: &VehicleContext,
    params: &DbwParams,
    out: ControlCmds,
) -> XlatReport {
    let mut report = XlatReport::default();

    // Bicycle model: tan(angle) = wheelbase / turn radius. Written with the curvature in the
    // numerator so negative curvature gives a negative angle and zero curvature needs no special
    // case.
    let angle = (params.wheelbase_m() * cmd.curvature).atan();
    let (angle, limited) = clamp(angle, -params.max_steer_angle, params.max_steer_angle);
    report.steer_angle_limited = limited;

    let speed = if ctx.contradicts(cmd.velocity_mps) {
        report.speed_dir_mismatch = true;
        0.0
    } else {
        cmd.velocity_mps.abs()
    };

    out.steering.cmd_type = SteeringCmdType::Angle;
    out.steering.angle_cmd = angle;
    out.steering.angle_velocity = 0.0;

    out.throttle.pedal_cmd_type = PedalCmdType::Percent;
    out.throttle.speed_cmd = speed;
    out.throttle.pedal_cmd = if !report.speed_dir_mismatch && ctx.velocity_mps < cmd.velocity_mps
    {
        HIGH_LEVEL_THROTTLE_PCT
    } else {
        0.0
    };

    out.brake.pedal_cmd_type = PedalCmdType::Percent;
    out.brake.pedal_cmd = if ctx.velocity_mps > cmd.velocity_mps {
        HIGH_LEVEL_BRAKE_PCT
    } else {
        0.0
    };

    report
}

/// Closed loop speed and steering angle, shared by vehicle and ackermann commands.
fn translate_vehicle(
    accel_mps2: f64,
    velocity_mps: f64,
    tire_angle_rad: f64,
    ctx: &VehicleContext,
    params: &DbwParams,
    out: ControlCmds,
) -> XlatReport {
    let mut report = XlatReport::default();

    out.throttle.control_type = ActuatorControlMode::ClosedLoopVehicle;
    out.brake.control_type = ActuatorControlMode::ClosedLoopVehicle;
    out.steering.control_type = ActuatorControlMode::ClosedLoopActuator;
    out.steering.cmd_type = SteeringCmdType::Angle;
    out.steering.angle_velocity = params.max_steer_angle;

    // Requested values are only used strictly inside the limits and with the expected sign
    let accel_limit = params.acceleration_limit_mps2;
    out.throttle.accel_limit = if 0.0 < accel_mps2 && accel_mps2 < accel_limit {
        accel_mps2
    } else {
        report.accel_limited = true;
        accel_limit
    };

    let decel_limit = params.deceleration_limit_mps2;
    out.brake.decel_limit = if -decel_limit < accel_mps2 && accel_mps2 < 0.0 {
        accel_mps2.abs()
    } else {
        report.decel_limited = true;
        decel_limit
    };

    out.throttle.speed_cmd = if ctx.contradicts(velocity_mps) {
        report.speed_dir_mismatch = true;
        0.0
    } else {
        velocity_mps.abs()
    };

    let angle = tire_to_steer_angle(tire_angle_rad, params.steer_to_tire_ratio);
    let (angle, exceeded) = clamp(angle, -params.max_steer_angle, params.max_steer_angle);
    report.steer_angle_exceeded = exceeded;
    out.steering.angle_cmd = angle;

    report
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Cmds {
        throttle: ThrottleCmd,
        brake: BrakeCmd,
        steering: SteeringCmd,
        gear: GearCmd,
        misc: MiscCmd,
    }

    impl Cmds {
        fn control(&mut self) -> ControlCmds {
            ControlCmds {
                throttle: &mut self.throttle,
                brake: &mut self.brake,
                steering: &mut self.steering,
            }
        }

        fn state(&mut self) -> StateCmds {
            StateCmds {
                brake: &mut self.brake,
                gear: &mut self.gear,
                misc: &mut self.misc,
            }
        }
    }

    /// Parameters where a tire angle of 0.5 rad maps exactly onto the maximum steer angle.
    fn params() -> DbwParams {
        DbwParams {
            steer_to_tire_ratio: 2.0,
            max_steer_angle: tire_to_steer_angle(0.5, 2.0),
            acceleration_limit_mps2: 3.0,
            deceleration_limit_mps2: 4.0,
            ..Default::default()
        }
    }

    fn ctx(gear: Gear, velocity_mps: f64) -> VehicleContext {
        VehicleContext { gear, velocity_mps }
    }

    fn vehicle(accel: f64, velocity: f64, angle: f64) -> ControlCommand {
        ControlCommand::Vehicle(VehicleControlCommand {
            long_accel_mps2: accel,
            velocity_mps: velocity,
            front_wheel_angle_rad: angle,
            ..Default::default()
        })
    }

    #[test]
    fn test_direction_mismatch() {
        let p = params();

        for (gear, v) in [(Gear::Drive, -1.0), (Gear::Reverse, 1.0)] {
            let mut cmds = Cmds::default();
            cmds.throttle.speed_cmd = 5.0;
            let r = translate_control(&vehicle(1.0, v, 0.0), &ctx(gear, 0.0), &p, cmds.control())
                .unwrap();

            assert!(r.speed_dir_mismatch);
            assert!(!r.is_ok());
            assert_eq!(cmds.throttle.speed_cmd, 0.0);
        }

        let mut cmds = Cmds::default();
        let r = translate_control(
            &vehicle(1.0, -2.0, 0.0),
            &ctx(Gear::Reverse, 0.0),
            &p,
            cmds.control(),
        )
        .unwrap();
        assert!(r.is_ok());
        assert_eq!(cmds.throttle.speed_cmd, 2.0);
    }

    #[test]
    fn test_high_level() {
        let p = params();
        let mut cmds = Cmds::default();

        let cmd = ControlCommand::HighLevel(HighLevelControlCommand {
            velocity_mps: 5.0,
            curvature: 0.1,
            ..Default::default()
        });
        let r = translate_control(&cmd, &ctx(Gear::Drive, 2.0), &p, cmds.control()).unwrap();

        assert!(r.is_ok());
        assert!((cmds.steering.angle_cmd - (p.wheelbase_m() * 0.1).atan()).abs() < 1e-12);
        assert_eq!(cmds.steering.angle_velocity, 0.0);
        assert_eq!(cmds.throttle.pedal_cmd, HIGH_LEVEL_THROTTLE_PCT);
        assert_eq!(cmds.brake.pedal_cmd, 0.0);
        assert_eq!(cmds.throttle.speed_cmd, 5.0);

        // Above target, brake
        translate_control(&cmd, &ctx(Gear::Drive, 7.0), &p, cmds.control()).unwrap();
        assert_eq!(cmds.throttle.pedal_cmd, 0.0);
        assert_eq!(cmds.brake.pedal_cmd, HIGH_LEVEL_BRAKE_PCT);

        // Right turns steer right
        let cmd = ControlCommand::HighLevel(HighLevelControlCommand {
            velocity_mps: 5.0,
            curvature: -0.1,
            ..Default::default()
        });
        translate_control(&cmd, &ctx(Gear::Drive, 5.0), &p, cmds.control()).unwrap();
        assert!(cmds.steering.angle_cmd < 0.0);
        assert_eq!(cmds.throttle.pedal_cmd, 0.0);
        assert_eq!(cmds.brake.pedal_cmd, 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let p = params();

        let cmds_in = [
            vehicle(f64::NAN, 1.0, 0.1),
            vehicle(1.0, f64::NAN, 0.1),
            vehicle(1.0, 1.0, f64::NAN),
            vehicle(1.0, f64::INFINITY, 0.1),
            ControlCommand::HighLevel(HighLevelControlCommand {
                velocity_mps: f64::NAN,
                curvature: 0.1,
                ..Default::default()
            }),
            ControlCommand::HighLevel(HighLevelControlCommand {
                velocity_mps: 1.0,
                curvature: f64::NAN,
                ..Default::default()
            }),
            ControlCommand::Ackermann(AckermannControlCommand {
                lateral: AckermannLateralCommand {
                    steering_tire_angle: f64::NAN,
                    ..Default::default()
                },
                ..Default::default()
            }),
            ControlCommand::Ackermann(AckermannControlCommand {
                longitudinal: LongitudinalCommand {
                    speed: f64::NEG_INFINITY,
                    ..Default::default()
                },
                ..Default::default()
            }),
            ControlCommand::Ackermann(AckermannControlCommand {
                longitudinal: LongitudinalCommand {
                    acceleration: f64::NAN,
                    ..Default::default()
                },
                ..Default::default()
            }),
        ];

        for cmd in cmds_in.iter() {
            let mut cmds = Cmds::default();
            cmds.throttle.speed_cmd = 1.5;
            cmds.steering.angle_cmd = 0.25;
            let before_throttle = cmds.throttle;
            let before_brake = cmds.brake;
            let before_steering = cmds.steering;

            let r = translate_control(cmd, &ctx(Gear::Drive, 0.0), &p, cmds.control());

            assert!(
                matches!(r, Err(XlatError::NonFinite { .. })),
                "{:?} gave {:?}",
                cmd,
                r
            );
            assert_eq!(cmds.throttle, before_throttle);
            assert_eq!(cmds.brake, before_brake);
            assert_eq!(cmds.steering, before_steering);
        }
    }

    #[test]
    fn test_high_level_mismatch_no_throttle() {
        let p = params();
        let mut cmds = Cmds::default();

        let cmd = ControlCommand::HighLevel(HighLevelControlCommand {
            velocity_mps: 3.0,
            curvature: 0.0,
            ..Default::default()
        });
        let r = translate_control(&cmd, &ctx(Gear::Reverse, 0.0), &p, cmds.control()).unwrap();

        assert!(!r.is_ok());
        assert_eq!(cmds.throttle.speed_cmd, 0.0);
        assert_eq!(cmds.throttle.pedal_cmd, 0.0);
    }

    #[test]
    fn test_steer_clipping() {
        let p = params();
        let mut cmds = Cmds::default();

        // Exactly the maximum is allowed
        let r = translate_control(&vehicle(1.0, 1.0, 0.5), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert!(r.is_ok());
        assert_eq!(cmds.steering.angle_cmd, p.max_steer_angle);

        let r = translate_control(&vehicle(1.0, 1.0, 0.6), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert!(r.steer_angle_exceeded);
        assert!(!r.is_ok());
        assert_eq!(cmds.steering.angle_cmd, p.max_steer_angle);

        let r = translate_control(&vehicle(1.0, 1.0, -0.6), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert!(r.steer_angle_exceeded);
        assert_eq!(cmds.steering.angle_cmd, -p.max_steer_angle);

        // Direction mismatch and clipping are independent
        let r = translate_control(&vehicle(1.0, -1.0, 0.6), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert!(r.steer_angle_exceeded && r.speed_dir_mismatch);
    }

    #[test]
    fn test_accel_decel_limits() {
        let p = params();
        let mut cmds = Cmds::default();

        let r = translate_control(&vehicle(1.5, 1.0, 0.0), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert_eq!(cmds.throttle.accel_limit, 1.5);
        assert_eq!(cmds.brake.decel_limit, 4.0);
        assert!(!r.accel_limited && r.decel_limited);
        assert!(r.is_ok());

        translate_control(&vehicle(-2.0, 1.0, 0.0), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert_eq!(cmds.throttle.accel_limit, 3.0);
        assert_eq!(cmds.brake.decel_limit, 2.0);

        translate_control(&vehicle(10.0, 1.0, 0.0), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert_eq!(cmds.throttle.accel_limit, 3.0);

        translate_control(&vehicle(-4.0, 1.0, 0.0), &ctx(Gear::Drive, 0.0), &p, cmds.control())
            .unwrap();
        assert_eq!(cmds.brake.decel_limit, 4.0);

        assert_eq!(cmds.throttle.control_type, ActuatorControlMode::ClosedLoopVehicle);
        assert_eq!(cmds.brake.control_type, ActuatorControlMode::ClosedLoopVehicle);
        assert_eq!(cmds.steering.control_type, ActuatorControlMode::ClosedLoopActuator);
        assert_eq!(cmds.steering.angle_velocity, p.max_steer_angle);
    }

    #[test]
    fn test_ackermann() {
        let p = params();
        let mut cmds = Cmds::default();

        let cmd = ControlCommand::Ackermann(AckermannControlCommand {
            lateral: AckermannLateralCommand {
                steering_tire_angle: 0.25,
                ..Default::default()
            },
            longitudinal: LongitudinalCommand {
                speed: 4.0,
                acceleration: -1.0,
                ..Default::default()
            },
            ..Default::default()
        });
        let r = translate_control(&cmd, &ctx(Gear::Drive, 0.0), &p, cmds.control()).unwrap();

        assert!(r.is_ok());
        assert_eq!(cmds.throttle.speed_cmd, 4.0);
        assert_eq!(cmds.brake.decel_limit, 1.0);
        assert_eq!(cmds.steering.angle_cmd, tire_to_steer_angle(0.25, 2.0));
    }

    #[test]
    fn test_raw_rejected() {
        let p = params();
        let mut cmds = Cmds::default();
        let before = (cmds.throttle, cmds.brake, cmds.steering);

        let r = translate_control(
            &ControlCommand::Raw(RawControlCommand {
                throttle: 100,
                ..Default::default()
            }),
            &ctx(Gear::Drive, 0.0),
            &p,
            cmds.control(),
        );

        assert_eq!(r, Err(XlatError::Unsupported));
        assert_eq!((cmds.throttle, cmds.brake, cmds.steering), before);
    }

    #[test]
    fn test_state_command() {
        let mut cmds = Cmds::default();

        let r = translate_state(
            &VehicleStateCommand {
                gear: GearIntent::Reverse.into(),
                blinker: BlinkerIntent::Left.into(),
                hand_brake: true,
                ..Default::default()
            },
            cmds.state(),
        );
        assert!(r.is_ok());
        assert_eq!(cmds.gear.cmd, GearRequest::Reverse);
        assert_eq!(cmds.misc.cmd, TurnSignalRequest::Left);
        assert_eq!(cmds.brake.park_brake_cmd, ParkingBrakeRequest::On);

        // No blinker command keeps the previous one
        let r = translate_state(
            &VehicleStateCommand {
                gear: GearIntent::NoCommand.into(),
                blinker: BlinkerIntent::NoCommand.into(),
                hand_brake: false,
                ..Default::default()
            },
            cmds.state(),
        );
        assert!(r.is_ok());
        assert_eq!(cmds.gear.cmd, GearRequest::None);
        assert_eq!(cmds.misc.cmd, TurnSignalRequest::Left);
        assert_eq!(cmds.brake.park_brake_cmd, ParkingBrakeRequest::Off);

        let r = translate_state(
            &VehicleStateCommand {
                gear: 42,
                blinker: 42,
                ..Default::default()
            },
            cmds.state(),
        );
        assert!(r.invalid_gear && r.invalid_blinker);
        assert_eq!(cmds.gear.cmd, GearRequest::None);
        assert_eq!(cmds.misc.cmd, TurnSignalRequest::Sna);
    }

    #[test]
    fn test_misc_commands() {
        let mut misc = MiscCmd::default();

        let hl = |c: HeadlightsIntent| HeadlightsCommand {
            command: c.into(),
            ..Default::default()
        };
        apply_headlights(&hl(HeadlightsIntent::EnableHigh), &mut misc).unwrap();
        assert_eq!(misc.high_beam_cmd, BeamRequest::On);
        apply_headlights(&hl(HeadlightsIntent::NoCommand), &mut misc).unwrap();
        assert_eq!(misc.high_beam_cmd, BeamRequest::On);
        apply_headlights(&hl(HeadlightsIntent::EnableLow), &mut misc).unwrap();
        assert_eq!((misc.low_beam_cmd, misc.high_beam_cmd), (BeamRequest::On, BeamRequest::Off));
        assert!(apply_headlights(
            &HeadlightsCommand {
                command: 9,
                ..Default::default()
            },
            &mut misc
        )
        .is_err());
        assert_eq!(misc.low_beam_cmd, BeamRequest::On);

        apply_wipers(
            &WipersCommand {
                command: WipersIntent::EnableClean.into(),
                ..Default::default()
            },
            &mut misc,
        )
        .unwrap();
        assert_eq!(misc.front_wiper_cmd, WiperRequest::WashBrief);
        assert_eq!(misc.rear_wiper_cmd, WiperRequest::WashBrief);

        apply_horn(
            &HornCommand {
                active: true,
                ..Default::default()
            },
            &mut misc,
        );
        assert!(misc.horn_cmd);

        assert_eq!(
            decode_mode(&ModeChangeRequest {
                mode: 7,
                ..Default::default()
            }),
            Err(XlatError::InvalidCode {
                field: "mode",
                value: 7
            })
        );
    }

    proptest! {
        #[test]
        fn limits_always_respected(
            accel in -20.0..20.0f64,
            velocity in -30.0..30.0f64,
            angle in -2.0..2.0f64,
        ) {
            let p = params();
            let mut cmds = Cmds::default();
            translate_control(
                &vehicle(accel, velocity, angle),
                &ctx(Gear::Drive, 0.0),
                &p,
                cmds.control()
            ).unwrap();

            prop_assert!(cmds.throttle.accel_limit >= 0.0);
            prop_assert!(cmds.throttle.accel_limit <= p.acceleration_limit_mps2);
            prop_assert!(cmds.brake.decel_limit >= 0.0);
            prop_assert!(cmds.brake.decel_limit <= p.deceleration_limit_mps2);
            prop_assert!(cmds.steering.angle_cmd.abs() <= p.max_steer_angle);
            prop_assert!(cmds.throttle.speed_cmd >= 0.0);
        }
    }
}
