//! # DBW interface
//!
//! [`DbwInterface`] owns all the shared state of the drive-by-wire interface and exposes one
//! method per inbound message plus [`DbwInterface::publish_cycle`] for the periodic publisher. It
//! is `Sync`, each report stream, the publisher and any number of command sources may call it
//! from their own threads.
//!
//! # Locking
//!
//! - Outbound commands are only reachable through [`CmdBuffers`], which fixes their lock order.
//! - The state machine lock comes before every command lock. Only
//!   [`DbwInterface::publish_cycle`] holds both, and it keeps the state machine locked while the
//!   commands are sent so the enable flags always match the arbitration state.
//! - Every other lock (state report, odometry, estimator) is held on its own for a short copy or
//!   update and never while another lock is taken.
//! - Apart from the publish cycle, nothing is sent on the bus while a lock is held.
//!
//! Validation failures never propagate as errors. Command methods return `false` and the problem
//! is logged at most once per throttle period per call site.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, AtomicI8, Ordering},
    Arc,
};
use std::time::Duration;
use thiserror::Error;

// Internal
use comms_if::{
    cmd::*,
    dbw::DbwCmdSet,
    rpt::*,
    state::{Blinker, Gear, Headlight, Odometry, VehicleKinematicState, VehicleStateReport, Wiper},
};
use util::{
    error_throttle,
    throttle::LogThrottle,
    time::TimeSource,
    warn_throttle,
};

use crate::{
    cmd_bufs::CmdBuffers,
    cmd_xlat::{self, ControlCmds, StateCmds, VehicleContext, XlatError},
    dbw_state::{DbwState, DbwStateMachine},
    kin_est::KinEstimator,
    params::{DbwParams, ParamsError},
    rpt_agg::{self, TravelDirection},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Outbound side of the message bus.
pub trait DbwBus: Send + Sync {
    /// Send the commands for one publish cycle.
    fn send_dbw_cmds(&self, cmds: &DbwCmdSet);

    /// Send the enable (`true`) or disable (`false`) signal to the DBW system.
    fn send_enable(&self, enable: bool);

    /// Publish a new kinematic state estimate.
    fn send_kin_state(&self, state: &VehicleKinematicState);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Which report streams have been processed at least once.
#[derive(Debug, Default)]
struct Freshness {
    brake: AtomicBool,
    gear: AtomicBool,
    misc: AtomicBool,
    other_actuators: AtomicBool,
    steering: AtomicBool,
    wheel_speed: AtomicBool,
}

/// Snapshot of the freshness flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeenReports {
    pub brake: bool,
    pub gear: bool,
    pub misc: bool,
    pub other_actuators: bool,
    pub steering: bool,
    pub wheel_speed: bool,
}

pub struct DbwInterface<B: DbwBus> {
    params: DbwParams,
    bus: B,
    clock: Arc<dyn TimeSource>,
    log_throttle: LogThrottle,

    cmds: CmdBuffers,
    state_machine: Mutex<DbwStateMachine>,

    state_report: Mutex<VehicleStateReport>,
    odometry: Mutex<Odometry>,
    kin_est: Mutex<KinEstimator>,

    seen: Freshness,
    travel_direction: AtomicI8,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B: DbwBus> DbwInterface<B> {
    /// Create a new interface, validating the parameters.
    pub fn new(
        params: DbwParams,
        bus: B,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, InitError> {
        let params = params.validate()?;

        info!("DBW interface parameters:");
        info!("    ECU build number: {}", params.ecu_build_num);
        info!("    Wheelbase: {:.3} m", params.wheelbase_m());
        info!("    Max steer angle: {}", params.max_steer_angle);
        info!(
            "    Accel/decel limits: {}/{} m/s^2",
            params.acceleration_limit_mps2, params.deceleration_limit_mps2
        );
        info!("    Publish period: {} ms", params.pub_period_ms);
        info!("    Enable cycles: {}", params.dbw_enable_cycles);

        // Jerk limits are accepted but not applied to any command
        debug!(
            "    Jerk limits (unused): +{}/-{} m/s^3",
            params.acceleration_positive_jerk_limit_mps3,
            params.deceleration_negative_jerk_limit_mps3
        );

        Ok(Self {
            bus,
            clock,
            log_throttle: LogThrottle::new(Duration::from_secs_f64(params.log_throttle_period_s)),
            cmds: CmdBuffers::new(params.ecu_build_num),
            state_machine: Mutex::new(DbwStateMachine::new(params.dbw_enable_cycles)),
            state_report: Mutex::new(VehicleStateReport::default()),
            odometry: Mutex::new(Odometry::default()),
            kin_est: Mutex::new(KinEstimator::new(
                params.front_axle_to_cog_m,
                params.rear_axle_to_cog_m,
            )),
            seen: Freshness::default(),
            travel_direction: AtomicI8::new(0),
            params,
        })
    }

    // ---- ACCESSORS ----

    pub fn params(&self) -> &DbwParams {
        &self.params
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn dbw_state(&self) -> DbwState {
        self.state_machine.lock().current_state()
    }

    pub fn state_report(&self) -> VehicleStateReport {
        *self.state_report.lock()
    }

    pub fn odometry(&self) -> Odometry {
        *self.odometry.lock()
    }

    /// The latest kinematic estimate, `None` before the first misc report.
    pub fn kinematic_state(&self) -> Option<VehicleKinematicState> {
        self.kin_est.lock().state().copied()
    }

    /// Sign of the direction of travel from the last wheel speed report.
    pub fn travel_direction(&self) -> i8 {
        self.travel_direction.load(Ordering::Acquire)
    }

    pub fn seen_reports(&self) -> SeenReports {
        SeenReports {
            brake: self.seen.brake.load(Ordering::Acquire),
            gear: self.seen.gear.load(Ordering::Acquire),
            misc: self.seen.misc.load(Ordering::Acquire),
            other_actuators: self.seen.other_actuators.load(Ordering::Acquire),
            steering: self.seen.steering.load(Ordering::Acquire),
            wheel_speed: self.seen.wheel_speed.load(Ordering::Acquire),
        }
    }

    /// Copy of the commands which would be sent on the next cycle.
    pub fn pending_cmds(&self) -> DbwCmdSet {
        self.cmds.lock_all().snapshot()
    }

    // ---- PUBLISHER ----

    /// Run one publish cycle.
    ///
    /// Marks every command enabled unless arbitration is disabled, sends them all and then tells
    /// the state machine the cycle is complete. The arbitration lock is held for the whole cycle,
    /// so a disable arriving mid cycle waits for it and applies to the next one.
    pub fn publish_cycle(&self) {
        let mut sm = self.state_machine.lock();

        let cmds = {
            let mut all = self.cmds.lock_all();
            all.set_enabled(sm.enabled());
            all.snapshot()
        };

        self.bus.send_dbw_cmds(&cmds);

        sm.on_commands_sent();
        sm.on_state_sent();
    }

    // ---- COMMANDS ----

    /// Translate and store a control command. Returns `false` if it was rejected or had to be
    /// modified.
    pub fn send_control_command(&self, cmd: &ControlCommand) -> bool {
        let ctx = self.vehicle_context();

        let result = {
            let mut guard = self.cmds.lock_control();
            cmd_xlat::translate_control(
                cmd,
                &ctx,
                &self.params,
                ControlCmds {
                    throttle: &mut guard.throttle,
                    brake: &mut guard.brake,
                    steering: &mut guard.steering,
                },
            )
        };

        let now = self.clock.now();

        match result {
            Ok(report) => {
                trace!("Control command translated: {:?}", report);

                if report.speed_dir_mismatch {
                    error_throttle!(
                        self.log_throttle,
                        now,
                        "Got invalid speed request value: speed direction does not match current \
                         gear ({:?})",
                        ctx.gear
                    );
                }
                if report.steer_angle_exceeded {
                    error_throttle!(
                        self.log_throttle,
                        now,
                        "Got invalid steering angle value: request exceeds max angle"
                    );
                }

                report.is_ok()
            }
            Err(e) => {
                error_throttle!(self.log_throttle, now, "Control command rejected: {}", e);
                false
            }
        }
    }

    /// Store the gear, blinker and parking brake requests of a state command.
    pub fn send_state_command(&self, cmd: &VehicleStateCommand) -> bool {
        let report = {
            let mut guard = self.cmds.lock_state();
            cmd_xlat::translate_state(
                cmd,
                StateCmds {
                    brake: &mut guard.brake,
                    gear: &mut guard.gear,
                    misc: &mut guard.misc,
                },
            )
        };

        let now = self.clock.now();

        if report.invalid_gear {
            error_throttle!(
                self.log_throttle,
                now,
                "Received command for invalid gear state: {}",
                cmd.gear
            );
        }
        if report.invalid_blinker {
            error_throttle!(
                self.log_throttle,
                now,
                "Received command for invalid turn signal state: {}",
                cmd.blinker
            );
        }

        report.is_ok()
    }

    /// Request autonomy on or off and send the matching enable or disable signal.
    ///
    /// An enable request arriving in the same cycle as a disable is dropped, nothing is sent and
    /// `false` is returned.
    pub fn handle_mode_change_request(&self, req: &ModeChangeRequest) -> bool {
        match cmd_xlat::decode_mode(req) {
            Ok(enable) => {
                if !self.state_machine.lock().request(enable) {
                    warn_throttle!(
                        self.log_throttle,
                        self.clock.now(),
                        "Enable request ignored, the vehicle was disabled this cycle"
                    );
                    return false;
                }

                self.bus.send_enable(enable);
                true
            }
            Err(e) => {
                error_throttle!(self.log_throttle, self.clock.now(), "{}", e);
                false
            }
        }
    }

    pub fn send_headlights_command(&self, cmd: &HeadlightsCommand) -> bool {
        let result = cmd_xlat::apply_headlights(cmd, &mut self.cmds.lock_misc());
        self.log_xlat_result(result)
    }

    pub fn send_horn_command(&self, cmd: &HornCommand) -> bool {
        cmd_xlat::apply_horn(cmd, &mut self.cmds.lock_misc());
        true
    }

    pub fn send_wipers_command(&self, cmd: &WipersCommand) -> bool {
        let result = cmd_xlat::apply_wipers(cmd, &mut self.cmds.lock_misc());
        self.log_xlat_result(result)
    }

    // ---- REPORTS ----

    pub fn on_brake_report(&self, rpt: &BrakeReport) {
        let hand_brake = rpt_agg::hand_brake(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, self.clock.now(), "{}", e);
            false
        });

        self.state_report.lock().hand_brake = hand_brake;
        self.seen.brake.store(true, Ordering::Release);
    }

    pub fn on_gear_report(&self, rpt: &GearReport) {
        let gear = rpt_agg::gear(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, self.clock.now(), "{}", e);
            Gear::None
        });

        self.state_report.lock().gear = gear;
        self.seen.gear.store(true, Ordering::Release);
    }

    /// Update speed, fuel and mode, feed the vehicle's readiness to arbitration and advance the
    /// kinematic estimate, publishing it if one was produced.
    ///
    /// A report with a non-finite speed still updates fuel, mode and readiness but leaves the
    /// odometry and the estimate untouched.
    pub fn on_misc_report(&self, rpt: &MiscReport) {
        {
            let mut state_report = self.state_report.lock();
            state_report.fuel = rpt_agg::fuel(rpt);
            state_report.mode = rpt_agg::mode(rpt);
        }
        self.state_machine.lock().feedback(rpt_agg::dbw_ready(rpt));

        let speed_mps = match rpt_agg::speed_mps(rpt, self.travel_direction()) {
            Ok(s) => s,
            Err(e) => {
                error_throttle!(self.log_throttle, self.clock.now(), "{}", e);
                return;
            }
        };

        self.odometry.lock().velocity_mps = speed_mps;

        let seen = self.seen_reports();
        let derive = seen.steering && seen.wheel_speed;

        let result = self.kin_est.lock().update(rpt.stamp, speed_mps, derive);
        self.seen.misc.store(true, Ordering::Release);

        match result {
            Ok(Some(state)) => self.bus.send_kin_state(&state),
            Ok(None) => (),
            Err(e) => {
                error_throttle!(
                    self.log_throttle,
                    self.clock.now(),
                    "Received inconsistent timestamps: {}",
                    e
                );
            }
        }
    }

    pub fn on_other_actuators_report(&self, rpt: &OtherActuatorsReport) {
        let now = self.clock.now();

        let horn = rpt_agg::horn(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, now, "{}", e);
            false
        });
        let blinker = rpt_agg::blinker(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, now, "{}", e);
            Blinker::None
        });
        let headlight = rpt_agg::headlight(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, now, "{}", e);
            Headlight::None
        });
        let wiper = rpt_agg::front_wiper(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, now, "{}", e);
            Wiper::None
        });
        let rear_wiper = rpt_agg::rear_wiper(rpt).unwrap_or_else(|e| {
            warn_throttle!(self.log_throttle, now, "{}", e);
            Wiper::None
        });

        {
            let mut state_report = self.state_report.lock();
            state_report.horn = horn;
            state_report.blinker = blinker;
            state_report.headlight = headlight;
            state_report.wiper = wiper;
            state_report.rear_wiper = rear_wiper;
            state_report.stamp = rpt.stamp;
        }
        self.seen.other_actuators.store(true, Ordering::Release);
    }

    pub fn on_steering_report(&self, rpt: &SteeringReport) {
        let angle = rpt_agg::front_wheel_angle_rad(rpt, self.params.steer_to_tire_ratio);

        {
            let mut odometry = self.odometry.lock();
            odometry.front_wheel_angle_rad = angle;
            odometry.rear_wheel_angle_rad = 0.0;
            odometry.stamp = rpt.stamp;
        }
        self.kin_est.lock().set_front_wheel_angle(angle);
        self.seen.steering.store(true, Ordering::Release);
    }

    pub fn on_wheel_speed_report(&self, rpt: &WheelSpeedReport) {
        let direction = rpt_agg::travel_direction(rpt);

        if direction == TravelDirection::Inconsistent {
            warn_throttle!(
                self.log_throttle,
                self.clock.now(),
                "Received inconsistent wheel speeds: {:?}",
                rpt
            );
        }

        self.travel_direction
            .store(direction.sign(), Ordering::Release);
        self.seen.wheel_speed.store(true, Ordering::Release);
    }

    // ---- PRIVATE ----

    /// Gear and speed used to validate control commands.
    fn vehicle_context(&self) -> VehicleContext {
        let gear = self.state_report.lock().gear;
        let velocity_mps = self.odometry.lock().velocity_mps;

        VehicleContext { gear, velocity_mps }
    }

    fn log_xlat_result(&self, result: Result<(), XlatError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error_throttle!(self.log_throttle, self.clock.now(), "{}", e);
                false
            }
        }
    }
}
