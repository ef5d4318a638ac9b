//! # Outbound command buffers
//!
//! The six outbound commands each live behind their own lock. The locks are private to this
//! module and can only be taken through the `lock_*` functions, all of which acquire them in the
//! same global order:
//!
//! ```text
//! throttle -> brake -> gear -> enable -> misc -> steering
//! ```
//!
//! so no two callers can ever deadlock on them. A caller must drop one guard before asking for
//! another. The arbitration state machine lock, when needed, is taken before any of these.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use parking_lot::{Mutex, MutexGuard};

use comms_if::dbw::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct CmdBuffers {
    throttle: Mutex<ThrottleCmd>,
    brake: Mutex<BrakeCmd>,
    gear: Mutex<GearCmd>,
    enable: Mutex<GlobalEnableCmd>,
    misc: Mutex<MiscCmd>,
    steering: Mutex<SteeringCmd>,
}

/// Groups written by control commands.
pub struct ControlGuard<'a> {
    pub throttle: MutexGuard<'a, ThrottleCmd>,
    pub brake: MutexGuard<'a, BrakeCmd>,
    pub steering: MutexGuard<'a, SteeringCmd>,
}

/// Groups written by vehicle state commands.
pub struct StateGuard<'a> {
    pub brake: MutexGuard<'a, BrakeCmd>,
    pub gear: MutexGuard<'a, GearCmd>,
    pub misc: MutexGuard<'a, MiscCmd>,
}

/// Every group, used by the publisher.
pub struct AllGuard<'a> {
    pub throttle: MutexGuard<'a, ThrottleCmd>,
    pub brake: MutexGuard<'a, BrakeCmd>,
    pub gear: MutexGuard<'a, GearCmd>,
    pub enable: MutexGuard<'a, GlobalEnableCmd>,
    pub misc: MutexGuard<'a, MiscCmd>,
    pub steering: MutexGuard<'a, SteeringCmd>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdBuffers {
    /// Initial commands: percent pedal demands, closed loop steering angle, no gear or turn
    /// signal requested and everything disabled.
    pub fn new(ecu_build_number: u16) -> Self {
        Self {
            throttle: Mutex::new(ThrottleCmd::default()),
            brake: Mutex::new(BrakeCmd::default()),
            gear: Mutex::new(GearCmd::default()),
            enable: Mutex::new(GlobalEnableCmd::new(ecu_build_number)),
            misc: Mutex::new(MiscCmd::default()),
            steering: Mutex::new(SteeringCmd::default()),
        }
    }

    pub fn lock_control(&self) -> ControlGuard<'_> {
        let throttle = self.throttle.lock();
        let brake = self.brake.lock();
        let steering = self.steering.lock();

        ControlGuard {
            throttle,
            brake,
            steering,
        }
    }

    pub fn lock_state(&self) -> StateGuard<'_> {
        let brake = self.brake.lock();
        let gear = self.gear.lock();
        let misc = self.misc.lock();

        StateGuard { brake, gear, misc }
    }

    pub fn lock_misc(&self) -> MutexGuard<'_, MiscCmd> {
        self.misc.lock()
    }

    pub fn lock_all(&self) -> AllGuard<'_> {
        let throttle = self.throttle.lock();
        let brake = self.brake.lock();
        let gear = self.gear.lock();
        let enable = self.enable.lock();
        let misc = self.misc.lock();
        let steering = self.steering.lock();

        AllGuard {
            throttle,
            brake,
            gear,
            enable,
            misc,
            steering,
        }
    }
}

impl AllGuard<'_> {
    /// Set the enable flag of every command, including the cruise and stalk blocks.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.throttle.enable = enabled;
        self.brake.enable = enabled;
        self.steering.enable = enabled;
        self.enable.global_enable = enabled;
        self.misc.block_standard_cruise_buttons = enabled;
        self.misc.block_adaptive_cruise_buttons = enabled;
        self.misc.block_turn_signal_stalk = enabled;
    }

    pub fn snapshot(&self) -> DbwCmdSet {
        DbwCmdSet {
            throttle: *self.throttle,
            brake: *self.brake,
            gear: *self.gear,
            global_enable: *self.enable,
            misc: *self.misc,
            steering: *self.steering,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_commands() {
        let bufs = CmdBuffers::new(7);
        let cmds = bufs.lock_all().snapshot();

        assert_eq!(cmds.global_enable.ecu_build_number, 7);
        assert!(!cmds.global_enable.enable_joystick_limits);
        assert_eq!(cmds.throttle.pedal_cmd_type, PedalCmdType::Percent);
        assert_eq!(cmds.brake.pedal_cmd_type, PedalCmdType::Percent);
        assert_eq!(
            cmds.steering.control_type,
            ActuatorControlMode::ClosedLoopActuator
        );
        assert_eq!(cmds.gear.cmd, GearRequest::None);
        assert_eq!(cmds.misc.cmd, TurnSignalRequest::None);
        assert!(!cmds.throttle.enable && !cmds.global_enable.global_enable);
    }

    #[test]
    fn test_set_enabled() {
        let bufs = CmdBuffers::new(0);

        bufs.lock_all().set_enabled(true);
        let cmds = bufs.lock_all().snapshot();
        assert!(cmds.throttle.enable && cmds.brake.enable && cmds.steering.enable);
        assert!(cmds.global_enable.global_enable);
        assert!(cmds.misc.block_standard_cruise_buttons);
        assert!(cmds.misc.block_adaptive_cruise_buttons);
        assert!(cmds.misc.block_turn_signal_stalk);

        bufs.lock_all().set_enabled(false);
        let cmds = bufs.lock_all().snapshot();
        assert!(!cmds.throttle.enable && !cmds.misc.block_turn_signal_stalk);
    }

    #[test]
    fn test_guards_release() {
        let bufs = CmdBuffers::new(0);

        {
            let mut c = bufs.lock_control();
            c.throttle.speed_cmd = 3.0;
        }
        {
            let mut s = bufs.lock_state();
            s.gear.cmd = GearRequest::Drive;
        }
        bufs.lock_misc().horn_cmd = true;

        let cmds = bufs.lock_all().snapshot();
        assert_eq!(cmds.throttle.speed_cmd, 3.0);
        assert_eq!(cmds.gear.cmd, GearRequest::Drive);
        assert!(cmds.misc.horn_cmd);
    }
}
