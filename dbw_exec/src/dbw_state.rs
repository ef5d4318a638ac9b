//! # DBW arbitration state machine
//!
//! Decides whether the commands sent to the DBW hardware are marked as enabled. The machine has
//! three states:
//!
//! ```text
//!              request(true)                 N ready cycles
//!   Disabled ---------------> EnableRequested --------------> Enabled
//!      ^                            |                            |
//!      +----------------------------+----------------------------+
//!            request(false) or feedback(false), immediately
//! ```
//!
//! A publish cycle ends once both [`DbwStateMachine::on_commands_sent`] and
//! [`DbwStateMachine::on_state_sent`] have been called. While an enable has been requested a cycle
//! in which the vehicle reported ready advances the count of consecutive ready cycles, and any
//! other cycle resets it. Disabling is never delayed.
//!
//! Disabling inputs win over enabling ones: once `request(false)` or `feedback(false)` has been
//! seen in a cycle a `request(true)` in that same cycle is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Arbitration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DbwState {
    Disabled,
    EnableRequested,
    Enabled,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DbwStateMachine {
    state: DbwState,

    /// Consecutive ready cycles needed to go from `EnableRequested` to `Enabled`.
    enable_cycles: u32,

    /// Consecutive ready cycles counted so far.
    ready_cycles: u32,

    ready_this_cycle: bool,
    disabled_this_cycle: bool,
    cmds_sent: bool,
    state_sent: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DbwStateMachine {
    pub fn new(enable_cycles: u32) -> Self {
        Self {
            state: DbwState::Disabled,
            enable_cycles,
            ready_cycles: 0,
            ready_this_cycle: false,
            disabled_this_cycle: false,
            cmds_sent: false,
            state_sent: false,
        }
    }

    pub fn current_state(&self) -> DbwState {
        self.state
    }

    /// Whether commands should currently be marked as enabled.
    pub fn enabled(&self) -> bool {
        self.state != DbwState::Disabled
    }

    /// Record the user's intent to enable or disable autonomy.
    ///
    /// Returns `false` if an enable request was ignored because a disable has already been seen
    /// this cycle. Disable requests are always accepted.
    pub fn request(&mut self, enable: bool) -> bool {
        if !enable {
            self.disable("disable requested");
            return true;
        }

        if self.disabled_this_cycle {
            debug!("Enable request ignored, a disable was seen this cycle");
            return false;
        }

        if self.state == DbwState::Disabled {
            info!("DBW enable requested");
            self.state = DbwState::EnableRequested;
            self.ready_cycles = 0;
            self.ready_this_cycle = false;
        }

        true
    }

    /// Record whether the vehicle reports itself ready for autonomous control.
    pub fn feedback(&mut self, ready: bool) {
        if ready {
            self.ready_this_cycle = true;
        } else {
            self.ready_this_cycle = false;
            self.disable("vehicle not ready");
        }
    }

    /// The actuator commands for this cycle have been sent.
    pub fn on_commands_sent(&mut self) {
        self.cmds_sent = true;
        self.end_cycle_if_complete();
    }

    /// The state commands for this cycle have been sent.
    pub fn on_state_sent(&mut self) {
        self.state_sent = true;
        self.end_cycle_if_complete();
    }

    fn end_cycle_if_complete(&mut self) {
        if !(self.cmds_sent && self.state_sent) {
            return;
        }

        if self.state == DbwState::EnableRequested {
            if self.ready_this_cycle {
                self.ready_cycles += 1;
            } else {
                self.ready_cycles = 0;
            }

            if self.ready_cycles >= self.enable_cycles {
                info!("DBW enabled after {} ready cycles", self.ready_cycles);
                self.state = DbwState::Enabled;
            }
        }

        self.ready_this_cycle = false;
        self.disabled_this_cycle = false;
        self.cmds_sent = false;
        self.state_sent = false;
    }

    fn disable(&mut self, reason: &str) {
        self.disabled_this_cycle = true;
        self.ready_cycles = 0;

        if self.state != DbwState::Disabled {
            info!("DBW disabled: {}", reason);
            self.state = DbwState::Disabled;
        }
    }
}
