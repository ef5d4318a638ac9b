//! # Communications interface crate.
//!
//! Provides the message definitions exchanged between the drive-by-wire interface and the rest of
//! the vehicle software: commands coming in from the autonomy stack, reports coming in from the
//! DBW hardware, commands going out to the DBW hardware and the estimated vehicle state going out
//! to the autonomy stack.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message timestamps
pub mod stamp;

/// Inbound commands from the autonomy stack
pub mod cmd;

/// Inbound reports from the DBW hardware
pub mod rpt;

/// Outbound commands to the DBW hardware
pub mod dbw;

/// Outbound vehicle state
pub mod state;

/// Envelope used to carry any inbound message in scripts and logs
pub mod msg;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use stamp::Stamp;
