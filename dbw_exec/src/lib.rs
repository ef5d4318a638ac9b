//! # Drive-by-wire library.
//!
//! This library allows the executable and the integration tests to access the DBW interface.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Interface parameters - vehicle geometry, limits and timing
pub mod params;

/// Enable/disable arbitration between the autonomy stack and the vehicle
pub mod dbw_state;

/// Command translation - converts autonomy commands into DBW commands
pub mod cmd_xlat;

/// Report aggregation - maps vehicle reports into the vehicle state report
pub mod rpt_agg;

/// Kinematic state estimation from speed and steering reports
pub mod kin_est;

/// Outbound command buffers and their lock order
pub mod cmd_bufs;

/// The DBW interface itself
pub mod interface;

/// Periodic command publisher
pub mod cmd_pub;
