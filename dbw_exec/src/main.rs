//! Main drive-by-wire executable entry point.
//!
//! # Architecture
//!
//! - Initialise the session, logger and parameters
//! - Start the command publisher thread
//! - Start one worker thread per report stream
//! - Main loop:
//!     - Get the messages due from the script
//!     - Handle commands directly, forward reports to their worker
//!
//! Outbound messages are logged, and every kinematic state estimate is archived into the
//! session's `kin_state.csv`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    path::PathBuf,
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use comms_if::{dbw::DbwCmdSet, msg::Msg, state::VehicleKinematicState};
use dbw_lib::{
    cmd_pub::CmdPublisher,
    interface::{DbwBus, DbwInterface},
    params::DbwParams,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::{self, Session},
    time::MonotonicClock,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which the script is polled for due messages.
const CYCLE_PERIOD_S: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "dbw_exec", about = "Drive-by-wire vehicle interface")]
struct Opt {
    /// Parameter file, relative to `$DBW_SW_ROOT/params`
    #[structopt(short, long, default_value = "dbw_exec.toml")]
    params: String,

    /// Script of inbound messages to replay, without one the interface only publishes
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

/// Bus which logs everything sent on it.
struct LoggingBus {
    kin_archive: Mutex<Archiver>,
}

/// Flattened kinematic state for the CSV archive.
#[derive(Serialize)]
struct KinStateRecord {
    time_s: f64,
    stamp_s: f64,
    x_m: f64,
    y_m: f64,
    yaw_rad: f64,
    longitudinal_velocity_mps: f64,
    lateral_velocity_mps: f64,
    acceleration_mps2: f64,
    heading_rate_rps: f64,
    front_wheel_angle_rad: f64,
}

/// Senders to each report worker.
struct ReportWorkers {
    senders: Vec<(&'static str, mpsc::Sender<Msg>)>,
    handles: Vec<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("dbw_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Drive-by-wire Interface Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: DbwParams = util::params::load(&opt.params)
        .wrap_err_with(|| format!("Could not load the DBW params from {}", opt.params))?;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    let mut script = match opt.script {
        Some(ref path) => {
            let s = ScriptInterpreter::new(path)
                .wrap_err_with(|| format!("Failed to load the script {:?}", path))?;

            info!(
                "Loaded script with {} messages lasting {:.02} s",
                s.get_num_msgs(),
                s.get_duration()
            );

            Some(s)
        }
        None => {
            info!("No script given, publishing until killed");
            None
        }
    };

    // ---- INITIALISE INTERFACE ----

    let bus = LoggingBus {
        kin_archive: Mutex::new(
            Archiver::from_path(&session, "kin_state.csv")
                .wrap_err("Failed to create the kinematic state archive")?,
        ),
    };

    let interface = Arc::new(
        DbwInterface::new(params, bus, Arc::new(MonotonicClock))
            .wrap_err("Failed to initialise the DBW interface")?,
    );

    let publisher = CmdPublisher::spawn(interface.clone())
        .wrap_err("Failed to start the command publisher")?;

    let workers = ReportWorkers::spawn(&interface).wrap_err("Failed to start report workers")?;

    info!("Initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let start_instant = Instant::now();

    loop {
        let cycle_start_instant = Instant::now();

        let pending = match script {
            Some(ref mut s) => s.get_pending(start_instant.elapsed().as_secs_f64()),
            None => PendingMsgs::None,
        };

        match pending {
            PendingMsgs::None => (),
            PendingMsgs::Some(msgs) => {
                for msg in msgs {
                    if !dispatch(&interface, &workers, msg) {
                        return Err(eyre!("A report worker has stopped"));
                    }
                }
            }
            PendingMsgs::EndOfScript => {
                info!("End of script reached");
                break;
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            ),
        }
    }

    // ---- SHUTDOWN ----

    workers.join();
    publisher.stop();

    let state = interface.state_report();
    info!("Final DBW state: {:?}", interface.dbw_state());
    info!("Final vehicle state: {:?}", state);
    info!("Final odometry: {:?}", interface.odometry());

    info!("End of execution");

    Ok(())
}

/// Handle a command on this thread or pass a report to its worker.
///
/// Returns `false` if the report's worker has gone.
fn dispatch(interface: &DbwInterface<LoggingBus>, workers: &ReportWorkers, msg: Msg) -> bool {
    trace!("Dispatching {:?}", msg);

    if let Some(cmd) = msg.as_control_command() {
        interface.send_control_command(&cmd);
        return true;
    }

    match msg {
        Msg::StateCmd(c) => {
            interface.send_state_command(&c);
        }
        Msg::ModeChange(r) => {
            interface.handle_mode_change_request(&r);
        }
        Msg::HeadlightsCmd(c) => {
            interface.send_headlights_command(&c);
        }
        Msg::HornCmd(c) => {
            interface.send_horn_command(&c);
        }
        Msg::WipersCmd(c) => {
            interface.send_wipers_command(&c);
        }
        rpt => return workers.send(rpt),
    }

    true
}

/// Pass a report to the interface.
fn handle_report(interface: &DbwInterface<LoggingBus>, msg: Msg) {
    match msg {
        Msg::BrakeRpt(r) => interface.on_brake_report(&r),
        Msg::GearRpt(r) => interface.on_gear_report(&r),
        Msg::MiscRpt(r) => interface.on_misc_report(&r),
        Msg::OtherActuatorsRpt(r) => interface.on_other_actuators_report(&r),
        Msg::SteeringRpt(r) => interface.on_steering_report(&r),
        Msg::WheelSpeedRpt(r) => interface.on_wheel_speed_report(&r),
        other => warn!("Report worker received a non-report message: {:?}", other),
    }
}

/// Name of the report stream a message belongs to.
fn stream_name(msg: &Msg) -> Option<&'static str> {
    match msg {
        Msg::BrakeRpt(_) => Some("brake"),
        Msg::GearRpt(_) => Some("gear"),
        Msg::MiscRpt(_) => Some("misc"),
        Msg::OtherActuatorsRpt(_) => Some("other_actuators"),
        Msg::SteeringRpt(_) => Some("steering"),
        Msg::WheelSpeedRpt(_) => Some("wheel_speed"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DbwBus for LoggingBus {
    fn send_dbw_cmds(&self, cmds: &DbwCmdSet) {
        trace!("DBW commands: {:?}", cmds);
    }

    fn send_enable(&self, enable: bool) {
        if enable {
            info!("Sending DBW enable");
        } else {
            info!("Sending DBW disable");
        }
    }

    fn send_kin_state(&self, state: &VehicleKinematicState) {
        debug!("Kinematic state: {:?}", state);

        let record = KinStateRecord::from(state);

        if let Err(e) = self.kin_archive.lock().serialise(record) {
            warn!("Could not archive the kinematic state: {}", e);
        }
    }
}

impl From<&VehicleKinematicState> for KinStateRecord {
    fn from(state: &VehicleKinematicState) -> Self {
        Self {
            time_s: session::get_elapsed_seconds(),
            stamp_s: state.stamp.as_secs_f64(),
            x_m: state.pose.x,
            y_m: state.pose.y,
            yaw_rad: state.pose.yaw,
            longitudinal_velocity_mps: state.longitudinal_velocity_mps,
            lateral_velocity_mps: state.lateral_velocity_mps,
            acceleration_mps2: state.acceleration_mps2,
            heading_rate_rps: state.heading_rate_rps,
            front_wheel_angle_rad: state.front_wheel_angle_rad,
        }
    }
}

impl ReportWorkers {
    const STREAMS: [&'static str; 6] = [
        "brake",
        "gear",
        "misc",
        "other_actuators",
        "steering",
        "wheel_speed",
    ];

    fn spawn(interface: &Arc<DbwInterface<LoggingBus>>) -> std::io::Result<Self> {
        let mut senders = Vec::with_capacity(Self::STREAMS.len());
        let mut handles = Vec::with_capacity(Self::STREAMS.len());

        for name in Self::STREAMS.iter() {
            let (tx, rx) = mpsc::channel::<Msg>();
            let interface = interface.clone();

            let handle = thread::Builder::new()
                .name(format!("rpt_{}", name))
                .spawn(move || {
                    for msg in rx.iter() {
                        handle_report(&interface, msg);
                    }
                })?;

            senders.push((*name, tx));
            handles.push(handle);
        }

        Ok(Self { senders, handles })
    }

    fn send(&self, msg: Msg) -> bool {
        let name = match stream_name(&msg) {
            Some(n) => n,
            None => {
                warn!("No report stream for {:?}", msg);
                return true;
            }
        };

        match self.senders.iter().find(|(n, _)| *n == name) {
            Some((_, tx)) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Close every stream and wait for the workers to drain them.
    fn join(self) {
        drop(self.senders);

        for handle in self.handles {
            if handle.join().is_err() {
                warn!("A report worker panicked");
            }
        }
    }
}
