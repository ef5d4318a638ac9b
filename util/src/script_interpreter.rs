//! # Message script interpreter
//!
//! This module replays scripts of timestamped inbound messages, which is how the DBW executable is
//! exercised without a live message bus. A script is a sequence of entries of the form
//!
//! ```text
//! <time_s>: <message json>;
//! ```
//!
//! one per line, where `time_s` is the number of seconds after the start of replay at which the
//! message should be delivered and the JSON is a [`Msg`]. Lines which don't match are ignored, so
//! comments can be written freely as long as they don't start with a number followed by a colon.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use comms_if::msg::{Msg, MsgParseError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Matches one script entry, capturing the time in group 1 and the payload in group 3.
const ENTRY_PATTERN: &str = r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to be delivered at a specific time.
#[derive(Debug)]
struct Entry {
    exec_time_s: f64,
    msg: Msg,
}

/// A script interpreter.
///
/// After loading a script use `.get_pending` to acquire the messages that are due.
#[derive(Debug)]
pub struct ScriptInterpreter {
    entries: VecDeque<Entry>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script entries must be in time order, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, MsgParseError),

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),
}

#[derive(Debug)]
pub enum PendingMsgs {
    None,
    Some(Vec<Msg>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let script = fs::read_to_string(script_path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_script(&script)
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        let re = RegexBuilder::new(ENTRY_PATTERN)
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        let mut entries: VecDeque<Entry> = VecDeque::new();

        for cap in re.captures_iter(script) {
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue,
            };

            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(prev) = entries.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s));
                }
            }

            let msg =
                Msg::from_json(payload).map_err(|e| ScriptError::InvalidMsg(exec_time_s, e))?;

            entries.push_back(Entry { exec_time_s, msg });
        }

        if entries.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { entries })
    }

    /// Return the messages due at or before `now_s` seconds into the replay.
    pub fn get_pending(&mut self, now_s: f64) -> PendingMsgs {
        if self.entries.is_empty() {
            return PendingMsgs::EndOfScript;
        }

        let mut msgs = vec![];

        while let Some(entry) = self.entries.front() {
            if entry.exec_time_s > now_s {
                break;
            }

            if let Some(entry) = self.entries.pop_front() {
                msgs.push(entry.msg);
            }
        }

        if msgs.is_empty() {
            PendingMsgs::None
        } else {
            PendingMsgs::Some(msgs)
        }
    }

    /// Get the number of messages left in the script
    pub fn get_num_msgs(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(e) => e.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        Enable the vehicle then report a stationary car
        0.0: {"type": "MODE_CHANGE", "payload": {"mode": 0}};
        0.5: {"type": "WHEEL_SPEED_RPT", "payload": {}};
        0.5: {"type": "HORN_CMD", "payload": {"active": true}};
        2: {"type": "GEAR_RPT", "payload": {"state": 4}};
    "#;

    #[test]
    fn test_parse() {
        let si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        assert_eq!(si.get_num_msgs(), 4);
        assert_eq!(si.get_duration(), 2.0);
    }

    #[test]
    fn test_pending() {
        let mut si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        match si.get_pending(0.0) {
            PendingMsgs::Some(m) => assert!(matches!(m[..], [Msg::ModeChange(_)])),
            p => panic!("Expected one message, got {:?}", p),
        }

        assert!(matches!(si.get_pending(0.4), PendingMsgs::None));

        match si.get_pending(1.0) {
            PendingMsgs::Some(m) => assert_eq!(m.len(), 2),
            p => panic!("Expected two messages, got {:?}", p),
        }

        assert!(matches!(si.get_pending(10.0), PendingMsgs::Some(_)));
        assert!(matches!(si.get_pending(10.0), PendingMsgs::EndOfScript));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ScriptInterpreter::from_script("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script(r#"1.0: {"type": "BAD"};"#),
            Err(ScriptError::InvalidMsg(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::from_script(
                "2.0: {\"type\": \"HORN_CMD\", \"payload\": {}};\n\
                 1.0: {\"type\": \"HORN_CMD\", \"payload\": {}};"
            ),
            Err(ScriptError::OutOfOrder(_, _))
        ));
    }
}
