//! Planner command tokens
//!
//! The planner emits one string per motor primitive, in the link format
//! `"{flag}{speed}|{angle}|{value}"`, plus `SNAP<tag>` for a capture and a
//! trailing `FIN`.

pub mod grouper;

pub use self::grouper::{align_motions, annotate_steps, merge_commands, GroupingError, StepAnnotations};

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Terminator token
pub const FIN: &str = "FIN";
/// Prefix of capture tokens
pub const SNAP_PREFIX: &str = "SNAP";

const SEP: char = '|';

/// Errors raised while parsing a drive command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown drive flag '{0}' in {1:?}")]
    UnknownFlag(char, String),

    #[error("expected speed|angle|value in {0:?}")]
    MissingField(String),

    #[error("invalid {field} in {command:?}")]
    InvalidNumber {
        field: &'static str,
        command: String,
    },
}

/// Motor primitive selected by the command's first letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveFlag {
    /// `T`: forward for a target distance or angle
    ForwardTarget,
    /// `t`: backward for a target distance or angle
    BackwardTarget,
    /// `W`: forward until a distance away from the obstacle
    ForwardUntilAway,
    /// `w`: backward until a distance away from the obstacle
    BackwardUntilAway,
}

impl DriveFlag {
    pub fn from_char(flag: char) -> Option<Self> {
        match flag {
            'T' => Some(DriveFlag::ForwardTarget),
            't' => Some(DriveFlag::BackwardTarget),
            'W' => Some(DriveFlag::ForwardUntilAway),
            'w' => Some(DriveFlag::BackwardUntilAway),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            DriveFlag::ForwardTarget => 'T',
            DriveFlag::BackwardTarget => 't',
            DriveFlag::ForwardUntilAway => 'W',
            DriveFlag::BackwardUntilAway => 'w',
        }
    }

    pub fn is_forward(self) -> bool {
        matches!(self, DriveFlag::ForwardTarget | DriveFlag::ForwardUntilAway)
    }
}

/// A parsed wheel command
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriveCommand {
    pub flag: DriveFlag,
    /// 0 to 100
    pub speed: u8,
    /// Steering angle in degrees; negative steers left
    pub angle: f32,
    /// Distance in cm, or turn angle when steering
    pub value: f32,
}

impl DriveCommand {
    pub fn parse(command: &str) -> Result<Self, CommandParseError> {
        let mut chars = command.chars();
        let flag_char = chars.next().ok_or(CommandParseError::Empty)?;
        let flag = DriveFlag::from_char(flag_char)
            .ok_or_else(|| CommandParseError::UnknownFlag(flag_char, command.to_string()))?;

        let mut fields = chars.as_str().trim_end().split(SEP);
        let mut next = || {
            fields
                .next()
                .filter(|f| !f.is_empty())
                .ok_or_else(|| CommandParseError::MissingField(command.to_string()))
        };
        let speed = next()?;
        let angle = next()?;
        let value = next()?;

        let invalid = |field| CommandParseError::InvalidNumber {
            field,
            command: command.to_string(),
        };
        Ok(DriveCommand {
            flag,
            speed: speed.parse().map_err(|_| invalid("speed"))?,
            angle: angle.parse().map_err(|_| invalid("angle"))?,
            value: value.parse().map_err(|_| invalid("value"))?,
        })
    }

    /// Render back to the link format
    pub fn to_wire(&self) -> String {
        format!("{}{}{SEP}{}{SEP}{}", self.flag.as_char(), self.speed, self.angle, self.value)
    }

    pub fn is_turn(&self) -> bool {
        self.angle != 0.0
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = if self.flag.is_forward() { "forward" } else { "backward" };
        match self.flag {
            DriveFlag::ForwardUntilAway | DriveFlag::BackwardUntilAway => write!(
                f,
                "{heading} until {}cm away at speed {}",
                self.value, self.speed
            ),
            _ if self.is_turn() => write!(
                f,
                "{heading} turn {}deg steering {}deg at speed {}",
                self.value, self.angle, self.speed
            ),
            _ => write!(f, "{heading} {}cm at speed {}", self.value, self.speed),
        }
    }
}

/// Whether a token joins its neighbours in one display group
///
/// Drive-until-away wheel commands, captures and the terminator merge.
pub fn is_continuation(command: &str) -> bool {
    command.starts_with('W')
        || command.starts_with('w')
        || command.starts_with(SNAP_PREFIX)
        || command == FIN
}

/// Wheel commands only, parsed, with captures and the terminator dropped
pub fn drive_commands<S: AsRef<str>>(commands: &[S]) -> Result<Vec<DriveCommand>, CommandParseError> {
    commands
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| *c != FIN && !c.starts_with(SNAP_PREFIX))
        .map(DriveCommand::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_straight_and_turn_commands() {
        let straight = DriveCommand::parse("T50|0|30").unwrap();
        assert_eq!(straight.flag, DriveFlag::ForwardTarget);
        assert_eq!((straight.speed, straight.angle, straight.value), (50, 0.0, 30.0));
        assert!(!straight.is_turn());

        let turn = DriveCommand::parse("t50|-35|90").unwrap();
        assert_eq!(turn.flag, DriveFlag::BackwardTarget);
        assert!(turn.is_turn());
        assert_eq!(turn.to_wire(), "t50|-35|90");
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(DriveCommand::parse(""), Err(CommandParseError::Empty));
        assert!(matches!(
            DriveCommand::parse("X50|0|10"),
            Err(CommandParseError::UnknownFlag('X', _))
        ));
        assert!(matches!(
            DriveCommand::parse("T50|0"),
            Err(CommandParseError::MissingField(_))
        ));
        assert!(matches!(
            DriveCommand::parse("T500|0|10"),
            Err(CommandParseError::InvalidNumber { field: "speed", .. })
        ));
    }

    #[test]
    fn continuation_classes() {
        assert!(is_continuation("W50|0|20"));
        assert!(is_continuation("w50|0|20"));
        assert!(is_continuation("SNAP3_C"));
        assert!(is_continuation("FIN"));
        assert!(!is_continuation("T50|0|30"));
        assert!(!is_continuation("F10|50|0"));
    }

    #[test]
    fn drive_commands_skip_captures_and_terminator() {
        let commands = ["T50|0|30", "W50|0|20", "SNAP1_C", "t50|35|90", "FIN"];
        let parsed = drive_commands(&commands).unwrap();
        let wire: Vec<String> = parsed.iter().map(DriveCommand::to_wire).collect();
        assert_eq!(wire, vec!["T50|0|30", "W50|0|20", "t50|35|90"]);
    }

    #[test]
    fn describes_commands() {
        let away = DriveCommand::parse("w40|0|15").unwrap();
        assert_eq!(away.to_string(), "backward until 15cm away at speed 40");
        let turn = DriveCommand::parse("T50|35|90").unwrap();
        assert_eq!(turn.to_string(), "forward turn 90deg steering 35deg at speed 50");
    }
}
