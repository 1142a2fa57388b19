//! Pointer action representation and codec.
//!
//! Agents plan in a tiny discrete vocabulary: directional moves of a fixed
//! pixel step and a click. This module converts between that vocabulary, the
//! textual token form used at the agent boundary (`"move right 3"`,
//! `"click"`), and continuous pixel displacements.
//!
//! Parsing is deliberately lenient: model output is untyped text, so a token
//! with an unparseable magnitude collapses to a single step and tokens that
//! are not actions at all are dropped rather than failing the whole plan.

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default pixel distance of one discrete movement unit.
pub const DEFAULT_STEP_PX: i32 = 10;

/// Cardinal movement direction on the canvas. Y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Token text for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Unit displacement (dx, dy) for this direction.
    pub fn unit(&self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(()),
        }
    }
}

/// A single discrete pointer action.
///
/// `magnitude` counts fixed-size steps and is always at least 1. Replay is
/// strictly sequential; order within a plan is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the pointer `magnitude` steps in `direction`.
    Move { direction: Direction, magnitude: u32 },
    /// Press the pointer button. Does not move the pointer.
    Click,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { direction, magnitude } => {
                write!(f, "move {} {}", direction.as_str(), magnitude)
            }
            Action::Click => write!(f, "click"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// Parses a whitespace-delimited token.
    ///
    /// A `move` token with a missing or malformed magnitude defaults to 1
    /// (lenient-parsing policy; numeric-looking tokens that fail to parse
    /// collapse to the unit step). A zero magnitude also collapses to 1 to
    /// keep the magnitude invariant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("click") => Ok(Action::Click),
            Some("move") => {
                let direction = parts
                    .next()
                    .and_then(|d| Direction::from_str(d).ok())
                    .ok_or_else(|| ActionParseError::UnknownDirection(s.to_string()))?;
                let magnitude = parts
                    .next()
                    .and_then(|m| m.parse::<u32>().ok())
                    .unwrap_or(1)
                    .max(1);
                Ok(Action::Move { direction, magnitude })
            }
            _ => Err(ActionParseError::UnknownToken(s.to_string())),
        }
    }
}

/// Failure to interpret a single action token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParseError {
    /// Token did not start with a known action word.
    UnknownToken(String),
    /// A `move` token without a recognizable direction.
    UnknownDirection(String),
}

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionParseError::UnknownToken(t) => write!(f, "Unknown action token: {:?}", t),
            ActionParseError::UnknownDirection(t) => {
                write!(f, "Move token without a valid direction: {:?}", t)
            }
        }
    }
}

impl std::error::Error for ActionParseError {}

// Actions serialize as their token text so the results artifact matches the
// wire form used at the agent boundary.
impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Action::from_str(&token).map_err(de::Error::custom)
    }
}

/// Continuous pixel offset in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, serde::Deserialize)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
}

impl Displacement {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Decomposes a continuous displacement into a discrete action plan.
///
/// Each axis contributes at most one `Move` (X first), with the step count
/// truncated toward zero, and the plan always ends with exactly one `Click`.
/// Output length is therefore 1, 2 or 3.
pub fn encode(displacement: Displacement, step: i32) -> Vec<Action> {
    let mut actions = Vec::with_capacity(3);

    let steps_x = (displacement.dx / step as f64) as i64;
    if steps_x > 0 {
        actions.push(Action::Move {
            direction: Direction::Right,
            magnitude: steps_x as u32,
        });
    } else if steps_x < 0 {
        actions.push(Action::Move {
            direction: Direction::Left,
            magnitude: (-steps_x) as u32,
        });
    }

    let steps_y = (displacement.dy / step as f64) as i64;
    if steps_y > 0 {
        actions.push(Action::Move {
            direction: Direction::Down,
            magnitude: steps_y as u32,
        });
    } else if steps_y < 0 {
        actions.push(Action::Move {
            direction: Direction::Up,
            magnitude: (-steps_y) as u32,
        });
    }

    actions.push(Action::Click);
    actions
}

/// Folds a plan back into its net continuous displacement.
///
/// Inverse of [`encode`] for step-multiple displacements. `Click` contributes
/// nothing.
pub fn decode(actions: &[Action], step: i32) -> Displacement {
    let mut dx = 0.0;
    let mut dy = 0.0;
    for action in actions {
        if let Action::Move { direction, magnitude } = action {
            let (ux, uy) = direction.unit();
            // f64 arithmetic: step * magnitude can exceed i32 for parsed
            // plans with absurd magnitudes
            let amount = step as f64 * f64::from(*magnitude);
            dx += f64::from(ux) * amount;
            dy += f64::from(uy) * amount;
        }
    }
    Displacement { dx, dy }
}

/// Extracts an action plan from free-form model text.
///
/// The model is asked to answer with one bracketed, comma- or
/// newline-separated token list, e.g. `"Response: [move right 1, click]"`.
/// The region between the first `[` and the last `]` is tokenized; entries
/// that do not parse as actions are dropped. No bracketed region means "no
/// actionable plan" and yields an empty vec; that is a normal outcome, not
/// an error.
pub fn parse_token_list(text: &str) -> Vec<Action> {
    let Some(open) = text.find('[') else {
        return Vec::new();
    };
    let Some(close) = text.rfind(']') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }

    text[open + 1..close]
        .split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| Action::from_str(t).ok())
        .collect()
}
