//! Parser for the text event-script format
//!
//! Format:
//! +<timestep_delta>| <event1>, <event2>  # comments
//!
//! Events:
//! - Key down: <octave><note>[#]d[<velocity>]  (e.g., 4c#d, 4ad90)
//! - Key up:   <octave><note>[#]u              (e.g., 4c#u, 4au)
//! - Control change: cc<controller>=<value>    (e.g., cc64=127)
//! - Pitch bend: pb<value>, 14-bit, 8192 = centre (e.g., pb12000)
//!
//! Notes:
//! - White keys: c, d, e, f, g, a, b
//! - Black keys: c#, d#, f#, g#, a#
//! - Octaves: 0-9, MIDI note = (octave + 1) * 12 + semitone, so 4a is 69

use crate::midi::Event;
use std::str::FromStr;
use thiserror::Error;

/// Highest value a 14-bit pitch bend can take
const PITCH_BEND_MAX: u16 = 0x3FFF;

/// A key on the keyboard (pitch class and octave)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub octave: u8,
    pub pitch_class: PitchClass,
}

impl Note {
    /// MIDI note number, `None` above 127
    pub fn midi(&self) -> Option<u8> {
        let note = (self.octave as u16 + 1) * 12 + self.pitch_class.semitone() as u16;
        u8::try_from(note).ok().filter(|&n| n < 128)
    }
}

/// Pitch classes with support for black keys (sharps only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// Semitone above C (C=0, C#=1, D=2, ...)
    pub fn semitone(&self) -> u8 {
        match self {
            PitchClass::C => 0,
            PitchClass::CSharp => 1,
            PitchClass::D => 2,
            PitchClass::DSharp => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::FSharp => 6,
            PitchClass::G => 7,
            PitchClass::GSharp => 8,
            PitchClass::A => 9,
            PitchClass::ASharp => 10,
            PitchClass::B => 11,
        }
    }
}

impl FromStr for PitchClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(PitchClass::C),
            "c#" => Ok(PitchClass::CSharp),
            "d" => Ok(PitchClass::D),
            "d#" => Ok(PitchClass::DSharp),
            "e" => Ok(PitchClass::E),
            "f" => Ok(PitchClass::F),
            "f#" => Ok(PitchClass::FSharp),
            "g" => Ok(PitchClass::G),
            "g#" => Ok(PitchClass::GSharp),
            "a" => Ok(PitchClass::A),
            "a#" => Ok(PitchClass::ASharp),
            "b" => Ok(PitchClass::B),
            _ => Err(ParseError::InvalidPitchClass(s.to_string())),
        }
    }
}

/// Direction of a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// One event of a script line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEvent {
    /// Key pressed or lifted; `velocity` only on key down, when given
    Key {
        note: Note,
        direction: KeyDirection,
        velocity: Option<u8>,
    },
    Control { controller: u8, value: u8 },
    PitchBend { value: u16 },
}

impl ScriptEvent {
    /// Engine event, using `base_velocity` for key downs without one
    pub fn to_event(&self, base_velocity: u8) -> Result<Event, ParseError> {
        Ok(match *self {
            ScriptEvent::Key {
                note,
                direction,
                velocity,
            } => {
                let midi = note
                    .midi()
                    .ok_or_else(|| ParseError::InvalidNote(format!("{:?}", note)))?;
                match direction {
                    KeyDirection::Down => Event::NoteOn {
                        note: midi,
                        velocity: velocity.unwrap_or(base_velocity),
                    },
                    KeyDirection::Up => Event::NoteOff {
                        note: midi,
                        velocity: 0,
                    },
                }
            }
            ScriptEvent::Control { controller, value } => Event::ControlChange { controller, value },
            ScriptEvent::PitchBend { value } => Event::PitchBend { value },
        })
    }
}

/// A line of the script with its timestep delta
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvents {
    /// Timesteps since previous line (absolute timestep for first line)
    pub delta: usize,
    /// Events occurring at this timestep
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid line: {0}")]
    InvalidLine(String),
    #[error("Invalid timestep: {0}")]
    InvalidTimestep(String),
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("Invalid note: {0}")]
    InvalidNote(String),
    #[error("Invalid pitch class: {0}")]
    InvalidPitchClass(String),
    #[error("Invalid octave: {0}")]
    InvalidOctave(String),
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Parse a 7-bit data value
fn parse_data(s: &str) -> Result<u8, ParseError> {
    s.parse::<u8>()
        .ok()
        .filter(|&v| v < 128)
        .ok_or_else(|| ParseError::InvalidValue(s.to_string()))
}

/// Parse `cc<controller>=<value>`
fn parse_control(s: &str) -> Result<ScriptEvent, ParseError> {
    let (controller, value) = s
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidEvent(format!("cc{}", s)))?;
    Ok(ScriptEvent::Control {
        controller: parse_data(controller.trim())?,
        value: parse_data(value.trim())?,
    })
}

/// Parse `pb<value>`
fn parse_pitch_bend(s: &str) -> Result<ScriptEvent, ParseError> {
    let value = s
        .parse::<u16>()
        .ok()
        .filter(|&v| v <= PITCH_BEND_MAX)
        .ok_or_else(|| ParseError::InvalidValue(s.to_string()))?;
    Ok(ScriptEvent::PitchBend { value })
}

/// Parse `<octave><note>[#]<direction>[<velocity>]`
fn parse_key(s: &str) -> Result<ScriptEvent, ParseError> {
    // Trailing digits are the velocity
    let body = s.trim_end_matches(|c: char| c.is_ascii_digit());
    let velocity = match &s[body.len()..] {
        "" => None,
        digits => Some(parse_data(digits)?),
    };

    let Some(direction_char) = body.chars().last() else {
        return Err(ParseError::InvalidEvent(s.to_string()));
    };
    let direction = match direction_char {
        'd' | 'D' => KeyDirection::Down,
        'u' | 'U' => KeyDirection::Up,
        other => return Err(ParseError::InvalidDirection(other.to_string())),
    };
    if direction == KeyDirection::Up && velocity.is_some() {
        return Err(ParseError::InvalidEvent(s.to_string()));
    }

    let note_part = &body[..body.len() - 1];
    let mut chars = note_part.chars();
    let octave_char = chars
        .next()
        .ok_or_else(|| ParseError::InvalidNote("missing note".to_string()))?;
    let octave = octave_char
        .to_digit(10)
        .ok_or_else(|| ParseError::InvalidOctave(octave_char.to_string()))? as u8;

    let pitch_str = chars.as_str();
    if pitch_str.is_empty() {
        return Err(ParseError::InvalidPitchClass("missing".to_string()));
    }
    let note = Note {
        octave,
        pitch_class: PitchClass::from_str(pitch_str)?,
    };
    if note.midi().is_none() {
        return Err(ParseError::InvalidNote(note_part.to_string()));
    }

    Ok(ScriptEvent::Key {
        note,
        direction,
        velocity,
    })
}

/// Parse a single event string
pub fn parse_event(s: &str) -> Result<ScriptEvent, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::InvalidEvent("empty event".to_string()));
    }
    if let Some(rest) = s.strip_prefix("cc") {
        parse_control(rest)
    } else if let Some(rest) = s.strip_prefix("pb") {
        parse_pitch_bend(rest)
    } else {
        parse_key(s)
    }
}

/// Parse a line of the script
/// Format: +<delta>| event1, event2, ...  # comment
pub fn parse_line(line: &str) -> Result<TimedEvents, ParseError> {
    // Split on " #" so sharps like "c#" survive
    let line = line.split(" #").next().unwrap_or(line).trim();

    if line.is_empty() {
        return Ok(TimedEvents {
            delta: 0,
            events: vec![],
        });
    }

    let Some((timestep_part, events_part)) = line.split_once('|') else {
        return Err(ParseError::InvalidLine(format!(
            "expected +<delta>| events, got {:?}",
            line
        )));
    };

    let timestep_part = timestep_part.trim();
    let delta = timestep_part
        .strip_prefix('+')
        .ok_or_else(|| ParseError::InvalidTimestep("timestep must start with +".to_string()))?
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidTimestep(timestep_part.to_string()))?;

    let events = events_part
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_event)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimedEvents { delta, events })
}

/// Parse a full script into timed event groups in chronological order
///
/// Lines without events still advance time, so `+8|` at the end keeps the
/// render going for eight more timesteps.
pub fn parse_script(text: &str) -> Result<Vec<TimedEvents>, ParseError> {
    let mut result = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let timed = parse_line(line).map_err(|e| {
            log::debug!("Script line {}: {}", number + 1, e);
            e
        })?;
        result.push(timed);
    }

    Ok(result)
}
