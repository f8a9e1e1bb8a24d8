//! Fixed-width event encoding
//!
//! An event is packed into one 32-bit word laid out like a 3-byte MIDI
//! channel-voice message:
//!
//! ```text
//! bits 16-23  status (high nibble: 0x8 off, 0x9 on, 0xB cc, 0xE bend; low nibble: channel)
//! bits  8-15  data byte 1 (note / controller / bend LSB)
//! bits  0-7   data byte 2 (velocity / value / bend MSB)
//! ```

/// Modulation wheel controller number
pub const CC_MODULATION: u8 = 1;
/// Sustain (damper) pedal controller number
pub const CC_SUSTAIN_PEDAL: u8 = 64;
/// Pitch bend value meaning "no bend"
pub const PITCH_BEND_CENTER: u16 = 8192;

const STATUS_NOTE_OFF: u32 = 0x80;
const STATUS_NOTE_ON: u32 = 0x90;
const STATUS_CONTROL_CHANGE: u32 = 0xB0;
const STATUS_PITCH_BEND: u32 = 0xE0;

/// A decoded note/control event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Key pressed
    NoteOn { note: u8, velocity: u8 },
    /// Key released
    NoteOff { note: u8, velocity: u8 },
    /// Continuous controller moved
    ControlChange { controller: u8, value: u8 },
    /// Pitch wheel moved, 14-bit value centred at [`PITCH_BEND_CENTER`]
    PitchBend { value: u16 },
}

/// One event packed into a 32-bit word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MidiMessage(u32);

impl MidiMessage {
    /// Wrap a raw word
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Pack the three bytes of a channel-voice message as received on the wire
    pub const fn from_bytes(status: u8, data1: u8, data2: u8) -> Self {
        Self(((status as u32) << 16) | (((data1 & 0x7F) as u32) << 8) | (data2 & 0x7F) as u32)
    }

    /// Raw word
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Encode `event` for `channel` (0-15). Data bytes are masked to 7 bits.
    pub fn encode(channel: u8, event: Event) -> Self {
        let (status, data1, data2) = match event {
            Event::NoteOn { note, velocity } => (STATUS_NOTE_ON, note, velocity),
            Event::NoteOff { note, velocity } => (STATUS_NOTE_OFF, note, velocity),
            Event::ControlChange { controller, value } => {
                (STATUS_CONTROL_CHANGE, controller, value)
            }
            Event::PitchBend { value } => (
                STATUS_PITCH_BEND,
                (value & 0x7F) as u8,
                ((value >> 7) & 0x7F) as u8,
            ),
        };
        let status = status | (channel & 0x0F) as u32;
        Self((status << 16) | (((data1 & 0x7F) as u32) << 8) | (data2 & 0x7F) as u32)
    }

    /// Note-on on channel 0
    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self::encode(0, Event::NoteOn { note, velocity })
    }

    /// Note-off on channel 0
    pub fn note_off(note: u8, velocity: u8) -> Self {
        Self::encode(0, Event::NoteOff { note, velocity })
    }

    /// Control change on channel 0
    pub fn control_change(controller: u8, value: u8) -> Self {
        Self::encode(0, Event::ControlChange { controller, value })
    }

    /// Decode the event, `None` for any other status
    pub fn decode(self) -> Option<Event> {
        let data1 = self.data1();
        let data2 = self.data2();
        match self.status() & 0xF0 {
            STATUS_NOTE_OFF => Some(Event::NoteOff {
                note: data1,
                velocity: data2,
            }),
            STATUS_NOTE_ON => Some(Event::NoteOn {
                note: data1,
                velocity: data2,
            }),
            STATUS_CONTROL_CHANGE => Some(Event::ControlChange {
                controller: data1,
                value: data2,
            }),
            STATUS_PITCH_BEND => Some(Event::PitchBend {
                value: ((data2 as u16) << 7) | data1 as u16,
            }),
            _ => None,
        }
    }

    /// Channel nibble, 0-15
    pub fn channel(self) -> u8 {
        (self.status() & 0x0F) as u8
    }

    /// Reset to the invalid (all-zero) word
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    fn status(self) -> u32 {
        (self.0 >> 16) & 0xFF
    }

    fn data1(self) -> u8 {
        ((self.0 >> 8) & 0x7F) as u8
    }

    fn data2(self) -> u8 {
        (self.0 & 0x7F) as u8
    }
}
