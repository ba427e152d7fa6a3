//! Mapping between frequencies and 12-tone equal-temperament note names,
//! anchored at A4 = 440 Hz.

use std::fmt;

use crate::float::Float;

/// Concert pitch of A4 in Hz.
pub const A4_HZ: f64 = 440.0;

/// Half steps from C0 to A4.
const A4_HALF_STEPS: f64 = 57.0;

/// Absorbs rounding noise so that exact note frequencies map to 0 cents, not -1.
const CENTS_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteName {
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

const CHROMATIC: [NoteName; 12] = [
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
];

impl NoteName {
    /// Position in the chromatic scale starting at C.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        CHROMATIC[index % 12]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nearest note to a frequency and how far off it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    name: NoteName,
    octave: i32,
    cents_offset: i32,
}

impl Note {
    /// Map a frequency to its nearest note. `None` for frequencies that are not
    /// positive and finite.
    pub fn from_frequency<T: Float>(frequency_hz: T) -> Option<Self> {
        let frequency_hz = frequency_hz.to_f64()?;
        if !(frequency_hz > 0.0 && frequency_hz.is_finite()) {
            return None;
        }

        // 12 * log2(f / C0), with C0 = 440 * 2^(-4.75).
        let half_steps = 12.0 * (frequency_hz / A4_HZ).log2() + A4_HALF_STEPS;
        let nearest = half_steps.round();
        let cents_offset = ((half_steps - nearest) * 100.0 + CENTS_EPSILON).floor() as i32;

        Some(Note {
            name: NoteName::from_index(nearest.rem_euclid(12.0) as usize),
            octave: (nearest / 12.0).floor() as i32,
            cents_offset,
        })
    }

    /// The note `half_steps` above C0.
    pub fn from_half_steps(half_steps: i32) -> Self {
        Note {
            name: NoteName::from_index(half_steps.rem_euclid(12) as usize),
            octave: half_steps.div_euclid(12),
            cents_offset: 0,
        }
    }

    pub fn name(&self) -> NoteName {
        self.name
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Deviation from the nearest note in cents, within `-50..50`.
    pub fn cents_offset(&self) -> i32 {
        self.cents_offset
    }

    /// Half steps above C0 of the nearest note.
    pub fn half_steps(&self) -> i32 {
        12 * self.octave + self.name.index() as i32
    }

    /// MIDI note number of the nearest note (A4 is 69).
    pub fn midi_number(&self) -> i32 {
        self.half_steps() + 12
    }

    /// Exact frequency of the nearest note, ignoring the cents offset.
    pub fn frequency_hz(&self) -> f64 {
        A4_HZ * 2f64.powf((self.half_steps() as f64 - A4_HALF_STEPS) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Signed distance in cents from `from_hz` to `to_hz`.
pub fn cents_between(from_hz: f64, to_hz: f64) -> f64 {
    1200.0 * (to_hz / from_hz).log2()
}
