use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lowest note number the pipeline accepts (C-1, about 8.2 Hz).
pub const MIN_NOTE_NUMBER: i32 = 0;

/// Highest note number the pipeline accepts (C9, about 8.4 kHz).
/// Anything a noisy frame quantizes to outside this window is treated as
/// an analysis artifact and reported as absent, not as an error.
pub const MAX_NOTE_NUMBER: i32 = 120;

/// Note number of the A4 tuning reference.
const A4_NOTE_NUMBER: i32 = 69;

const SEMITONES_PER_OCTAVE: i32 = 12;

/// The twelve pitch classes of the chromatic scale, in fixed sharp
/// spelling. Flat input spellings are normalized during parsing, so a
/// `PitchClass` value is always the sharp form.
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
    /// All twelve classes in chromatic order starting at C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Chromatic index in [0, 11], C = 0.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Pitch class for a chromatic index. Any integer is accepted; the
    /// index is wrapped into [0, 11] first.
    pub fn from_index(index: i32) -> PitchClass {
        Self::ALL[index.rem_euclid(SEMITONES_PER_OCTAVE) as usize]
    }

    /// Sharp-spelled name, e.g. `"C#"`.
    pub fn as_str(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Whether this class sits on a black key of a piano keyboard.
    pub fn is_black(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical note: sharp-spelled pitch class plus integer octave.
///
/// This is the single representation every consumer works from. The staff,
/// keyboard, and fingerboard projections all derive their coordinates from
/// a `Note`; none of them re-interpret frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Note {
        Note {
            pitch_class,
            octave,
        }
    }

    /// Linear note number: `(octave + 1) * 12 + pitch_class_index`.
    ///
    /// Consecutive numbers are one semitone apart, so all transposition
    /// and comparison arithmetic happens in this space. A4 is 69.
    pub fn number(self) -> i32 {
        (self.octave + 1) * SEMITONES_PER_OCTAVE + self.pitch_class.index()
    }

    /// Inverse of [`Note::number`]. Returns `None` outside
    /// [`MIN_NOTE_NUMBER`, `MAX_NOTE_NUMBER`].
    pub fn from_number(number: i32) -> Option<Note> {
        if !(MIN_NOTE_NUMBER..=MAX_NOTE_NUMBER).contains(&number) {
            return None;
        }
        Some(Note {
            pitch_class: PitchClass::from_index(number.rem_euclid(SEMITONES_PER_OCTAVE)),
            octave: number.div_euclid(SEMITONES_PER_OCTAVE) - 1,
        })
    }

    /// Quantize a frequency to the nearest equal-tempered note.
    ///
    /// `reference_a4_hz` is the frequency assigned to A4 (conventionally
    /// 440 Hz). Non-positive or non-finite input, and frequencies whose
    /// nearest note number falls outside the valid window, yield `None`.
    pub fn from_frequency(hz: f32, reference_a4_hz: f32) -> Option<Note> {
        if !(hz.is_finite() && hz > 0.0 && reference_a4_hz > 0.0) {
            return None;
        }
        let semitones_from_a4 = 12.0 * (hz / reference_a4_hz).log2();
        let number = semitones_from_a4.round() as i32 + A4_NOTE_NUMBER;
        Note::from_number(number)
    }

    /// Equal-tempered frequency of this note for a given A4 reference.
    pub fn frequency(self, reference_a4_hz: f32) -> f32 {
        let semitones_from_a4 = (self.number() - A4_NOTE_NUMBER) as f32;
        reference_a4_hz * (semitones_from_a4 / 12.0).exp2()
    }

    /// Shift by a signed number of semitones, carrying octaves uniformly
    /// through the note-number space (`B3 + 1 = C4`). Returns `None` when
    /// the result leaves the valid window.
    pub fn transposed(self, semitones: i32) -> Option<Note> {
        Note::from_number(self.number() + semitones)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Failure to parse a note string. Always recoverable; parsing never
/// produces a partial note.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNoteError {
    #[error("empty note string")]
    Empty,
    #[error("unknown pitch letter {0:?}")]
    UnknownLetter(char),
    #[error("missing or invalid octave in {0:?}")]
    InvalidOctave(String),
    #[error("octave {0} is outside the supported range")]
    OctaveOutOfRange(i32),
}

impl FromStr for Note {
    type Err = ParseNoteError;

    /// Parse strings like `"A4"`, `"C#3"`, `"Bb2"`, `"C-1"`.
    ///
    /// A pitch letter A to G, an optional `#` or `b`, then a signed
    /// integer octave. Flats normalize to their sharp equivalent
    /// (`Bb3` parses as `A#3`), including the borrow cases (`Cb4` is
    /// `B3`), because the accidental is applied in note-number space.
    fn from_str(s: &str) -> Result<Note, ParseNoteError> {
        let mut chars = s.chars();
        let letter = chars.next().ok_or(ParseNoteError::Empty)?;

        let natural_index = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            other => return Err(ParseNoteError::UnknownLetter(other)),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str
            .parse()
            .map_err(|_| ParseNoteError::InvalidOctave(s.to_string()))?;

        // Apply the accidental as a semitone offset so Cb and B# borrow
        // from the neighboring octave instead of wrapping in place.
        let number = (octave + 1) * SEMITONES_PER_OCTAVE + natural_index + accidental;
        Note::from_number(number).ok_or(ParseNoteError::OctaveOutOfRange(octave))
    }
}
