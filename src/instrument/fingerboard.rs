use thiserror::Error;

use crate::note::Note;

/// One playable position on a string: the fret, the note it sounds, and
/// the finger conventionally assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FretPosition {
    pub fret: u32,
    pub note: Note,
    pub finger: String,
}

/// A single string with its chromatic fret table.
///
/// The table is derived from the open note by repeated semitone
/// transposition, so `positions()[0]` sounds the open note and each entry
/// is exactly one semitone above the previous one. That gap-free layout
/// is what makes exact-match lookup well defined.
#[derive(Debug, Clone)]
pub struct InstrumentString {
    open: Note,
    positions: Vec<FretPosition>,
}

/// Invalid string configuration. Surfaced once at construction; lookup
/// itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerboardError {
    #[error("string {open} with {frets} frets runs past the top of the note range")]
    RangeExceeded { open: Note, frets: u32 },
    #[error("expected {expected} finger labels for {frets} frets, got {got}")]
    LabelCount {
        frets: u32,
        expected: usize,
        got: usize,
    },
}

impl InstrumentString {
    pub fn new(
        open: Note,
        frets: u32,
        finger_labels: &[String],
    ) -> Result<InstrumentString, FingerboardError> {
        let expected = frets as usize + 1;
        if finger_labels.len() != expected {
            return Err(FingerboardError::LabelCount {
                frets,
                expected,
                got: finger_labels.len(),
            });
        }

        let mut positions = Vec::with_capacity(expected);
        for (fret, finger) in (0..=frets).zip(finger_labels) {
            let note = open
                .transposed(fret as i32)
                .ok_or(FingerboardError::RangeExceeded { open, frets })?;
            positions.push(FretPosition {
                fret,
                note,
                finger: finger.clone(),
            });
        }

        Ok(InstrumentString {
            open,
            positions,
        })
    }

    pub fn open_note(&self) -> Note {
        self.open
    }

    pub fn positions(&self) -> &[FretPosition] {
        &self.positions
    }
}

/// Where to play a note: the string (by low-to-high index), its open
/// note, and the matched fret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingering<'a> {
    pub string_index: usize,
    pub open_note: Note,
    pub fret: u32,
    pub finger: &'a str,
}

/// The full fingerboard: strings ordered low to high.
#[derive(Debug, Clone)]
pub struct Fingerboard {
    strings: Vec<InstrumentString>,
}

impl Fingerboard {
    pub fn new(strings: Vec<InstrumentString>) -> Fingerboard {
        Fingerboard { strings }
    }

    pub fn strings(&self) -> &[InstrumentString] {
        &self.strings
    }

    /// Exact-match lookup: pitch class AND octave must both match a fret
    /// table entry. Strings are tried in their configured low-to-high
    /// order and the first hit wins, so a note playable on two strings
    /// deterministically lands on the lower one. A note outside every
    /// table gives `None`; there is no nearest-fret approximation.
    pub fn find(&self, note: Note) -> Option<Fingering<'_>> {
        self.strings
            .iter()
            .enumerate()
            .find_map(|(string_index, string)| {
                string
                    .positions
                    .iter()
                    .find(|position| position.note == note)
                    .map(|position| Fingering {
                        string_index,
                        open_note: string.open,
                        fret: position.fret,
                        finger: &position.finger,
                    })
            })
    }
}
