use crate::note::Note;

/// Octave shift applied before choosing a staff, matching the display
/// convention of putting detected notes in a comfortably readable register.
const DISPLAY_OCTAVE_SHIFT: i32 = 12;

/// First octave (after the display shift) that renders on the upper staff.
const TREBLE_OCTAVE: i32 = 4;

/// Which staff of the two-staff system a note renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    pub fn as_str(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }
}

/// A note placed on the grand staff: the shifted note plus its clef.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffNote {
    pub note: Note,
    pub clef: Clef,
}

/// Project a detected note onto the two-staff system.
///
/// The note is transposed up one octave first, then octave 4 and above
/// goes to the treble staff, everything lower to the bass staff. `None`
/// means the shift left the valid range; callers render a rest.
pub fn place(note: Note) -> Option<StaffNote> {
    let shifted = note.transposed(DISPLAY_OCTAVE_SHIFT)?;
    let clef = if shifted.octave >= TREBLE_OCTAVE {
        Clef::Treble
    } else {
        Clef::Bass
    };
    Some(StaffNote {
        note: shifted,
        clef,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::PitchClass;

    #[test]
    fn middle_register_lands_on_treble() {
        let placed = place(Note::new(PitchClass::C, 4)).unwrap();
        assert_eq!(placed.note, Note::new(PitchClass::C, 5));
        assert_eq!(placed.clef, Clef::Treble);
    }

    #[test]
    fn low_register_lands_on_bass() {
        let placed = place(Note::new(PitchClass::E, 1)).unwrap();
        assert_eq!(placed.note, Note::new(PitchClass::E, 2));
        assert_eq!(placed.clef, Clef::Bass);
    }

    #[test]
    fn boundary_octave_after_shift_is_treble() {
        // B2 shifts to B3 (bass); C3 shifts to C4 (treble).
        assert_eq!(place(Note::new(PitchClass::B, 2)).unwrap().clef, Clef::Bass);
        assert_eq!(place(Note::new(PitchClass::C, 3)).unwrap().clef, Clef::Treble);
    }

    #[test]
    fn top_of_range_has_no_placement() {
        assert_eq!(place(Note::new(PitchClass::C, 9)), None);
    }
}
