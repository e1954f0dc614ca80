use crate::note::{Note, PitchClass};

/// One key of the visual keyboard. Keys have no lifecycle of their own;
/// the whole board is derived from the 12-class template replicated
/// across the configured octave range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardKey {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl KeyboardKey {
    pub fn is_black(&self) -> bool {
        self.pitch_class.is_black()
    }

    /// Keyboard highlighting matches on pitch class only. The board spans
    /// a fixed window unrelated to the detected register, so it shows
    /// which key you would press, not which octave you played it in.
    pub fn matches(&self, detected: Option<Note>) -> bool {
        detected.is_some_and(|note| note.pitch_class == self.pitch_class)
    }
}

/// The fixed keyboard template over a configured octave range.
#[derive(Debug, Clone)]
pub struct Keyboard {
    keys: Vec<KeyboardKey>,
}

impl Keyboard {
    pub fn new(low_octave: i32, high_octave: i32) -> Keyboard {
        let mut keys = Vec::new();
        for octave in low_octave..=high_octave {
            for pitch_class in PitchClass::ALL {
                keys.push(KeyboardKey {
                    pitch_class,
                    octave,
                });
            }
        }
        Keyboard { keys }
    }

    pub fn keys(&self) -> &[KeyboardKey] {
        &self.keys
    }

    /// Every key the detected note lights up; empty when the note is
    /// absent, never a stale previous highlight.
    pub fn highlighted(&self, detected: Option<Note>) -> impl Iterator<Item = &KeyboardKey> {
        self.keys.iter().filter(move |key| key.matches(detected))
    }
}
