use anyhow::{anyhow, Result};
use console::style;

use crate::config::AppConfig;
use crate::note::Note;
use crate::staff;

/// One-shot conversion: resolve the query, then print the note number,
/// frequency, and every instrument projection for it.
pub fn run(query: &str, config: &AppConfig) -> Result<()> {
    let reference = config.analysis.reference_a4_hz;
    let note = resolve(query, reference)?;
    let keyboard = config.build_keyboard()?;
    let fingerboard = config.build_fingerboard()?;

    println!("  Note:        {}", style(note).cyan().bold());
    println!("  Note number: {}", note.number());
    println!(
        "  Frequency:   {:.2} Hz (A4 = {reference} Hz)",
        note.frequency(reference)
    );

    match staff::place(note) {
        Some(placed) => println!("  Staff:       {} clef as {}", placed.clef.as_str(), placed.note),
        None => println!("  Staff:       off the staff"),
    }

    let lit = keyboard.highlighted(Some(note)).count();
    println!(
        "  Keyboard:    every {} key ({lit} on the configured board)",
        note.pitch_class
    );

    match fingerboard.find(note) {
        Some(hit) => println!(
            "  Fingerboard: string {} ({}), fret {}, finger {}",
            hit.string_index + 1,
            hit.open_note,
            hit.fret,
            hit.finger
        ),
        None => println!("  Fingerboard: no fingering"),
    }

    Ok(())
}

/// A query is a note name first; anything that parses as a number
/// instead is treated as a frequency in Hz and quantized.
fn resolve(query: &str, reference_a4_hz: f32) -> Result<Note> {
    match query.parse::<Note>() {
        Ok(note) => Ok(note),
        Err(note_err) => match query.parse::<f32>() {
            Ok(hz) => Note::from_frequency(hz, reference_a4_hz)
                .ok_or_else(|| anyhow!("{hz} Hz does not quantize to a note in range")),
            Err(_) => Err(note_err.into()),
        },
    }
}
