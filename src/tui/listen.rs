use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::audio::session::{DetectionSession, EstimateReader};
use crate::config::AppConfig;
use crate::instrument::fingerboard::Fingerboard;
use crate::instrument::keyboard::{Keyboard, KeyboardKey};
use crate::note::{Note, PitchClass};
use crate::staff;
use crate::tui;

/// Render cadence. The display samples the freshest published estimate
/// on every tick; it is intentionally decoupled from the audio cadence.
const TICK: Duration = Duration::from_millis(33);

/// Live detection screen: start the session, render until `q`, tear the
/// session down again.
pub fn run(config: &AppConfig) -> Result<()> {
    let keyboard = config.build_keyboard()?;
    let fingerboard = config.build_fingerboard()?;

    // Acquire the device before touching the terminal, so a capture
    // failure prints as a normal error instead of inside raw mode.
    let mut session = DetectionSession::new();
    session.start(&config.detection())?;

    let header = format!(
        " notescope | {} at {} Hz | q quits ",
        session.device_name().unwrap_or("unknown device"),
        session.sample_rate().unwrap_or(0),
    );
    let reader = session.reader();

    let mut terminal = tui::init()?;
    let result = event_loop(&mut terminal, &reader, &keyboard, &fingerboard, &header);
    tui::restore()?;
    session.stop();
    result
}

fn event_loop(
    terminal: &mut tui::Tui,
    reader: &EstimateReader,
    keyboard: &Keyboard,
    fingerboard: &Fingerboard,
    header: &str,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, reader, keyboard, fingerboard, header))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }
    }
}

fn draw(
    frame: &mut Frame,
    reader: &EstimateReader,
    keyboard: &Keyboard,
    fingerboard: &Fingerboard,
    header: &str,
) {
    let note = reader.note();

    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(fingerboard.strings().len() as u16 + 3),
        Constraint::Min(0),
    ])
    .split(frame.area());

    draw_note(frame, rows[0], reader, header);
    draw_staff(frame, rows[1], note);
    draw_keyboard(frame, rows[2], keyboard, note);
    draw_fingerboard(frame, rows[3], fingerboard, note);
}

fn draw_note(frame: &mut Frame, area: Rect, reader: &EstimateReader, header: &str) {
    let block = Block::default().title(header).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dim = Style::default().fg(Color::DarkGray);
    let line = match (reader.note(), reader.estimate()) {
        (Some(note), Some(est)) => Line::from(vec![
            Span::styled(
                format!(" {note} "),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {:.1} Hz  amp {:.0}", est.frequency_hz, est.amplitude),
                dim,
            ),
        ]),
        _ => Line::from(Span::styled(" --- ", dim.add_modifier(Modifier::BOLD))),
    };
    frame.render_widget(Paragraph::new(line), inner);
}

fn draw_staff(frame: &mut Frame, area: Rect, note: Option<Note>) {
    let block = Block::default().title(" Staff ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match note.and_then(staff::place) {
        Some(placed) => Line::from(vec![
            Span::styled(
                format!(" {} clef ", placed.clef.as_str()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {}", placed.note)),
        ]),
        None => Line::from(Span::styled(" rest ", Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), inner);
}

fn key_span(key: &KeyboardKey, note: Option<Note>) -> Span<'static> {
    let cell = format!("{:<3}", key.pitch_class.as_str());
    let style = if key.matches(note) {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if key.is_black() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    Span::styled(cell, style)
}

fn draw_keyboard(frame: &mut Frame, area: Rect, keyboard: &Keyboard, note: Option<Note>) {
    let block = Block::default().title(" Keyboard ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Two text rows per board: black keys above, white keys below, laid
    // out per octave so the black row sits over the right gaps.
    let mut black = vec![Span::raw(" ")];
    let mut white = vec![Span::raw(" ")];

    for octave_keys in keyboard.keys().chunks(12) {
        black.push(Span::raw("  "));
        for key in octave_keys.iter().filter(|key| key.is_black()) {
            black.push(key_span(key, note));
            if key.pitch_class == PitchClass::DSharp {
                black.push(Span::raw("   "));
            }
        }
        black.push(Span::raw(" "));

        for key in octave_keys.iter().filter(|key| !key.is_black()) {
            white.push(key_span(key, note));
        }
    }

    frame.render_widget(
        Paragraph::new(vec![Line::from(black), Line::from(white)]),
        inner,
    );
}

fn draw_fingerboard(frame: &mut Frame, area: Rect, fingerboard: &Fingerboard, note: Option<Note>) {
    let block = Block::default().title(" Fingerboard ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hit = note.and_then(|n| fingerboard.find(n));

    let mut lines = Vec::new();
    for (index, string) in fingerboard.strings().iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!(" {:<4}", string.open_note().to_string()),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for position in string.positions() {
            let matched =
                hit.is_some_and(|h| h.string_index == index && h.fret == position.fret);
            let style = if matched {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("{:>3}", position.fret), style));
        }
        lines.push(Line::from(spans));
    }

    let info = match hit {
        Some(h) => format!(
            " string {} ({}), fret {}, finger {}",
            h.string_index + 1,
            h.open_note,
            h.fret,
            h.finger
        ),
        None => " no fingering".to_string(),
    };
    lines.push(Line::from(Span::styled(
        info,
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}
