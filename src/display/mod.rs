//! Rendering layer: all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of what to
//! draw. No game logic is performed; this module only translates frames and
//! round state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use robot_shooter::compute::{round_half_up, time_left_ms};
use robot_shooter::entities::{GameState, Round};
use robot_shooter::raster::Frame;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD_TIME: Color = Color::White;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_BG: Color = Color::Black;
const C_TITLE: Color = Color::Cyan;
const C_HIGH_SCORE: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

// ── Public entry points ───────────────────────────────────────────────────────

/// Render one complete in-round frame: the scene plus the HUD.
pub fn render<W: Write>(
    out: &mut W,
    frame: &Frame,
    state: &GameState,
    now_ms: u64,
) -> std::io::Result<()> {
    draw_frame(out, frame)?;
    draw_hud(out, frame.width, state, now_ms)?;

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, frame.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

/// Title screen shown before the first round.
pub fn draw_start<W: Write>(out: &mut W) -> std::io::Result<()> {
    out.queue(style::ResetColor)?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let (width, height) = terminal::size()?;

    let lines: &[(&str, Color)] = &[
        ("╔══════════════════════╗", C_TITLE),
        ("║    ROBOT  SHOOTER    ║", C_TITLE),
        ("╚══════════════════════╝", C_TITLE),
        ("Click the robots before they reach you.", Color::White),
        ("", Color::White),
        ("ENTER / click : Start   Q : Quit", C_HINT),
    ];
    draw_centered(out, width, height, lines)?;
    out.flush()?;
    Ok(())
}

/// Overlay drawn on top of the last frame once the clock runs out.
pub fn draw_time_up<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    round: &Round,
    high_score: i64,
) -> std::io::Result<()> {
    let score_line = format!("Score: {}", round_half_up(round.score));
    let high_line = format!("High score: {}", high_score);
    let lines: &[(&str, Color)] = &[
        ("╔══════════════════╗", Color::Red),
        ("║     TIME  UP     ║", Color::Red),
        ("╚══════════════════╝", Color::Red),
        (&score_line, Color::White),
        (&high_line, C_HIGH_SCORE),
        ("ENTER / click : Play Again   Q : Quit", Color::White),
    ];
    out.queue(style::SetBackgroundColor(C_HUD_BG))?;
    draw_centered(out, width, height, lines)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── Scene ─────────────────────────────────────────────────────────────────────

fn draw_frame<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    // Only emit colour changes when they differ from the previous cell.
    let mut fg: Option<Color> = None;
    let mut bg: Option<Color> = None;
    let mut line = String::with_capacity(usize::from(frame.width) * 4);

    for (row, cells) in frame.rows().enumerate() {
        out.queue(cursor::MoveTo(0, row as u16))?;
        for cell in cells {
            if fg != Some(cell.fg) || bg != Some(cell.bg) {
                if !line.is_empty() {
                    out.queue(Print(&line))?;
                    line.clear();
                }
                if fg != Some(cell.fg) {
                    out.queue(style::SetForegroundColor(cell.fg))?;
                    fg = Some(cell.fg);
                }
                if bg != Some(cell.bg) {
                    out.queue(style::SetBackgroundColor(cell.bg))?;
                    bg = Some(cell.bg);
                }
            }
            line.push(cell.ch);
        }
        if !line.is_empty() {
            out.queue(Print(&line))?;
            line.clear();
        }
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    width: u16,
    state: &GameState,
    now_ms: u64,
) -> std::io::Result<()> {
    out.queue(style::SetBackgroundColor(C_HUD_BG))?;

    // Time, left
    let left_ms = time_left_ms(&state.round, now_ms, state.round_ms);
    let secs = round_half_up(left_ms as f64 / 1000.0);
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(format!("Time: {} s", secs)))?;

    // Score, right
    let score_text = format!("Score: {:>6}", round_half_up(state.round.score));
    let sx = width.saturating_sub(score_text.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&score_text))?;

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn draw_centered<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    lines: &[(&str, Color)],
) -> std::io::Result<()> {
    let cx = width / 2;
    let start_row = (height / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}
