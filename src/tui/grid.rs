use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::mode::TuiState;
use crate::shared::{DisplayState, NUM_VOICES, STEPS_PER_PATTERN, Voice};

const LABEL_WIDTH: usize = 10;

pub fn voice_color(voice: Voice) -> Color {
    match voice {
        Voice::Kick => Color::Red,
        Voice::Snare => Color::Blue,
        Voice::HiHat => Color::Yellow,
        Voice::OpenHat => Color::Green,
        Voice::Crash => Color::Magenta,
        Voice::Perc => Color::LightMagenta,
    }
}

// one pad per voice in a single row, lit for a moment after each hit
pub fn draw_pads(frame: &mut Frame, area: Rect, pads_lit: &[bool; NUM_VOICES]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, NUM_VOICES as u32); NUM_VOICES])
        .split(area);

    for (voice, cell_area) in Voice::ALL.iter().zip(cols.iter()) {
        let info = voice.info();
        let color = voice_color(*voice);
        let style = if pads_lit[voice.index()] {
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        let pad = Paragraph::new(format!("{} [{}]", info.label, info.key.to_ascii_uppercase()))
            .style(style)
            .block(Block::bordered().border_style(Style::default().fg(color)));
        frame.render_widget(pad, *cell_area);
    }
}

// 6 x 16 step grid; the playing column is highlighted, the edit cursor reversed
pub fn draw_steps(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let (cursor_voice, cursor_step) = ts.cursor();
    let mut lines = Vec::with_capacity(NUM_VOICES + 1);

    let mut ruler = vec![Span::raw(" ".repeat(LABEL_WIDTH))];
    for step in 0..STEPS_PER_PATTERN {
        let mark = if step % 4 == 0 { format!("{:<2}", step + 1) } else { String::from("  ") };
        ruler.push(Span::styled(mark, Style::default().fg(Color::DarkGray)));
        if step % 4 == 3 {
            ruler.push(Span::raw(" "));
        }
    }
    lines.push(Line::from(ruler));

    for voice in Voice::ALL {
        let color = voice_color(voice);
        let mut spans = vec![Span::styled(
            format!("{:<width$}", voice.info().label, width = LABEL_WIDTH),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        for (step, active) in state.grid.row(voice).iter().enumerate() {
            let mut style = if *active {
                Style::default().fg(color)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if state.playing_step == Some(step) {
                style = style.bg(Color::Yellow);
                if !*active {
                    style = style.fg(Color::Black);
                }
            }
            if voice == cursor_voice && step == cursor_step && blink_on {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let glyph = if *active { "■ " } else { "· " };
            spans.push(Span::styled(glyph, style));
            if step % 4 == 3 {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    let grid = Paragraph::new(lines).block(Block::bordered().title(" steps "));
    frame.render_widget(grid, area);
}
