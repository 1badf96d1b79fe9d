use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::grid::{draw_pads, draw_steps};
use super::mode::TuiState;
use crate::audio_api::EngineState;
use crate::shared::{DisplayState, NUM_VOICES};

const HELP: &str =
    "Q-Y play · space play/stop · arrows+enter edit · c clear · d dice · [ ] { } tempo · a audio · esc quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport / tempo / engine
            Constraint::Length(3), // pads
            Constraint::Length(NUM_VOICES as u16 + 3), // step grid + ruler
            Constraint::Min(3), // status + help
        ])
        .split(area);

    draw_header(frame, sections[0], state);
    draw_pads(frame, sections[1], &state.pads_lit);
    draw_steps(frame, sections[2], state, ts, blink_on);
    draw_footer(frame, sections[3], state);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let (transport, transport_color) = if state.playing {
        ("▶ PLAYING", Color::Green)
    } else {
        ("■ STOPPED", Color::Red)
    };
    let (engine, engine_color) = match state.engine {
        EngineState::Uninitialized => ("audio off", Color::DarkGray),
        EngineState::Ready => ("audio on", Color::Green),
        EngineState::Failed => ("audio failed", Color::Red),
    };
    let step = state
        .playing_step
        .map(|s| format!("step {:>2}", s + 1))
        .unwrap_or_else(|| String::from("step  -"));

    let line = Line::from(vec![
        Span::styled(transport, Style::default().fg(transport_color).add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(format!("{:>3.0} BPM", state.bpm), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::raw(step),
        Span::raw("   "),
        Span::styled(engine, Style::default().fg(engine_color)),
    ]);
    frame.render_widget(Paragraph::new(line).block(Block::bordered().title(" beatgrid ")), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let lines = vec![
        Line::from(state.status.as_str()),
        Line::styled(HELP, Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(Paragraph::new(lines).block(Block::bordered()), area);
}
