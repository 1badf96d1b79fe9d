use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

use super::mode::TuiState;
use crate::shared::{InputEvent, Voice};

// poll for input from the terminal, drain whatever is queued, and resolve it
// into semantic input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    if !event::poll(timeout)? {
        return Ok(events);
    }
    loop {
        if let Event::Key(key) = event::read()? {
            events.extend(handle_key(key, ts));
        }
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(events)
}

pub(crate) fn handle_key(key: KeyEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    match key.kind {
        // only reported with keyboard enhancement; plain terminals send
        // repeats as presses, which the key gate filters
        KeyEventKind::Repeat => vec![],
        KeyEventKind::Release => match key.code {
            KeyCode::Char(c) => Voice::from_key(c).map(InputEvent::VoiceUp).into_iter().collect(),
            _ => vec![],
        },
        KeyEventKind::Press => handle_press(key.code, ts),
    }
}

fn handle_press(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],

        // edit cursor stays on this side
        KeyCode::Up => { ts.move_cursor(-1, 0); vec![] }
        KeyCode::Down => { ts.move_cursor(1, 0); vec![] }
        KeyCode::Left => { ts.move_cursor(0, -1); vec![] }
        KeyCode::Right => { ts.move_cursor(0, 1); vec![] }
        KeyCode::Enter => {
            let (voice, step) = ts.cursor();
            vec![InputEvent::ToggleStep { voice, step }]
        }

        KeyCode::Char('[') => vec![InputEvent::AdjustBpm(-1.0)],
        KeyCode::Char(']') => vec![InputEvent::AdjustBpm(1.0)],
        KeyCode::Char('{') => vec![InputEvent::AdjustBpm(-10.0)],
        KeyCode::Char('}') => vec![InputEvent::AdjustBpm(10.0)],
        KeyCode::Char('c' | 'C') => vec![InputEvent::Clear],
        KeyCode::Char('d' | 'D') => vec![InputEvent::Randomize],
        KeyCode::Char('a' | 'A') => vec![InputEvent::StartAudio],

        KeyCode::Char(c) => Voice::from_key(c).map(InputEvent::VoiceDown).into_iter().collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn voice_keys_map_to_pads() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut ts), vec![InputEvent::VoiceDown(Voice::Kick)]);
        assert_eq!(handle_key(press(KeyCode::Char('Y')), &mut ts), vec![InputEvent::VoiceDown(Voice::Perc)]);
        let up = KeyEvent::new_with_kind(KeyCode::Char('w'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(handle_key(up, &mut ts), vec![InputEvent::VoiceUp(Voice::Snare)]);
    }

    #[test]
    fn repeats_are_swallowed() {
        let mut ts = TuiState::default();
        let repeat = KeyEvent::new_with_kind(KeyCode::Char('e'), KeyModifiers::NONE, KeyEventKind::Repeat);
        assert!(handle_key(repeat, &mut ts).is_empty());
    }

    #[test]
    fn enter_toggles_the_cell_under_the_cursor() {
        let mut ts = TuiState::default();
        handle_key(press(KeyCode::Down), &mut ts);
        handle_key(press(KeyCode::Right), &mut ts);
        handle_key(press(KeyCode::Right), &mut ts);
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut ts),
            vec![InputEvent::ToggleStep { voice: Voice::Snare, step: 2 }]
        );
    }

    #[test]
    fn tempo_keys() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(press(KeyCode::Char('}')), &mut ts), vec![InputEvent::AdjustBpm(10.0)]);
        assert_eq!(handle_key(press(KeyCode::Char('[')), &mut ts), vec![InputEvent::AdjustBpm(-1.0)]);
    }
}
