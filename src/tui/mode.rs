use crate::shared::{NUM_VOICES, STEPS_PER_PATTERN, Voice};

// state local to the tui: where the edit cursor sits on the grid
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub cursor_voice: usize,
    pub cursor_step: usize,
}

impl TuiState {
    pub fn cursor(&self) -> (Voice, usize) {
        (Voice::ALL[self.cursor_voice % NUM_VOICES], self.cursor_step)
    }

    // cursor wraps around both axes
    pub fn move_cursor(&mut self, d_voice: isize, d_step: isize) {
        self.cursor_voice = wrap(self.cursor_voice, d_voice, NUM_VOICES);
        self.cursor_step = wrap(self.cursor_step, d_step, STEPS_PER_PATTERN);
    }
}

fn wrap(value: usize, delta: isize, len: usize) -> usize {
    (value as isize + delta).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps() {
        let mut ts = TuiState::default();
        ts.move_cursor(-1, -1);
        assert_eq!(ts.cursor(), (Voice::Perc, 15));
        ts.move_cursor(1, 2);
        assert_eq!(ts.cursor(), (Voice::Kick, 1));
    }
}
