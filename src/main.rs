use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use beatgrid::audio::CpalEngine;
use beatgrid::config::Config;
use beatgrid::logging;
use beatgrid::sequencer::{KeyGate, MonotonicClock, Sequencer};
use beatgrid::shared::InputEvent;
use beatgrid::tui;
use beatgrid::Middle;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config_path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("beatgrid.json"));
    let config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("beatgrid: ignoring {}: {e}", config_path.display());
            Config::default()
        }
    };
    logging::setup_logger(config.log_file.as_deref());
    log::info!("config: {config:?}");

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let _guard = RawModeGuard; // auto drops when out of scope
    // real press/release detection so held pads fire once; without it
    // auto-repeat arrives as plain presses and the key gate times them out
    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PushKeyboardEnhancementFlags(
                crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        );
    }

    let clock = MonotonicClock::new();
    let mut seq = Sequencer::new(CpalEngine::new(clock), clock)
        .with_clock_settings(config.clock_settings())
        .with_densities(config.densities.to_array())
        .with_key_gate(KeyGate::new(release_events).with_repeat_window(config.repeat_window()));
    seq.set_tempo(config.tempo())?;
    let mut middle = Middle::new(seq);

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        middle.tick();

        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                middle.handle_input(event);
                drop(term);
                log::info!("bye");
                return Ok(());
            }
            middle.handle_input(event);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
