use std::fs::File;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Set up the global logger. The terminal belongs to the UI, so records go
/// to `file` when one is given and can be opened; otherwise logging stays off.
/// `RUST_LOG` overrides the default `info` filter.
///
/// Must run before raw mode: a log file that can't be created is reported on
/// stderr while the terminal is still readable.
pub fn setup_logger(file: Option<&Path>) {
    let Some(path) = file else {
        return;
    };
    let sink = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("beatgrid: logging disabled, cannot create {}: {e}", path.display());
            return;
        }
    };
    if let Err(e) = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(sink)))
        .try_init()
    {
        eprintln!("beatgrid: logger already set up: {e}");
    }
}
