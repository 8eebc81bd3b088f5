use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::path::Path;

use crate::app_dirs::AppDirs;

/// Route `log` output to the state-dir log file so it never draws over the
/// TUI. `RUST_LOG` picks the level (default `info`); stderr is used when the
/// file cannot be opened.
pub fn init_logging() {
    let target = AppDirs::log_path().and_then(|path| open_log_file(&path));
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    match target {
        Some(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }
    // a logger installed earlier (tests, embedding) wins
    let _ = builder.try_init();
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
