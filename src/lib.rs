// Library surface for the binary, headless/integration tests and reuse.
pub mod app_dirs;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod review;
pub mod runtime;
pub mod schedule;
pub mod study;
pub mod timer;
pub mod ui;

pub use error::{Error, Result};
