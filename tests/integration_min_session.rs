// Drives the compiled binary through a PTY so the real crossterm input thread
// and terminal setup are exercised.
//
// Requires a TTY, so it is Unix-only and ignored by default. Run with
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn timer_session_ends_on_quit() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("engtrack");
    let cmd = format!(
        "env HOME={} {} timer minimal_demo --no-voice --no-beep",
        home.path().display(),
        bin.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(300));

    // pause, resume, then end the session
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("q")?;

    p.expect("Minimal Demo: Ended")?;
    p.expect(Eof)?;
    Ok(())
}

#[test]
#[ignore]
fn study_session_logs_on_quit() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("engtrack");
    let cmd = format!("env HOME={} {} study", home.path().display(), bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(300));
    p.send("q")?;

    p.expect("logged 1 min of study")?;
    p.expect(Eof)?;
    Ok(())
}
