use std::io::{self, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Voice and chime output used by the timer. Calls must return immediately;
/// failures are the implementation's problem and never reach the timer.
pub trait Announcer {
    fn announce(&mut self, text: &str);
    fn chime(&mut self);
    /// Drop anything queued or currently playing.
    fn cancel(&mut self) {}
}

/// Which outputs are enabled. Toggling never changes timer progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueSettings {
    pub voice: bool,
    pub chime: bool,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            voice: true,
            chime: true,
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce(&mut self, _text: &str) {}
    fn chime(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Say(String),
    Chime,
    Cancel,
}

/// Keeps every cue in order; used to drive the timer headlessly.
#[derive(Debug, Default, Clone)]
pub struct RecordingAnnouncer {
    pub cues: Vec<Cue>,
}

impl RecordingAnnouncer {
    pub fn spoken(&self) -> Vec<&str> {
        self.cues
            .iter()
            .filter_map(|c| match c {
                Cue::Say(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn chimes(&self) -> usize {
        self.cues.iter().filter(|c| **c == Cue::Chime).count()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&mut self, text: &str) {
        self.cues.push(Cue::Say(text.to_string()));
    }

    fn chime(&mut self) {
        self.cues.push(Cue::Chime);
    }

    fn cancel(&mut self) {
        self.cues.push(Cue::Cancel);
    }
}

/// Speaks through an external text-to-speech command (`espeak`, `say`, ...)
/// and rings the terminal bell for chimes.
///
/// Utterances are queued on a worker thread and played one after another.
/// `cancel` kills the current utterance and skips everything queued before it.
pub struct SpeechAnnouncer {
    tx: Option<Sender<(u64, String)>>,
    generation: Arc<AtomicU64>,
    current: Arc<Mutex<Option<Child>>>,
}

impl SpeechAnnouncer {
    /// `command` is split on whitespace; the text is appended as the last argument.
    pub fn new(command: Option<String>) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let current: Arc<Mutex<Option<Child>>> = Arc::new(Mutex::new(None));

        let tx = command
            .filter(|c| !c.trim().is_empty())
            .map(|command| {
                let (tx, rx) = mpsc::channel::<(u64, String)>();
                let generation = Arc::clone(&generation);
                let current = Arc::clone(&current);

                thread::spawn(move || {
                    let mut parts = command.split_whitespace();
                    let Some(program) = parts.next().map(str::to_string) else {
                        return;
                    };
                    let args: Vec<String> = parts.map(str::to_string).collect();

                    for (job_generation, text) in rx {
                        if job_generation != generation.load(Ordering::SeqCst) {
                            continue;
                        }
                        let spawned = Command::new(&program)
                            .args(&args)
                            .arg(&text)
                            .stdin(Stdio::null())
                            .stdout(Stdio::null())
                            .stderr(Stdio::null())
                            .spawn();
                        match spawned {
                            Ok(child) => {
                                if hold_unless_cancelled(&current, child, job_generation, &generation) {
                                    wait_for_current(&current);
                                }
                            }
                            Err(e) => {
                                log::debug!("speech command {program:?} unavailable: {e}");
                                return;
                            }
                        }
                    }
                });
                tx
            });

        Self {
            tx,
            generation,
            current,
        }
    }

    pub fn default_command() -> &'static str {
        if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak"
        }
    }
}

/// Parks a freshly spawned utterance where `cancel` can reach it. The
/// generation is checked under the lock: a cancel that landed while the
/// process was starting kills it here instead.
fn hold_unless_cancelled(
    current: &Mutex<Option<Child>>,
    mut child: Child,
    job_generation: u64,
    generation: &AtomicU64,
) -> bool {
    match current.lock() {
        Ok(mut slot) if generation.load(Ordering::SeqCst) == job_generation => {
            *slot = Some(child);
            true
        }
        _ => {
            let _ = child.kill();
            let _ = child.wait();
            false
        }
    }
}

fn wait_for_current(current: &Mutex<Option<Child>>) {
    loop {
        let done = match current.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(child) => !matches!(child.try_wait(), Ok(None)),
                None => true,
            },
            Err(_) => true,
        };
        if done {
            if let Ok(mut slot) = current.lock() {
                *slot = None;
            }
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

impl Announcer for SpeechAnnouncer {
    fn announce(&mut self, text: &str) {
        log::debug!("announce: {text}");
        if let Some(tx) = &self.tx {
            let generation = self.generation.load(Ordering::SeqCst);
            // a dead worker only means speech is unavailable
            let _ = tx.send((generation, text.to_string()));
        }
    }

    fn chime(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.current.lock() {
            if let Some(mut child) = slot.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}

impl Drop for SpeechAnnouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
