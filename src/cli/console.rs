// ============================================================
// Layer 1 — Interactive Training Console
// ============================================================
// With `train --interactive`, a background thread reads stdin
// and drives the run's control handle:
//
//   pause  | p   hold back the next training example
//   resume | r   continue with the next example
//   status | s   print run state and examples processed
//
// The thread is detached; it ends with the process or at EOF.
// A paused run is resumed when input ends.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crate::ml::control::{RunState, TrainingControl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Status,
    Unknown(String),
}

impl ConsoleCommand {
    /// None for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_ascii_lowercase();
        Some(match word.as_str() {
            ""              => return None,
            "pause"  | "p"  => Self::Pause,
            "resume" | "r"  => Self::Resume,
            "status" | "s"  => Self::Status,
            _               => Self::Unknown(word),
        })
    }

    /// Apply to `control` and return the line to show the user.
    pub fn apply(&self, control: &TrainingControl) -> String {
        match self {
            Self::Pause  => control.pause(),
            Self::Resume => control.resume(),
            Self::Status | Self::Unknown(_) => {}
        }
        match self {
            Self::Unknown(w) => format!("Unknown command '{w}' (pause, resume, status)"),
            _ => format!(
                "{:?}: {} examples processed",
                control.state(),
                control.examples_processed()
            ),
        }
    }
}

pub fn spawn_listener(control: TrainingControl) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("rbm-console".into())
        .spawn(move || {
            println!("Type 'pause', 'resume' or 'status' and press Enter.");
            run_listener(io::stdin().lock(), &control);
        })
}

fn run_listener<B: BufRead>(input: B, control: &TrainingControl) {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("Console input closed: {}", e);
                break;
            }
        };
        if let Some(cmd) = ConsoleCommand::parse(&line) {
            println!("{}", cmd.apply(control));
        }
    }
    if control.state() == RunState::Paused {
        tracing::info!("Console input ended; resuming training");
    }
    control.resume();
}
