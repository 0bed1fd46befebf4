//! Fixed-coordinate macro replay.
//!
//! Replays a recorded sequence of clicks and key chords against whatever
//! window currently has focus. Coordinates are opaque calibration data tied
//! to one screen layout; scripts live in TOML files next to the crate.
//!
//! A corner failsafe is checked before every step: slamming the pointer into
//! any screen corner stops the run cleanly instead of letting it keep
//! clicking through the wrong window.

pub mod backend;
pub mod probe;

pub use backend::InputBackend;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One step of a recorded macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    /// Click at fixed screen coordinates.
    Click {
        x: i32,
        y: i32,
        /// What this click targets, for the log.
        #[serde(default)]
        label: Option<String>,
    },
    /// Key chord, e.g. `["ctrl", "v"]`.
    Hotkey { keys: Vec<String> },
    /// Single key press.
    Press { key: String },
    /// Fixed pause in milliseconds.
    Sleep { ms: u64 },
}

fn default_repetitions() -> u32 {
    1
}

fn default_warmup_secs() -> u64 {
    9
}

fn default_step_pause_ms() -> u64 {
    500
}

/// A recorded macro: timing parameters plus the step sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroScript {
    /// How many times to run the whole sequence.
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,

    /// Countdown before the first step, to focus the target window.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Pause after every step.
    #[serde(default = "default_step_pause_ms")]
    pub step_pause_ms: u64,

    pub steps: Vec<Step>,
}

impl MacroScript {
    /// Loads a script from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read macro script: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse macro script: {}", path.display()))
    }
}

/// Where and when the failsafe tripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailsafeStop {
    pub x: i32,
    pub y: i32,
    /// 1-based iteration that was interrupted.
    pub iteration: u32,
}

/// Result of a replay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Iterations that ran to completion.
    pub completed_iterations: u32,
    pub stop: Option<FailsafeStop>,
}

impl ReplayOutcome {
    pub fn stopped(&self) -> bool {
        self.stop.is_some()
    }
}

/// True when the pointer sits within `margin` pixels of any screen corner.
fn corner_hit(pos: (i32, i32), screen: (i32, i32), margin: i32) -> bool {
    let (x, y) = pos;
    let (w, h) = screen;
    let near_x = x <= margin || x >= w - 1 - margin;
    let near_y = y <= margin || y >= h - 1 - margin;
    near_x && near_y
}

/// Drives an [`InputBackend`] through a [`MacroScript`].
pub struct Replayer<B: InputBackend> {
    backend: B,
    failsafe_margin: i32,
}

impl<B: InputBackend> Replayer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, failsafe_margin: 10 }
    }

    pub fn with_failsafe_margin(mut self, margin: i32) -> Self {
        self.failsafe_margin = margin;
        self
    }

    /// Runs the script. The failsafe is consulted before every step; a trip
    /// is a normal outcome, not an error.
    pub fn run(&mut self, script: &MacroScript) -> Result<ReplayOutcome> {
        if script.warmup_secs > 0 {
            info!("Focus the target window now");
            for remaining in (1..=script.warmup_secs).rev() {
                info!("Starting in {}...", remaining);
                std::thread::sleep(Duration::from_secs(1));
            }
        }

        let step_pause = Duration::from_millis(script.step_pause_ms);
        for iteration in 1..=script.repetitions {
            for step in &script.steps {
                if let Some(stop) = self.failsafe_check(iteration)? {
                    return Ok(ReplayOutcome {
                        completed_iterations: iteration - 1,
                        stop: Some(stop),
                    });
                }
                self.apply(step)?;
                if !step_pause.is_zero() {
                    std::thread::sleep(step_pause);
                }
            }
            info!("Iteration {}/{} complete", iteration, script.repetitions);
        }

        Ok(ReplayOutcome { completed_iterations: script.repetitions, stop: None })
    }

    fn failsafe_check(&mut self, iteration: u32) -> Result<Option<FailsafeStop>> {
        let pos = self.backend.cursor_position()?;
        let screen = self.backend.screen_size()?;
        if corner_hit(pos, screen, self.failsafe_margin) {
            warn!(
                "Failsafe: pointer in a screen corner at ({}, {}), stopping",
                pos.0, pos.1
            );
            return Ok(Some(FailsafeStop { x: pos.0, y: pos.1, iteration }));
        }
        Ok(None)
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Click { x, y, label } => {
                match label {
                    Some(label) => debug!("Click ({}, {}): {}", x, y, label),
                    None => debug!("Click ({}, {})", x, y),
                }
                self.backend.click(*x, *y)
            }
            Step::Hotkey { keys } => {
                debug!("Hotkey {}", keys.join("+"));
                self.backend.hotkey(keys)
            }
            Step::Press { key } => {
                debug!("Press {}", key);
                self.backend.press(key)
            }
            Step::Sleep { ms } => {
                debug!("Sleep {}ms", ms);
                std::thread::sleep(Duration::from_millis(*ms));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Records every input event and serves scripted cursor positions.
    #[derive(Default)]
    pub struct MockBackend {
        pub events: Vec<String>,
        pub positions: VecDeque<(i32, i32)>,
    }

    impl MockBackend {
        pub fn centered() -> Self {
            Self { events: Vec::new(), positions: VecDeque::new() }
        }
    }

    impl InputBackend for MockBackend {
        fn click(&mut self, x: i32, y: i32) -> Result<()> {
            self.events.push(format!("click {} {}", x, y));
            Ok(())
        }

        fn hotkey(&mut self, keys: &[String]) -> Result<()> {
            self.events.push(format!("hotkey {}", keys.join("+")));
            Ok(())
        }

        fn press(&mut self, key: &str) -> Result<()> {
            self.events.push(format!("press {}", key));
            Ok(())
        }

        fn cursor_position(&mut self) -> Result<(i32, i32)> {
            // Defaults to screen center once scripted positions run out
            Ok(self.positions.pop_front().unwrap_or((960, 540)))
        }

        fn screen_size(&mut self) -> Result<(i32, i32)> {
            Ok((1920, 1080))
        }
    }

    fn instant_script(repetitions: u32, steps: Vec<Step>) -> MacroScript {
        MacroScript { repetitions, warmup_secs: 0, step_pause_ms: 0, steps }
    }

    #[test]
    fn test_script_parses_from_toml() {
        let toml = r#"
            repetitions = 20

            [[steps]]
            action = "click"
            x = 431
            y = 560
            label = "message box"

            [[steps]]
            action = "hotkey"
            keys = ["ctrl", "v"]

            [[steps]]
            action = "press"
            key = "enter"

            [[steps]]
            action = "sleep"
            ms = 250
        "#;

        let script: MacroScript = toml::from_str(toml).unwrap();
        assert_eq!(script.repetitions, 20);
        // Timing defaults apply when unset
        assert_eq!(script.warmup_secs, 9);
        assert_eq!(script.step_pause_ms, 500);
        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[0],
            Step::Click { x: 431, y: 560, label: Some("message box".into()) }
        );
        assert_eq!(script.steps[1], Step::Hotkey { keys: vec!["ctrl".into(), "v".into()] });
        assert_eq!(script.steps[2], Step::Press { key: "enter".into() });
        assert_eq!(script.steps[3], Step::Sleep { ms: 250 });
    }

    #[test]
    fn test_replay_executes_steps_in_order() {
        let script = instant_script(
            2,
            vec![
                Step::Click { x: 100, y: 200, label: None },
                Step::Hotkey { keys: vec!["ctrl".into(), "v".into()] },
                Step::Press { key: "enter".into() },
            ],
        );

        let mut replayer = Replayer::new(MockBackend::centered());
        let outcome = replayer.run(&script).unwrap();

        assert_eq!(outcome.completed_iterations, 2);
        assert!(!outcome.stopped());
        assert_eq!(
            replayer.backend.events,
            vec![
                "click 100 200",
                "hotkey ctrl+v",
                "press enter",
                "click 100 200",
                "hotkey ctrl+v",
                "press enter",
            ]
        );
    }

    #[test]
    fn test_failsafe_stops_mid_iteration() {
        let script = instant_script(
            3,
            vec![
                Step::Click { x: 100, y: 200, label: None },
                Step::Press { key: "enter".into() },
            ],
        );

        let mut backend = MockBackend::centered();
        // First iteration runs clean; the corner hit lands before the
        // second step of iteration two
        backend.positions = VecDeque::from(vec![(500, 500), (500, 500), (500, 500), (3, 1075)]);

        let mut replayer = Replayer::new(backend);
        let outcome = replayer.run(&script).unwrap();

        assert_eq!(outcome.completed_iterations, 1);
        assert_eq!(outcome.stop, Some(FailsafeStop { x: 3, y: 1075, iteration: 2 }));
        // The interrupted step was never applied
        assert_eq!(
            replayer.backend.events,
            vec!["click 100 200", "press enter", "click 100 200"]
        );
    }

    #[test]
    fn test_corner_detection() {
        let screen = (1920, 1080);
        assert!(corner_hit((0, 0), screen, 10));
        assert!(corner_hit((1919, 0), screen, 10));
        assert!(corner_hit((0, 1079), screen, 10));
        assert!(corner_hit((1915, 1075), screen, 10));
        assert!(!corner_hit((960, 540), screen, 10));
        // Edge midpoints are not corners
        assert!(!corner_hit((960, 0), screen, 10));
        assert!(!corner_hit((0, 540), screen, 10));
    }

    #[test]
    fn test_script_without_steps_completes_immediately() {
        let script = instant_script(5, Vec::new());
        let outcome = Replayer::new(MockBackend::centered()).run(&script).unwrap();
        assert_eq!(outcome.completed_iterations, 5);
        assert!(!outcome.stopped());
    }
}
