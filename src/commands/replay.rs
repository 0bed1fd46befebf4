//! Macro replay and cursor probe commands. Only built with the `input`
//! feature, which pulls in the OS input backend.

use crate::replay::backend::EnigoBackend;
use crate::replay::{probe, MacroScript, Replayer};
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

/// Replays a recorded macro script.
pub struct ReplayCommand;

impl ReplayCommand {
    /// Loads and runs the script. Returns the number of completed
    /// iterations.
    pub async fn execute(script_path: &Path, repetitions: Option<u32>) -> Result<u32> {
        let mut script = MacroScript::from_file(script_path)?;
        if let Some(repetitions) = repetitions {
            script.repetitions = repetitions;
        }
        info!(
            "Replaying {} ({} steps, {} iterations)",
            script_path.display(),
            script.steps.len(),
            script.repetitions
        );

        // The backend blocks on OS input calls, so the run leaves the
        // async runtime
        let outcome = tokio::task::spawn_blocking(move || {
            let backend = EnigoBackend::new()?;
            Replayer::new(backend).run(&script)
        })
        .await??;

        if let Some(stop) = &outcome.stop {
            warn!(
                "Stopped by the corner failsafe at ({}, {}) during iteration {}",
                stop.x, stop.y, stop.iteration
            );
        }
        info!("{} iterations completed", outcome.completed_iterations);
        Ok(outcome.completed_iterations)
    }
}

/// Prints the pointer position after a countdown.
pub struct ProbeCommand;

impl ProbeCommand {
    pub async fn execute(countdown_secs: u64) -> Result<(i32, i32)> {
        tokio::task::spawn_blocking(move || {
            let mut backend = EnigoBackend::new()?;
            probe::capture(&mut backend, countdown_secs)
        })
        .await?
    }
}
