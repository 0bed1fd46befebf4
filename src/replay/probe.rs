//! Cursor probe: reports the pointer position after a countdown, for
//! calibrating macro click coordinates.

use crate::replay::InputBackend;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

/// Waits out a countdown, then reads and returns the pointer position.
pub fn capture<B: InputBackend>(backend: &mut B, countdown_secs: u64) -> Result<(i32, i32)> {
    info!("Hover the pointer over the target");
    for remaining in (1..=countdown_secs).rev() {
        info!("Capturing in {}...", remaining);
        std::thread::sleep(Duration::from_secs(1));
    }

    let (x, y) = backend.cursor_position()?;
    info!("Pointer at ({}, {})", x, y);
    Ok((x, y))
}
