//! Input backends for macro replay.

use anyhow::Result;

/// Low-level input operations the replayer runs against.
///
/// Kept synchronous: the real backend drives the OS input queue and has no
/// async surface.
pub trait InputBackend {
    /// Moves the pointer and clicks at absolute screen coordinates.
    fn click(&mut self, x: i32, y: i32) -> Result<()>;

    /// Holds the leading keys and taps the last one, e.g. ctrl+v.
    fn hotkey(&mut self, keys: &[String]) -> Result<()>;

    /// Taps a single key.
    fn press(&mut self, key: &str) -> Result<()>;

    /// Current pointer position.
    fn cursor_position(&mut self) -> Result<(i32, i32)>;

    /// Primary display size.
    fn screen_size(&mut self) -> Result<(i32, i32)>;
}

#[cfg(feature = "input")]
pub use live::EnigoBackend;

#[cfg(feature = "input")]
mod live {
    use super::InputBackend;
    use anyhow::{anyhow, Context, Result};
    use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

    /// Real OS-level backend.
    pub struct EnigoBackend {
        enigo: Enigo,
    }

    impl EnigoBackend {
        pub fn new() -> Result<Self> {
            let enigo = Enigo::new(&Settings::default())
                .context("Failed to initialize the input backend")?;
            Ok(Self { enigo })
        }
    }

    fn parse_key(name: &str) -> Result<Key> {
        let key = match name.to_lowercase().as_str() {
            "ctrl" | "control" => Key::Control,
            "alt" => Key::Alt,
            "shift" => Key::Shift,
            "meta" | "win" | "cmd" => Key::Meta,
            "enter" | "return" => Key::Return,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "space" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "up" => Key::UpArrow,
            "down" => Key::DownArrow,
            "left" => Key::LeftArrow,
            "right" => Key::RightArrow,
            single if single.chars().count() == 1 => {
                Key::Unicode(single.chars().next().unwrap())
            }
            other => return Err(anyhow!("Unknown key name: {}", other)),
        };
        Ok(key)
    }

    impl InputBackend for EnigoBackend {
        fn click(&mut self, x: i32, y: i32) -> Result<()> {
            self.enigo
                .move_mouse(x, y, Coordinate::Abs)
                .with_context(|| format!("Failed to move pointer to ({}, {})", x, y))?;
            self.enigo
                .button(Button::Left, Direction::Click)
                .context("Failed to click")?;
            Ok(())
        }

        fn hotkey(&mut self, keys: &[String]) -> Result<()> {
            let parsed = keys.iter().map(|k| parse_key(k)).collect::<Result<Vec<_>>>()?;
            let Some((last, modifiers)) = parsed.split_last() else {
                return Ok(());
            };

            for key in modifiers {
                self.enigo.key(*key, Direction::Press).context("Failed to hold modifier")?;
            }
            let tapped = self.enigo.key(*last, Direction::Click);
            // Modifiers are always released, even when the tap failed
            for key in modifiers.iter().rev() {
                let _ = self.enigo.key(*key, Direction::Release);
            }
            tapped.context("Failed to tap key")?;
            Ok(())
        }

        fn press(&mut self, key: &str) -> Result<()> {
            self.enigo
                .key(parse_key(key)?, Direction::Click)
                .with_context(|| format!("Failed to press {}", key))?;
            Ok(())
        }

        fn cursor_position(&mut self) -> Result<(i32, i32)> {
            self.enigo.location().context("Failed to read the pointer position")
        }

        fn screen_size(&mut self) -> Result<(i32, i32)> {
            self.enigo.main_display().context("Failed to read the display size")
        }
    }

}
