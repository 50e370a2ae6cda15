//! Raw-mode terminal plumbing.

use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::debug;

use crate::history::{Key, KeySource};

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

impl Geometry {
    /// Queries the terminal, falling back to 80×24 when it cannot be read.
    pub fn detect() -> Self {
        match terminal::size() {
            Ok((width, height)) if width > 0 && height > 0 => Self { width, height },
            Ok(_) => Self::default(),
            Err(e) => {
                debug!("Terminal size unavailable, using 80x24: {e}");
                Self::default()
            }
        }
    }
}

/// Guard that puts the terminal into raw mode on an alternate screen and
/// restores it on drop.
pub struct TerminalGuard;

impl TerminalGuard {
    /// Enables raw mode and switches to the alternate screen.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = io::stdout().flush();
        let _ = disable_raw_mode();
    }
}

/// Keystrokes read from the terminal through crossterm's event queue.
///
/// Crossterm decodes the `ESC [ X` arrow sequences and UTF-8 input itself;
/// this source only maps its key codes onto [`Key`].
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<Key>> {
        match event::read()? {
            Event::Key(key_event) => Ok(key_from_event(key_event)),
            _ => Ok(None),
        }
    }
}

/// Maps one crossterm key event to a keystroke. Releases, repeats and
/// unbound keys map to `None`.
pub fn key_from_event(key_event: KeyEvent) -> Option<Key> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    match key_event.code {
        KeyCode::Char('c' | 'd') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Key::Interrupt)
        }
        KeyCode::Char(_) if key_event.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_is_80_by_24() {
        assert_eq!(
            Geometry::default(),
            Geometry {
                width: 80,
                height: 24
            }
        );
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_terminal_key_codes() {
        assert_eq!(key_from_event(press(KeyCode::Char('j'))), Some(Key::Char('j')));
        assert_eq!(key_from_event(press(KeyCode::Char('é'))), Some(Key::Char('é')));
        assert_eq!(
            key_from_event(KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(Key::Char('G'))
        );
        assert_eq!(key_from_event(press(KeyCode::Up)), Some(Key::Up));
        assert_eq!(key_from_event(press(KeyCode::Down)), Some(Key::Down));
        assert_eq!(key_from_event(press(KeyCode::Left)), Some(Key::Left));
        assert_eq!(key_from_event(press(KeyCode::Right)), Some(Key::Right));
        assert_eq!(key_from_event(press(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(key_from_event(press(KeyCode::Backspace)), Some(Key::Backspace));
        assert_eq!(key_from_event(press(KeyCode::F(1))), None);
    }

    #[test]
    fn control_c_and_d_interrupt() {
        for c in ['c', 'd'] {
            assert_eq!(
                key_from_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
                Some(Key::Interrupt)
            );
        }
        assert_eq!(
            key_from_event(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn key_releases_are_ignored() {
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('j'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(key_from_event(release), None);
    }
}
