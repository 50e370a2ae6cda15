//! Keystroke decoding and chord dispatch.

use std::io::{self, Read};

use crate::history::{Direction, SearchKind};

const ESC: u8 = 0x1b;

/// One logical keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Arrow up (`ESC [ A`).
    Up,
    /// Arrow down (`ESC [ B`).
    Down,
    /// Arrow right (`ESC [ C`).
    Right,
    /// Arrow left (`ESC [ D`).
    Left,
    /// Carriage return or line feed.
    Enter,
    /// Delete or backspace.
    Backspace,
    /// Ctrl-C or Ctrl-D.
    Interrupt,
}

/// Blocking source of keystrokes.
pub trait KeySource {
    /// Reads the next keystroke.
    ///
    /// `Ok(None)` means the bytes read did not decode to a key and should be
    /// ignored. End of input is reported as an `UnexpectedEof` error.
    fn next_key(&mut self) -> io::Result<Option<Key>>;
}

/// Decodes keystrokes from a raw byte stream.
///
/// This is the wire protocol every [`KeySource`] honours: printable bytes and
/// UTF-8 characters are keys, `ESC [ A`..`ESC [ D` are arrows, CR/LF is
/// Enter and DEL/BS is Backspace. A malformed sequence yields `None` for that
/// keystroke only; a byte that cannot continue a UTF-8 character is kept for
/// the next read.
#[derive(Debug)]
pub struct KeyDecoder<R> {
    reader: R,
    pending: Option<u8>,
}

impl<R: Read> KeyDecoder<R> {
    /// Wraps `reader`, which must deliver bytes unbuffered by line.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
        }
    }

    fn byte(&mut self) -> io::Result<u8> {
        if let Some(byte) = self.pending.take() {
            return Ok(byte);
        }
        let mut buf = [0_u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn escape(&mut self) -> io::Result<Option<Key>> {
        if self.byte()? != b'[' {
            return Ok(None);
        }
        Ok(match self.byte()? {
            b'A' => Some(Key::Up),
            b'B' => Some(Key::Down),
            b'C' => Some(Key::Right),
            b'D' => Some(Key::Left),
            _ => None,
        })
    }

    fn utf8(&mut self, first: u8) -> io::Result<Option<Key>> {
        let width = match first {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(None),
        };
        let mut buf = [first, 0, 0, 0];
        for slot in &mut buf[1..width] {
            let byte = self.byte()?;
            if byte & 0xc0 != 0x80 {
                self.pending = Some(byte);
                return Ok(None);
            }
            *slot = byte;
        }
        Ok(std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char))
    }
}

impl<R: Read> KeySource for KeyDecoder<R> {
    fn next_key(&mut self) -> io::Result<Option<Key>> {
        let byte = self.byte()?;
        match byte {
            ESC => self.escape(),
            b'\r' | b'\n' | 0 => Ok(Some(Key::Enter)),
            0x7f | 0x08 => Ok(Some(Key::Backspace)),
            0x03 | 0x04 => Ok(Some(Key::Interrupt)),
            0x20..=0x7e => Ok(Some(Key::Char(char::from(byte)))),
            0x80..=0xff => self.utf8(byte),
            _ => Ok(None),
        }
    }
}

/// What a keystroke asks the browser to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `k` or up arrow.
    CursorUp,
    /// `j` or down arrow.
    CursorDown,
    /// Single `g`: top of the visible window.
    WindowTop,
    /// Single `G`: bottom of the visible window.
    WindowBottom,
    /// `gg`: newest commit overall.
    HistoryTop,
    /// `GG`: oldest commit overall.
    HistoryBottom,
    /// `h`/`l` or left/right arrow. Checks out another branch.
    SwitchBranch(Direction),
    /// `m`/`M`/`c`/`C`.
    Search(SearchKind, Direction),
    /// Enter: commit details popup.
    ShowDetails,
    /// `b`: branch list popup.
    BranchList,
    /// `f`: filter editor.
    EditFilter,
    /// `?`: key binding reference.
    Help,
    /// `q`, Ctrl-C or Ctrl-D.
    Quit,
    /// Unbound key.
    Ignore,
}

/// Maps keystrokes to actions, recognizing `gg` and `GG`.
///
/// The only state is the previous `g`/`G` keystroke. There is no timeout: a
/// second `g` completes the chord however late it arrives, as long as no
/// other key came in between.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_char: Option<char>,
}

impl Dispatcher {
    /// Creates a dispatcher with no pending chord.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending chord character, if any.
    pub fn pending(&self) -> Option<char> {
        self.last_char
    }

    /// Translates one keystroke.
    pub fn dispatch(&mut self, key: Key) -> Action {
        let previous = self.last_char.take();

        let Key::Char(c) = key else {
            return match key {
                Key::Up => Action::CursorUp,
                Key::Down => Action::CursorDown,
                Key::Left => Action::SwitchBranch(Direction::Previous),
                Key::Right => Action::SwitchBranch(Direction::Next),
                Key::Enter => Action::ShowDetails,
                Key::Interrupt => Action::Quit,
                Key::Backspace | Key::Char(_) => Action::Ignore,
            };
        };

        match c {
            'g' | 'G' if previous == Some(c) => {
                if c == 'g' {
                    Action::HistoryTop
                } else {
                    Action::HistoryBottom
                }
            }
            'g' => {
                self.last_char = Some(c);
                Action::WindowTop
            }
            'G' => {
                self.last_char = Some(c);
                Action::WindowBottom
            }
            'j' => Action::CursorDown,
            'k' => Action::CursorUp,
            'h' => Action::SwitchBranch(Direction::Previous),
            'l' => Action::SwitchBranch(Direction::Next),
            'm' => Action::Search(SearchKind::Merge, Direction::Next),
            'M' => Action::Search(SearchKind::Merge, Direction::Previous),
            'c' => Action::Search(SearchKind::Conflict, Direction::Next),
            'C' => Action::Search(SearchKind::Conflict, Direction::Previous),
            'b' => Action::BranchList,
            'f' => Action::EditFilter,
            '?' => Action::Help,
            'q' => Action::Quit,
            _ => Action::Ignore,
        }
    }
}
