//! Terminal capability surface so menu rendering never touches escape bytes directly.
//!
//! The menu core only speaks in named operations (move, text, style, clears,
//! scroll region). `vt100` turns those into bytes for a serial-attached device;
//! tests use a recording double instead.

pub mod input;
pub mod vt100;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;

/// Named control operations a character terminal must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermCommand {
    SetBold,
    SetNormal,
    SetReverse,
    ClearLine,
    ClearToEndOfLine,
    ClearToOrigin,
    MoveCursorOrigin,
    /// Move up one row, scrolling the region down when already at its top.
    MoveCursorUp,
    /// Move down one row, scrolling the region up when already at its bottom.
    MoveCursorDown,
    SaveCursor,
    RestoreCursor,
}

/// Keys the input parser recognizes by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Backspace,
    Delete,
}

impl Key {
    /// Navigation keys that a held-down key repeat can flood the queue with.
    #[must_use]
    pub fn is_repeatable_scroll(self) -> bool {
        matches!(self, Key::Up | Key::Down | Key::PageUp | Key::PageDown)
    }
}

/// One unit of user input as delivered by the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    /// Raw bytes: a lone CR, a lone LF, or a run of other bytes.
    Bytes(Vec<u8>),
    /// The host asked the session to stop (SIGINT).
    Interrupt,
}

/// Failure of the link to the terminal device. Never recoverable inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Io(String),
    Disconnected,
    Timeout,
    Unsupported(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "terminal I/O error: {msg}"),
            Self::Disconnected => write!(f, "terminal disconnected"),
            Self::Timeout => write!(f, "terminal did not answer in time"),
            Self::Unsupported(what) => write!(f, "unsupported terminal setting: {what}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type TermResult<T> = Result<T, TransportError>;

/// Capability set consumed by the menu core. Rows and columns are 1-based.
pub trait Terminal {
    fn columns(&self) -> usize;
    fn rows(&self) -> usize;

    fn move_cursor(&mut self, row: usize, col: usize) -> TermResult<()>;
    fn fetch_cursor(&mut self) -> TermResult<(usize, usize)>;
    fn send_text(&mut self, text: &str) -> TermResult<()>;
    fn send_command(&mut self, command: TermCommand) -> TermResult<()>;

    fn set_scroll_region(&mut self, top: usize, bottom: usize) -> TermResult<()>;
    fn clear_scroll_region(&mut self) -> TermResult<()>;
    fn set_auto_wrap(&mut self) -> TermResult<()>;
    fn clear_auto_wrap(&mut self) -> TermResult<()>;
    fn set_80_columns(&mut self) -> TermResult<()>;
    fn set_132_columns(&mut self) -> TermResult<()>;

    /// Block until the next input event arrives.
    fn recv_input(&mut self) -> TermResult<InputEvent>;
    /// Look at the next queued event without consuming it or blocking.
    fn peek_input(&mut self) -> TermResult<Option<InputEvent>>;

    fn reset(&mut self) -> TermResult<()>;
}

/// Scoped hold on the terminal's scroll region.
///
/// The region is set on acquire and cleared on [`ScrollRegion::release`]; if the
/// holder bails out early (transport error mid-redraw), `Drop` still clears it so
/// the title and status rows never inherit a stuck region.
pub struct ScrollRegion<'a> {
    term: &'a mut dyn Terminal,
    held: bool,
}

impl<'a> ScrollRegion<'a> {
    /// # Errors
    ///
    /// Returns the transport error if the region cannot be set.
    pub fn acquire(term: &'a mut dyn Terminal, top: usize, bottom: usize) -> TermResult<Self> {
        term.set_scroll_region(top, bottom)?;
        Ok(Self { term, held: true })
    }

    pub fn term(&mut self) -> &mut dyn Terminal {
        &mut *self.term
    }

    /// Clear the region, reporting failure to the caller.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the region cannot be cleared.
    pub fn release(mut self) -> TermResult<()> {
        self.held = false;
        self.term.clear_scroll_region()
    }
}

impl Drop for ScrollRegion<'_> {
    fn drop(&mut self) {
        if self.held {
            // Best effort: the link is usually already gone on this path.
            let _ = self.term.clear_scroll_region();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Op, RecordingTerminal};
    use super::*;

    #[test]
    fn scroll_region_release_clears_once() {
        let mut term = RecordingTerminal::new(80, 24);
        let region = ScrollRegion::acquire(&mut term, 3, 22).unwrap();
        region.release().unwrap();
        assert_eq!(
            term.ops,
            vec![Op::ScrollRegion(3, 22), Op::ClearScrollRegion]
        );
    }

    #[test]
    fn scroll_region_dropped_on_error_path_still_clears() {
        let mut term = RecordingTerminal::new(80, 24);
        term.fail_text_after(0);
        let result = (|| -> TermResult<()> {
            let mut region = ScrollRegion::acquire(&mut term, 3, 22)?;
            region.term().send_text("boom")?;
            region.release()
        })();
        assert_eq!(result, Err(TransportError::Disconnected));
        assert_eq!(term.ops.last(), Some(&Op::ClearScrollRegion));
    }

    #[test]
    fn repeatable_scroll_keys_exclude_editing_keys() {
        assert!(Key::Up.is_repeatable_scroll());
        assert!(Key::PageDown.is_repeatable_scroll());
        assert!(!Key::Left.is_repeatable_scroll());
        assert!(!Key::Backspace.is_repeatable_scroll());
    }

    #[test]
    fn transport_error_display_is_readable() {
        assert_eq!(
            TransportError::Io("EIO".to_string()).to_string(),
            "terminal I/O error: EIO"
        );
        assert_eq!(TransportError::Disconnected.to_string(), "terminal disconnected");
    }
}
