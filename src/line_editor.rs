//! Single-line input buffer with a movable cursor and minimal reverse-video echo.

use crate::terminal::{TermCommand, TermResult, Terminal};

/// Input buffer plus 1-based cursor in `[1, len + 1]`.
///
/// Every mutation echoes only what changed: the cursor move, the shifted
/// suffix, or one blank cell. The row is supplied per call because the host
/// asks the terminal where the input line is.
#[derive(Debug, Clone)]
pub struct LineEditor {
    buffer: String,
    cursor: usize,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 1,
        }
    }

    #[must_use]
    pub fn line(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Forget the buffer without touching the screen.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 1;
    }

    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn move_left(&mut self, term: &mut dyn Terminal, row: usize) -> TermResult<()> {
        if self.cursor > 1 {
            self.cursor -= 1;
            term.move_cursor(row, self.cursor)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn move_right(&mut self, term: &mut dyn Terminal, row: usize) -> TermResult<()> {
        if self.cursor <= self.buffer.len() {
            self.cursor += 1;
            term.move_cursor(row, self.cursor)?;
        }
        Ok(())
    }

    /// Remove the character before the cursor.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn backspace(&mut self, term: &mut dyn Terminal, row: usize) -> TermResult<()> {
        if self.cursor == 1 {
            return Ok(());
        }
        self.buffer.remove(self.cursor - 2);
        self.cursor -= 1;

        term.move_cursor(row, self.cursor)?;
        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::SetReverse)?;
        // Trailing blank erases the cell the suffix just vacated.
        let suffix = &self.buffer[self.cursor - 1..];
        term.send_text(&format!("{suffix} "))?;
        term.move_cursor(row, self.cursor)
    }

    /// Insert printable bytes at the cursor. Control bytes are dropped, and
    /// an insertion that would overflow `columns - 1` is refused whole.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn insert(&mut self, term: &mut dyn Terminal, row: usize, bytes: &[u8]) -> TermResult<()> {
        let text: String = bytes
            .iter()
            .filter(|byte| (0x20..0x7f).contains(*byte))
            .map(|&byte| char::from(byte))
            .collect();
        if text.is_empty() {
            return Ok(());
        }
        let capacity = term.columns().saturating_sub(1);
        if self.buffer.len() + text.len() > capacity {
            tracing::debug!(
                len = self.buffer.len(),
                rejected = text.len(),
                capacity,
                "input line full, insertion dropped"
            );
            return Ok(());
        }

        let spot = self.cursor - 1;
        self.buffer.insert_str(spot, &text);
        self.cursor += text.len();

        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::SetReverse)?;
        term.send_text(&self.buffer[spot..])?;
        term.move_cursor(row, self.cursor)
    }
}
