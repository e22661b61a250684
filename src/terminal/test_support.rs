//! Recording terminal double shared by renderer, editor, and host tests.

use std::collections::VecDeque;

use super::{InputEvent, TermCommand, TermResult, Terminal, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Move(usize, usize),
    FetchCursor,
    Text(String),
    Command(TermCommand),
    ScrollRegion(usize, usize),
    ClearScrollRegion,
    AutoWrap(bool),
    Columns(usize),
    Reset,
}

#[derive(Debug)]
pub(crate) struct RecordingTerminal {
    pub(crate) ops: Vec<Op>,
    pub(crate) input: VecDeque<InputEvent>,
    columns: usize,
    rows: usize,
    cursor: (usize, usize),
    saved_cursor: (usize, usize),
    texts_until_failure: Option<usize>,
}

impl RecordingTerminal {
    pub(crate) fn new(columns: usize, rows: usize) -> Self {
        Self {
            ops: Vec::new(),
            input: VecDeque::new(),
            columns,
            rows,
            cursor: (1, 1),
            saved_cursor: (1, 1),
            texts_until_failure: None,
        }
    }

    pub(crate) fn with_input(mut self, events: impl IntoIterator<Item = InputEvent>) -> Self {
        self.input.extend(events);
        self
    }

    /// Let `count` more `send_text` calls succeed, then report a lost link.
    pub(crate) fn fail_text_after(&mut self, count: usize) {
        self.texts_until_failure = Some(count);
    }

    /// Concatenation of every text chunk sent so far.
    pub(crate) fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, wanted: &Op) -> usize {
        self.ops.iter().filter(|op| *op == wanted).count()
    }

    pub(crate) fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Terminal for RecordingTerminal {
    fn columns(&self) -> usize {
        self.columns
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn move_cursor(&mut self, row: usize, col: usize) -> TermResult<()> {
        self.cursor = (row, col);
        self.ops.push(Op::Move(row, col));
        Ok(())
    }

    fn fetch_cursor(&mut self) -> TermResult<(usize, usize)> {
        self.ops.push(Op::FetchCursor);
        Ok(self.cursor)
    }

    fn send_text(&mut self, text: &str) -> TermResult<()> {
        if let Some(remaining) = self.texts_until_failure.as_mut() {
            if *remaining == 0 {
                return Err(TransportError::Disconnected);
            }
            *remaining -= 1;
        }
        self.ops.push(Op::Text(text.to_string()));
        Ok(())
    }

    fn send_command(&mut self, command: TermCommand) -> TermResult<()> {
        match command {
            TermCommand::SaveCursor => self.saved_cursor = self.cursor,
            TermCommand::RestoreCursor => self.cursor = self.saved_cursor,
            TermCommand::MoveCursorOrigin => self.cursor = (1, 1),
            _ => {}
        }
        self.ops.push(Op::Command(command));
        Ok(())
    }

    fn set_scroll_region(&mut self, top: usize, bottom: usize) -> TermResult<()> {
        self.ops.push(Op::ScrollRegion(top, bottom));
        Ok(())
    }

    fn clear_scroll_region(&mut self) -> TermResult<()> {
        self.ops.push(Op::ClearScrollRegion);
        Ok(())
    }

    fn set_auto_wrap(&mut self) -> TermResult<()> {
        self.ops.push(Op::AutoWrap(true));
        Ok(())
    }

    fn clear_auto_wrap(&mut self) -> TermResult<()> {
        self.ops.push(Op::AutoWrap(false));
        Ok(())
    }

    fn set_80_columns(&mut self) -> TermResult<()> {
        self.columns = 80;
        self.ops.push(Op::Columns(80));
        Ok(())
    }

    fn set_132_columns(&mut self) -> TermResult<()> {
        self.columns = 132;
        self.ops.push(Op::Columns(132));
        Ok(())
    }

    fn recv_input(&mut self) -> TermResult<InputEvent> {
        self.input.pop_front().ok_or(TransportError::Disconnected)
    }

    fn peek_input(&mut self) -> TermResult<Option<InputEvent>> {
        Ok(self.input.front().cloned())
    }

    fn reset(&mut self) -> TermResult<()> {
        self.ops.push(Op::Reset);
        Ok(())
    }
}
