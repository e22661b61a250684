//! Scrollable text band between the title and status rows.
//!
//! Redraws are bandwidth-aware: single-line scrolls shift the band with the
//! terminal's scroll region and draw only the exposed line, page and jump
//! moves repaint the band, and nothing outside `[top, bottom]` is touched.

use crate::action::Action;
use crate::markup::MarkupScanner;
use crate::terminal::{ScrollRegion, TermCommand, TermResult, Terminal};
use crate::wrap::word_wrap;

/// Navigation and input hook shared by every kind of viewport.
///
/// The defaults are the inert base variant: nothing scrolls and no input is
/// claimed.
pub trait Pane {
    fn scroll_up(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    fn scroll_down(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    fn page_up(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    fn page_down(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    fn go_to_top(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    fn go_to_bottom(&mut self, _term: &mut dyn Terminal) -> TermResult<()> {
        Ok(())
    }

    /// Offer a submitted line to the pane before the menu interprets it.
    fn process_input(&mut self, _text: &str) -> Option<Action> {
        None
    }
}

/// Pane with no content; used before the first menu is shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPane;

impl Pane for NullPane {}

/// Word-wrapped, link-styled text paged through a fixed band of rows.
#[derive(Debug, Clone)]
pub struct TextPane {
    top: usize,
    bottom: usize,
    lines: Vec<String>,
    offset: usize,
}

impl TextPane {
    /// Band covering rows `top..=bottom` (1-based, inclusive).
    #[must_use]
    pub fn new(top: usize, bottom: usize) -> Self {
        let top = top.max(1);
        Self {
            top,
            bottom: bottom.max(top),
            lines: Vec::new(),
            offset: 0,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.bottom - self.top + 1
    }

    /// Index of the first visible line.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Clamp a requested first line into `[0, max(0, total - rows)]`.
    #[must_use]
    pub fn bounds_enforce(&self, line: isize) -> usize {
        let max_offset = self.lines.len().saturating_sub(self.rows());
        usize::try_from(line).map_or(0, |line| line.min(max_offset))
    }

    /// Replace the content, jump to the top and repaint the whole band.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn display_text(&mut self, term: &mut dyn Terminal, text: &str) -> TermResult<()> {
        self.lines = word_wrap(text, term.columns());
        self.offset = 0;
        tracing::debug!(lines = self.lines.len(), rows = self.rows(), "viewport text replaced");

        let mut region = ScrollRegion::acquire(term, self.top, self.bottom)?;
        region.term().move_cursor(self.top, 1)?;
        self.draw(region.term(), 0, self.rows(), true)?;
        region.release()
    }

    fn jump_to(&mut self, term: &mut dyn Terminal, line: isize) -> TermResult<()> {
        let line = self.bounds_enforce(line);
        if line == self.offset {
            return Ok(());
        }
        self.offset = line;

        term.send_command(TermCommand::SaveCursor)?;
        term.send_command(TermCommand::SetNormal)?;
        let mut region = ScrollRegion::acquire(term, self.top, self.bottom)?;
        region.term().move_cursor(self.top, 1)?;
        self.draw(region.term(), self.offset, self.offset + self.rows(), true)?;
        region.release()?;
        term.send_command(TermCommand::RestoreCursor)
    }

    fn page_step(&self) -> isize {
        isize::try_from(self.rows().saturating_sub(1)).unwrap_or(isize::MAX)
    }

    fn offset_isize(&self) -> isize {
        isize::try_from(self.offset).unwrap_or(isize::MAX)
    }

    /// Render lines `[start, end)` starting at the current cursor position.
    ///
    /// Every buffered line before `start` is scanned silently so link depth
    /// is always derived from the text, whichever window is being drawn.
    fn draw(&self, term: &mut dyn Terminal, start: usize, end: usize, wipe: bool) -> TermResult<()> {
        let columns = term.columns();
        let rows = self.rows();
        let last = (self.offset + rows).min(self.lines.len()).min(end);
        let mut scanner = MarkupScanner::new();
        let mut displayed = 0;

        for (index, line) in self.lines[..last].iter().enumerate() {
            if index < start {
                scanner.scan_line(line, None)?;
                continue;
            }
            scanner.scan_line(line, Some(&mut *term))?;
            displayed += 1;
            if wipe && line.chars().count() < columns {
                term.send_command(TermCommand::ClearToEndOfLine)?;
            }
            // Never newline past the last target row: that would scroll the band.
            if index + 1 != end {
                term.send_text("\n")?;
            }
        }

        if wipe {
            let target = end.saturating_sub(start);
            while displayed < target {
                term.send_command(TermCommand::ClearLine)?;
                if displayed + 1 < rows {
                    term.send_text("\n")?;
                }
                displayed += 1;
            }
        }
        scanner.finish(term)
    }
}

impl Pane for TextPane {
    fn scroll_up(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        if self.offset == 0 {
            return Ok(());
        }
        self.offset -= 1;

        term.send_command(TermCommand::SaveCursor)?;
        term.send_command(TermCommand::SetNormal)?;
        let mut region = ScrollRegion::acquire(term, self.top, self.bottom)?;
        region.term().move_cursor(self.top, 1)?;
        region.term().send_command(TermCommand::MoveCursorUp)?;
        self.draw(region.term(), self.offset, self.offset + 1, false)?;
        region.release()?;
        term.send_command(TermCommand::RestoreCursor)
    }

    fn scroll_down(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        if self.offset + self.rows() >= self.lines.len() {
            return Ok(());
        }
        self.offset += 1;

        term.send_command(TermCommand::SaveCursor)?;
        term.send_command(TermCommand::SetNormal)?;
        let mut region = ScrollRegion::acquire(term, self.top, self.bottom)?;
        region.term().move_cursor(self.bottom, 1)?;
        region.term().send_command(TermCommand::MoveCursorDown)?;
        let exposed = self.offset + self.rows() - 1;
        self.draw(region.term(), exposed, exposed + 1, false)?;
        region.release()?;
        term.send_command(TermCommand::RestoreCursor)
    }

    fn page_up(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        let line = self.offset_isize().saturating_sub(self.page_step());
        self.jump_to(term, line)
    }

    fn page_down(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        let line = self.offset_isize().saturating_add(self.page_step());
        self.jump_to(term, line)
    }

    fn go_to_top(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        self.jump_to(term, 0)
    }

    fn go_to_bottom(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        let max_offset = self.lines.len().saturating_sub(self.rows());
        self.jump_to(term, isize::try_from(max_offset).unwrap_or(isize::MAX))
    }
}
