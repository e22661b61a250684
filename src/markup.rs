//! Inline link styling: bracketed spans render bold, nested runs toggle once.

use crate::terminal::{TermCommand, TermResult, Terminal};

/// Bold state the scan wants versus what the terminal currently shows.
///
/// Style commands are only sent when text is about to be printed and the two
/// differ, so back-to-back links never emit a normal/bold pair between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleState {
    pub requested: bool,
    pub active: bool,
}

/// Line-at-a-time bracket scanner carrying link depth across lines.
#[derive(Debug, Default)]
pub struct MarkupScanner {
    depth: usize,
    style: StyleState,
}

impl MarkupScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn style(&self) -> StyleState {
        self.style
    }

    /// Scan one line, updating depth and style. Text is transmitted only when
    /// `out` is present; hidden lines are scanned with `None`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn scan_line(&mut self, line: &str, mut out: Option<&mut dyn Terminal>) -> TermResult<()> {
        let mut rest = line;
        while !rest.is_empty() {
            rest = match (rest.find('['), rest.find(']')) {
                (None, None) => {
                    self.emit(&mut out, rest)?;
                    ""
                }
                (Some(open), None) => self.open_run(&mut out, rest, open)?,
                (None, Some(close)) => self.close_run(&mut out, rest, close)?,
                (Some(open), Some(close)) if close < open => {
                    self.close_run(&mut out, rest, close)?
                }
                (Some(open), Some(close)) if rest[open + 1..close].contains('[') => {
                    self.open_run(&mut out, rest, open)?
                }
                (Some(open), Some(close)) => {
                    // Self-contained pair: styled, but the carried depth is untouched.
                    self.emit(&mut out, &rest[..open])?;
                    if self.depth == 0 {
                        self.style.requested = true;
                    }
                    self.emit(&mut out, &rest[open..=close])?;
                    if self.depth == 0 {
                        self.style.requested = false;
                    }
                    &rest[close + 1..]
                }
            };
        }
        Ok(())
    }

    /// Return the terminal to normal video if the last printed text was bold.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn finish(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        if self.style.active {
            term.send_command(TermCommand::SetNormal)?;
            self.style.active = false;
        }
        Ok(())
    }

    fn open_run<'s>(
        &mut self,
        out: &mut Option<&mut dyn Terminal>,
        rest: &'s str,
        open: usize,
    ) -> TermResult<&'s str> {
        self.emit(out, &rest[..open])?;
        self.depth += 1;
        if self.depth == 1 {
            self.style.requested = true;
        }
        self.emit(out, "[")?;
        Ok(&rest[open + 1..])
    }

    fn close_run<'s>(
        &mut self,
        out: &mut Option<&mut dyn Terminal>,
        rest: &'s str,
        close: usize,
    ) -> TermResult<&'s str> {
        self.emit(out, &rest[..=close])?;
        if self.depth == 1 {
            self.style.requested = false;
        }
        // A stray `]` outside any link leaves depth at zero.
        self.depth = self.depth.saturating_sub(1);
        Ok(&rest[close + 1..])
    }

    fn emit(&mut self, out: &mut Option<&mut dyn Terminal>, text: &str) -> TermResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let Some(term) = out.as_deref_mut() else {
            return Ok(());
        };
        if self.style.active != self.style.requested {
            let command = if self.style.requested {
                TermCommand::SetBold
            } else {
                TermCommand::SetNormal
            };
            term.send_command(command)?;
            self.style.active = self.style.requested;
        }
        term.send_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::test_support::{Op, RecordingTerminal};

    fn marked(term: &RecordingTerminal) -> String {
        term.ops
            .iter()
            .map(|op| match op {
                Op::Text(text) => text.clone(),
                Op::Command(TermCommand::SetBold) => "<b>".to_string(),
                Op::Command(TermCommand::SetNormal) => "</b>".to_string(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    fn render(lines: &[&str]) -> String {
        let mut term = RecordingTerminal::new(80, 24);
        let mut scanner = MarkupScanner::new();
        for line in lines {
            scanner.scan_line(line, Some(&mut term)).unwrap();
        }
        scanner.finish(&mut term).unwrap();
        marked(&term)
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render(&["no links here"]), "no links here");
    }

    #[test]
    fn simple_link_is_bold() {
        assert_eq!(render(&["x [link] y"]), "x <b>[link]</b> y");
    }

    #[test]
    fn nested_brackets_toggle_only_on_outermost() {
        assert_eq!(render(&["[a[b]c] end"]), "<b>[a[b]c]</b> end");
    }

    #[test]
    fn link_spanning_lines_carries_depth() {
        assert_eq!(
            render(&["see [multi", "line] done"]),
            "see <b>[multiline]</b> done"
        );
    }

    #[test]
    fn adjacent_links_do_not_flicker_style() {
        assert_eq!(render(&["[a][b] c"]), "<b>[a][b]</b> c");
    }

    #[test]
    fn stray_close_bracket_does_not_go_negative() {
        let mut scanner = MarkupScanner::new();
        scanner.scan_line("a] b", None).unwrap();
        assert_eq!(scanner.depth(), 0);
        assert_eq!(render(&["a] [b]"]), "a] <b>[b]</b>");
    }

    #[test]
    fn hidden_lines_update_state_without_output() {
        let mut term = RecordingTerminal::new(80, 24);
        let mut scanner = MarkupScanner::new();
        scanner.scan_line("open [here", None).unwrap();
        assert_eq!(scanner.depth(), 1);
        assert!(term.ops.is_empty());
        scanner.scan_line("still] x", Some(&mut term)).unwrap();
        assert_eq!(marked(&term), "<b>still]</b> x");
        assert_eq!(scanner.depth(), 0);
    }
}
