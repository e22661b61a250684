//! Menu screen: title row, scrolling entry list, status row and input row.

use crate::action::Action;
use crate::line_editor::LineEditor;
use crate::resolver::resolve;
use crate::template::Entry;
use crate::terminal::{InputEvent, Key, TermCommand, TermResult, Terminal};
use crate::viewport::{NullPane, Pane, TextPane};

const PREAMBLE: &str = "The following programs are available. To run, type \"!\" followed by the selection number and press enter.";

/// First row of the scrolling band; rows 1-2 hold the title.
const PANE_TOP: usize = 3;

/// Menu text shown in the viewport for `entries`.
#[must_use]
pub fn menu_text(entries: &[Entry]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| entry.menu_line(index + 1))
        .collect();
    format!("{PREAMBLE}\n\n{}", lines.join("\n"))
}

/// Per-session screen state. Rebuilt from scratch after every reconnect.
pub struct Menu {
    editor: LineEditor,
    pane: Box<dyn Pane>,
    options: Vec<Entry>,
    last_error: String,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            editor: LineEditor::new(),
            pane: Box::new(NullPane),
            options: Vec::new(),
            last_error: String::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &[Entry] {
        &self.options
    }

    /// Text currently on the status row.
    #[must_use]
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    #[must_use]
    pub fn input(&self) -> &LineEditor {
        &self.editor
    }

    /// Repaint the whole screen for `entries` and park the cursor on the input row.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn display_menu(
        &mut self,
        term: &mut dyn Terminal,
        title: &str,
        entries: &[Entry],
    ) -> TermResult<()> {
        self.clear_input(term)?;

        let rows = term.rows();
        term.move_cursor(rows.saturating_sub(2).max(1), 1)?;
        term.send_command(TermCommand::ClearLine)?;
        term.send_command(TermCommand::ClearToOrigin)?;
        term.send_command(TermCommand::MoveCursorOrigin)?;

        // The title may run onto row 2.
        term.set_auto_wrap()?;
        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::SetBold)?;
        term.send_text(title)?;
        term.send_command(TermCommand::SetNormal)?;
        term.clear_auto_wrap()?;

        self.options = entries.to_vec();
        let mut pane = TextPane::new(PANE_TOP, rows.saturating_sub(2));
        pane.display_text(term, &menu_text(&self.options))?;
        self.pane = Box::new(pane);
        tracing::debug!(entries = self.options.len(), columns = term.columns(), "menu displayed");

        term.move_cursor(rows, 1)
    }

    /// Blank the status row and the input row, and empty the buffer.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn clear_input(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        self.display_error(term, "")?;
        self.clear_input_row(term)
    }

    /// Empty the buffer and blank the input row, leaving the status row alone.
    fn clear_input_row(&mut self, term: &mut dyn Terminal) -> TermResult<()> {
        term.move_cursor(term.rows(), 1)?;
        term.send_command(TermCommand::SaveCursor)?;
        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::SetReverse)?;
        term.send_text(&" ".repeat(term.columns()))?;
        term.send_command(TermCommand::RestoreCursor)?;
        self.editor.clear();
        Ok(())
    }

    /// Show `error` on the status row unless it is already showing.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn display_error(&mut self, term: &mut dyn Terminal, error: &str) -> TermResult<()> {
        if error == self.last_error {
            return Ok(());
        }
        term.send_command(TermCommand::SaveCursor)?;
        term.move_cursor(term.rows().saturating_sub(1).max(1), 1)?;
        term.send_command(TermCommand::ClearLine)?;
        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::SetBold)?;
        term.send_text(error)?;
        term.send_command(TermCommand::SetNormal)?;
        term.send_command(TermCommand::RestoreCursor)?;
        self.last_error = error.to_string();
        Ok(())
    }

    /// Apply one input event. Returns an action only for a submitted line
    /// that resolved or for an interrupt.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from the terminal.
    pub fn process_input(
        &mut self,
        term: &mut dyn Terminal,
        event: &InputEvent,
    ) -> TermResult<Option<Action>> {
        match event {
            InputEvent::Interrupt => return Ok(Some(Action::Exit)),
            InputEvent::Key(Key::Up) => self.pane.scroll_up(term)?,
            InputEvent::Key(Key::Down) => self.pane.scroll_down(term)?,
            InputEvent::Key(Key::PageUp) => self.pane.page_up(term)?,
            InputEvent::Key(Key::PageDown) => self.pane.page_down(term)?,
            InputEvent::Key(Key::Home) => self.pane.go_to_top(term)?,
            InputEvent::Key(Key::End) => self.pane.go_to_bottom(term)?,
            InputEvent::Key(Key::Left) => {
                let (row, _) = term.fetch_cursor()?;
                self.editor.move_left(term, row)?;
            }
            InputEvent::Key(Key::Right) => {
                let (row, _) = term.fetch_cursor()?;
                self.editor.move_right(term, row)?;
            }
            InputEvent::Key(Key::Backspace | Key::Delete) => {
                let (row, _) = term.fetch_cursor()?;
                self.editor.backspace(term, row)?;
            }
            InputEvent::Bytes(bytes) if bytes.as_slice() == b"\r" => {}
            InputEvent::Bytes(bytes) if bytes.as_slice() == b"\n" => return self.submit(term),
            InputEvent::Bytes(bytes) => {
                let (row, _) = term.fetch_cursor()?;
                self.editor.insert(term, row, bytes)?;
            }
        }
        Ok(None)
    }

    fn submit(&mut self, term: &mut dyn Terminal) -> TermResult<Option<Action>> {
        let line = self.editor.line().trim().to_string();
        if line.is_empty() {
            return Ok(None);
        }
        self.clear_input_row(term)?;

        match resolve(&line, self.pane.as_mut(), &self.options) {
            Ok(action) => {
                tracing::debug!(input = %line, ?action, "input resolved");
                self.display_error(term, "")?;
                Ok(Some(action))
            }
            Err(err) => {
                tracing::debug!(input = %line, error = %err, "input rejected");
                self.display_error(term, &err.to_string())?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::test_support::{Op, RecordingTerminal};
    use std::collections::BTreeMap;

    fn entries(count: usize) -> Vec<Entry> {
        (1..=count)
            .map(|n| Entry::new(format!("Program {n}"), format!("prog{n}"), &BTreeMap::new()))
            .collect()
    }

    fn shown(count: usize) -> (Menu, RecordingTerminal) {
        let mut term = RecordingTerminal::new(80, 24);
        let mut menu = Menu::new();
        menu.display_menu(&mut term, "Main Menu", &entries(count)).unwrap();
        term.clear();
        (menu, term)
    }

    fn type_line(menu: &mut Menu, term: &mut RecordingTerminal, text: &str) -> Option<Action> {
        menu.process_input(term, &InputEvent::Bytes(text.as_bytes().to_vec()))
            .unwrap();
        menu.process_input(term, &InputEvent::Bytes(b"\n".to_vec())).unwrap()
    }

    #[test]
    fn menu_text_lists_entries_after_preamble() {
        let name = BTreeMap::from([("$1".to_string(), "HOST".to_string())]);
        let list = vec![
            Entry::new("Editor", "vi", &BTreeMap::new()),
            Entry::new("Remote", "ssh $1 $*", &name),
        ];
        assert_eq!(
            menu_text(&list),
            format!("{PREAMBLE}\n\n[!1] Editor\n[!2 <HOST> <TEXT>] Remote")
        );
    }

    #[test]
    fn display_menu_paints_title_band_and_input_row() {
        let mut term = RecordingTerminal::new(80, 24);
        let mut menu = Menu::new();
        menu.display_menu(&mut term, "Main Menu", &entries(2)).unwrap();

        let title_at = term
            .ops
            .iter()
            .position(|op| *op == Op::Text("Main Menu".to_string()))
            .unwrap();
        assert_eq!(term.ops[title_at - 3], Op::AutoWrap(true));
        assert_eq!(term.ops[title_at - 1], Op::Command(TermCommand::SetBold));
        assert_eq!(term.ops[title_at + 2], Op::AutoWrap(false));
        assert!(term.ops.contains(&Op::ScrollRegion(3, 22)));
        assert!(term.ops.contains(&Op::Text(" ".repeat(80))));
        assert!(term.text().contains("[!2] Program 2"));
        assert_eq!(term.ops.last(), Some(&Op::Move(24, 1)));
        assert_eq!(menu.options().len(), 2);
    }

    #[test]
    fn status_line_is_not_resent_when_unchanged() {
        let (mut menu, mut term) = shown(2);
        menu.display_error(&mut term, "Oops").unwrap();
        let sent = term.ops.len();
        assert!(term.ops.contains(&Op::Move(23, 1)));
        menu.display_error(&mut term, "Oops").unwrap();
        assert_eq!(term.ops.len(), sent);
        assert_eq!(menu.last_error(), "Oops");
    }

    #[test]
    fn selection_returns_command_and_clears_input() {
        let (mut menu, mut term) = shown(3);
        let action = type_line(&mut menu, &mut term, "!2");
        assert_eq!(action, Some(Action::Select("prog2".to_string())));
        assert!(menu.input().is_empty());
        assert_eq!(menu.input().cursor(), 1);
    }

    #[test]
    fn rejected_line_shows_error_and_clears_input() {
        let (mut menu, mut term) = shown(3);
        assert_eq!(type_line(&mut menu, &mut term, "!9"), None);
        assert_eq!(menu.last_error(), "Unknown menu option!");
        assert!(menu.input().is_empty());
        assert!(term.ops.contains(&Op::Text("Unknown menu option!".to_string())));
    }

    #[test]
    fn repeated_rejection_sends_error_once() {
        let (mut menu, mut term) = shown(1);
        let error = Op::Text("Unknown menu option!".to_string());
        assert_eq!(type_line(&mut menu, &mut term, "!9"), None);
        assert_eq!(type_line(&mut menu, &mut term, "!9"), None);
        assert_eq!(term.ops.iter().filter(|op| **op == error).count(), 1);
        assert!(!term.ops.contains(&Op::Text(String::new())));
        assert!(menu.input().is_empty());
    }

    #[test]
    fn accepted_line_blanks_a_stale_error() {
        let (mut menu, mut term) = shown(2);
        type_line(&mut menu, &mut term, "!9");
        term.clear();
        let action = type_line(&mut menu, &mut term, "!1");
        assert_eq!(action, Some(Action::Select("prog1".to_string())));
        assert_eq!(menu.last_error(), "");
        assert!(term.ops.contains(&Op::Text(String::new())));
    }

    #[test]
    fn blank_submission_is_a_noop() {
        let (mut menu, mut term) = shown(3);
        assert_eq!(type_line(&mut menu, &mut term, "   "), None);
        assert_eq!(menu.input().line(), "   ");
        assert_eq!(menu.last_error(), "");
    }

    #[test]
    fn carriage_return_is_ignored() {
        let (mut menu, mut term) = shown(3);
        let action = menu
            .process_input(&mut term, &InputEvent::Bytes(b"\r".to_vec()))
            .unwrap();
        assert_eq!(action, None);
        assert!(term.ops.is_empty());
    }

    #[test]
    fn return_key_pair_submits_once() {
        let (mut menu, mut term) = shown(3);
        menu.process_input(&mut term, &InputEvent::Bytes(b"!3".to_vec()))
            .unwrap();
        let cr = menu
            .process_input(&mut term, &InputEvent::Bytes(b"\r".to_vec()))
            .unwrap();
        let lf = menu
            .process_input(&mut term, &InputEvent::Bytes(b"\n".to_vec()))
            .unwrap();
        assert_eq!(cr, None);
        assert_eq!(lf, Some(Action::Select("prog3".to_string())));
    }

    #[test]
    fn editing_echoes_on_the_input_row() {
        let (mut menu, mut term) = shown(3);
        menu.display_error(&mut term, "Oops").unwrap();
        term.clear();
        menu.process_input(&mut term, &InputEvent::Bytes(b"ab".to_vec()))
            .unwrap();
        menu.process_input(&mut term, &InputEvent::Key(Key::Left)).unwrap();
        menu.process_input(&mut term, &InputEvent::Key(Key::Backspace))
            .unwrap();
        assert_eq!(menu.input().line(), "b");
        assert!(term.ops.contains(&Op::Move(24, 3)));
        assert!(term.ops.contains(&Op::Move(24, 1)));
    }

    #[test]
    fn navigation_keys_scroll_the_entry_list() {
        let (mut menu, mut term) = shown(40);
        menu.process_input(&mut term, &InputEvent::Key(Key::Down)).unwrap();
        assert!(term.ops.contains(&Op::Command(TermCommand::MoveCursorDown)));

        term.clear();
        menu.process_input(&mut term, &InputEvent::Key(Key::End)).unwrap();
        assert!(term.text().contains("[!40] Program 40"));

        term.clear();
        menu.process_input(&mut term, &InputEvent::Key(Key::Home)).unwrap();
        assert!(term.text().starts_with("The following programs"));
    }

    #[test]
    fn interrupt_exits() {
        let (mut menu, mut term) = shown(1);
        assert_eq!(
            menu.process_input(&mut term, &InputEvent::Interrupt).unwrap(),
            Some(Action::Exit)
        );
    }

    #[test]
    fn navigation_before_any_menu_is_inert() {
        let mut term = RecordingTerminal::new(80, 24);
        let mut menu = Menu::new();
        menu.process_input(&mut term, &InputEvent::Key(Key::Down)).unwrap();
        assert!(term.ops.is_empty());
    }
}
