//! Host loop: connect, run a menu session, launch selections, reconnect on loss.
//!
//! A session owns the terminal and the menu state; nothing survives into the
//! next session except the chosen column mode. Transport failures end the
//! session with an error value and the loop reconnects from scratch.

use std::fs::File;
use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::action::Action;
use crate::config::ColumnMode;
use crate::interrupt;
use crate::launcher::Launcher;
use crate::menu::Menu;
use crate::serial::SerialSettings;
use crate::template::Entry;
use crate::terminal::vt100::Vt100Terminal;
use crate::terminal::{InputEvent, TermResult, Terminal, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// First contact, or coming back after a launched program.
    Connecting,
    Active,
    /// The previous session lost the terminal.
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Consecutive failures allowed before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Opens a fresh terminal for each session.
pub trait Connector {
    type Term: Terminal;

    /// # Errors
    ///
    /// Returns a transport error if the terminal cannot be reached.
    fn connect(&mut self, columns: ColumnMode) -> TermResult<Self::Term>;
}

pub struct SerialConnector {
    settings: SerialSettings,
    rows: usize,
}

impl SerialConnector {
    #[must_use]
    pub fn new(settings: SerialSettings, rows: usize) -> Self {
        Self { settings, rows }
    }
}

impl Connector for SerialConnector {
    type Term = Vt100Terminal<File>;

    fn connect(&mut self, columns: ColumnMode) -> TermResult<Self::Term> {
        Vt100Terminal::open(&self.settings, columns.columns(), self.rows)
    }
}

/// How a healthy session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Run this command, then reconnect.
    Run(String),
    Exit,
}

/// Drive one connected session until it asks to run something or exit.
///
/// # Errors
///
/// Returns the transport error that ended the session.
pub fn run_session(
    term: &mut dyn Terminal,
    columns: &mut ColumnMode,
    title: &str,
    entries: &[Entry],
) -> TermResult<SessionEnd> {
    let mut menu = Menu::new();
    menu.display_menu(term, title, entries)?;

    loop {
        let event = term.recv_input()?;
        if let InputEvent::Key(key) = &event {
            // Drop queued repeats so a held arrow key cannot outrun the redraws.
            if key.is_repeatable_scroll() {
                while term.peek_input()?.as_ref() == Some(&event) {
                    term.recv_input()?;
                }
            }
        }

        let Some(action) = menu.process_input(term, &event)? else {
            continue;
        };
        match action {
            Action::Null => {}
            Action::Select(command) => {
                menu.display_error(term, "Loading requested program...")?;
                return Ok(SessionEnd::Run(command));
            }
            Action::Exit => return Ok(SessionEnd::Exit),
            Action::Setting { name, value } => {
                apply_setting(term, &mut menu, columns, title, entries, &name, value.as_deref())?;
            }
        }
    }
}

fn apply_setting(
    term: &mut dyn Terminal,
    menu: &mut Menu,
    columns: &mut ColumnMode,
    title: &str,
    entries: &[Entry],
    name: &str,
    value: Option<&str>,
) -> TermResult<()> {
    if name != "cols" && name != "columns" {
        return menu.display_error(term, &format!("Unrecognized setting {name}"));
    }
    let wanted = match value {
        Some("80") => ColumnMode::Normal,
        Some("132") => ColumnMode::Wide,
        other => {
            let shown = other.unwrap_or_default();
            return menu.display_error(term, &format!("Unrecognized column setting {shown}"));
        }
    };
    if term.columns() == wanted.columns() {
        return menu.clear_input(term);
    }

    match wanted {
        ColumnMode::Normal => term.set_80_columns()?,
        ColumnMode::Wide => term.set_132_columns()?,
    }
    *columns = wanted;
    tracing::info!(columns = wanted.columns(), "column mode changed");
    menu.display_menu(term, title, entries)
}

/// Owns the connect/session/launch cycle for the lifetime of the process.
pub struct Host<C: Connector, L: Launcher> {
    connector: C,
    launcher: L,
    policy: RetryPolicy,
    title: String,
    entries: Vec<Entry>,
    columns: ColumnMode,
    state: LinkState,
    progress: Box<dyn Write>,
}

impl<C: Connector, L: Launcher> Host<C, L> {
    pub fn new(
        connector: C,
        launcher: L,
        policy: RetryPolicy,
        title: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            connector,
            launcher,
            policy,
            title: title.into(),
            entries,
            columns: ColumnMode::default(),
            state: LinkState::Connecting,
            progress: Box::new(std::io::stdout()),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: ColumnMode) -> Self {
        self.columns = columns;
        self
    }

    /// Where host-side progress text goes (stdout by default).
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn Write>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Run until the user exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal stays unreachable for longer than the
    /// retry policy allows.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut term = self.connect()?;
            self.state = LinkState::Active;
            tracing::info!(columns = self.columns.columns(), "session started");

            match run_session(&mut term, &mut self.columns, &self.title, &self.entries) {
                Ok(SessionEnd::Exit) => {
                    self.say("Got request to end session!\n");
                    if let Err(err) = term.reset() {
                        tracing::warn!(error = %err, "terminal reset failed on exit");
                    }
                    tracing::info!("session ended by user");
                    return Ok(());
                }
                Ok(SessionEnd::Run(command)) => {
                    // Release the device before the program runs.
                    drop(term);
                    self.state = LinkState::Connecting;
                    match self.launcher.launch(&command) {
                        Ok(status) if !status.success() => {
                            tracing::warn!(command = %command, code = ?status.code(), "selection exited with failure");
                        }
                        Ok(_) => {}
                        Err(err) => tracing::warn!(command = %command, error = %err, "selection failed to launch"),
                    }
                    // A Ctrl-C meant for the program must not end the menu.
                    if interrupt::take_interrupt() {
                        tracing::debug!("discarded interrupt raised while selection ran");
                    }
                }
                Err(err) => {
                    self.note_lost_link(&err);
                }
            }
        }
    }

    fn note_lost_link(&mut self, err: &TransportError) {
        tracing::warn!(error = %err, "terminal lost, reconnecting");
        self.say("Lost terminal, will attempt a reconnect.\n");
        self.state = LinkState::Reconnecting;
    }

    fn connect(&mut self) -> Result<C::Term> {
        self.say("Attempting to contact VT-100...");
        let mut failures: u32 = 0;
        loop {
            match self.connector.connect(self.columns) {
                Ok(term) => {
                    self.say("SUCCESS!\n");
                    return Ok(term);
                }
                Err(err) => {
                    failures += 1;
                    tracing::debug!(attempt = failures, error = %err, "connect attempt failed");
                    if self.policy.max_attempts.is_some_and(|max| failures >= max) {
                        self.say("\n");
                        bail!("terminal unreachable after {failures} attempts: {err}");
                    }
                    thread::sleep(self.policy.delay);
                    self.say(".");
                }
            }
        }
    }

    fn say(&mut self, text: &str) {
        // Progress output is advisory; a closed stdout must not stop the menu.
        let _ = self.progress.write_all(text.as_bytes());
        let _ = self.progress.flush();
    }
}
