//! vtmenu entrypoint: load the menu, then serve it on a serial VT-100 until told to exit.
//!
//! The terminal is released while a selected program runs and reopened
//! afterwards, so the program may use the same serial line.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use vtmenu::host::{Host, SerialConnector};
use vtmenu::launcher::ShellLauncher;
use vtmenu::menu::menu_text;
use vtmenu::menu_file::{default_menu_path, load_menu_file, MenuFile, MenuFileError};
use vtmenu::wrap::word_wrap;
use vtmenu::{init_tracing, interrupt};

use crate::config::MenuConfig;

fn load_menu(config: &MenuConfig) -> Result<MenuFile> {
    if let Some(path) = &config.settings {
        return load_menu_file(path).with_context(|| format!("failed to load {}", path.display()));
    }
    let Some(path) = default_menu_path() else {
        tracing::warn!("no config directory; starting with an empty menu");
        return Ok(MenuFile::default());
    };
    match load_menu_file(&path) {
        Ok(file) => Ok(file),
        Err(MenuFileError::Io(err)) => {
            tracing::warn!(path = %path.display(), error = %err, "menu file unreadable; starting with an empty menu");
            Ok(MenuFile::default())
        }
        Err(err) => Err(err).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn print_menu(title: &str, text: &str, columns: usize) {
    println!("{title}");
    println!();
    for line in word_wrap(text, columns) {
        println!("{line}");
    }
}

fn main() -> Result<()> {
    let config = MenuConfig::parse();
    config.app.validate()?;
    init_tracing(&config.app);

    let file = load_menu(&config)?;
    let title = config.resolve_title(file.title.as_deref());
    let entries = file.to_entries();
    tracing::info!(entries = entries.len(), "menu loaded");

    if config.list {
        print_menu(&title, &menu_text(&entries), config.app.columns.columns());
        return Ok(());
    }

    let launcher = ShellLauncher::from_shell(&config.shell)?;
    interrupt::install_sigint_handler().context("failed to install SIGINT handler")?;
    let connector = SerialConnector::new(config.app.serial_settings(), config.app.rows());
    let mut host = Host::new(
        connector,
        launcher,
        config.app.retry_policy(),
        title,
        entries,
    )
    .with_columns(config.app.columns);
    host.run()
}
