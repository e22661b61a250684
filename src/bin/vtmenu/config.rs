//! CLI flag schema for the menu binary.

use clap::Parser;
use std::path::PathBuf;
use vtmenu::config::AppConfig;
use vtmenu::launcher::DEFAULT_SHELL;

pub(crate) const DEFAULT_TITLE: &str = "Main Menu";

#[derive(Debug, Parser, Clone)]
#[command(about = "Launcher menu for serial-attached VT-100 terminals", author, version)]
pub(crate) struct MenuConfig {
    #[command(flatten)]
    pub(crate) app: AppConfig,

    /// Title shown at the top of the menu (overrides the menu file)
    #[arg(long = "title")]
    pub(crate) title: Option<String>,

    /// Menu definition (TOML); defaults to $VTMENU_CONFIG_DIR/menu.toml or ~/.config/vtmenu/menu.toml
    #[arg(long = "settings")]
    pub(crate) settings: Option<PathBuf>,

    /// Shell invocation used to run selections; the command is appended as one argument
    #[arg(long = "shell", default_value = DEFAULT_SHELL)]
    pub(crate) shell: String,

    /// Print the menu as the terminal would show it and exit
    #[arg(long = "list", default_value_t = false)]
    pub(crate) list: bool,
}

impl MenuConfig {
    /// CLI title first, then the file's, then the default.
    pub(crate) fn resolve_title(&self, file_title: Option<&str>) -> String {
        self.title
            .as_deref()
            .or(file_title)
            .unwrap_or(DEFAULT_TITLE)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_precedence_is_cli_then_file_then_default() {
        let plain = MenuConfig::parse_from(["vtmenu"]);
        assert_eq!(plain.resolve_title(None), "Main Menu");
        assert_eq!(plain.resolve_title(Some("Lab")), "Lab");

        let titled = MenuConfig::parse_from(["vtmenu", "--title", "Ops"]);
        assert_eq!(titled.resolve_title(Some("Lab")), "Ops");
    }

    #[test]
    fn link_flags_flatten_into_app_config() {
        let config = MenuConfig::parse_from(["vtmenu", "--baud", "19200", "--list"]);
        assert_eq!(config.app.baud, 19200);
        assert!(config.list);
        assert_eq!(config.shell, "/bin/bash -c");
    }
}
