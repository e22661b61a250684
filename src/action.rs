//! Resolved outcome of one submitted input line, consumed by the host loop.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Handled entirely by the menu; nothing for the host to do.
    Null,
    /// Run this shell command line, then come back to the menu.
    Select(String),
    Exit,
    Setting {
        name: String,
        value: Option<String>,
    },
}

impl Action {
    #[must_use]
    pub fn setting(name: impl Into<String>, value: Option<&str>) -> Self {
        Self::Setting {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}
