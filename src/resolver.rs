//! Command language: `!N [args...]` selects an entry, `set name[=value]` changes a setting.

use std::collections::HashMap;
use std::fmt;
use std::num::{IntErrorKind, ParseIntError};

use crate::action::Action;
use crate::template::{has_disallowed, Entry, Placeholder};
use crate::viewport::Pane;

/// A submitted line that could not be turned into an action.
///
/// `Display` is the exact status-line text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    UnknownOption,
    TakesNoParameters,
    MissingParameter { label: String },
    InvalidValue { label: String, value: String },
    InvalidLinkRequest,
    NoSetting,
    Unrecognized(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOption => write!(f, "Unknown menu option!"),
            Self::TakesNoParameters => write!(f, "Option does not take parameters!"),
            Self::MissingParameter { label } => write!(f, "Option requires parameter {label}"),
            Self::InvalidValue { label, value } => {
                write!(f, "Parameter {label} cannot take value {value}")
            }
            Self::InvalidLinkRequest => write!(f, "Invalid link navigation request!"),
            Self::NoSetting => write!(f, "No setting requested!"),
            Self::Unrecognized(text) => write!(f, "Unrecognized command {text}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Interpret one submitted line.
///
/// The active pane sees the line first and may claim it. Blank input resolves
/// to [`Action::Null`].
///
/// # Errors
///
/// Returns an [`InputError`] describing why the line was rejected.
pub fn resolve(text: &str, pane: &mut dyn Pane, options: &[Entry]) -> Result<Action, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Action::Null);
    }
    if let Some(action) = pane.process_input(text) {
        return Ok(action);
    }

    if let Some(request) = text.strip_prefix('!') {
        return resolve_selection(request, options);
    }
    if text == "set" || text.starts_with("set ") {
        return resolve_setting(text);
    }
    Err(InputError::Unrecognized(text.to_string()))
}

fn resolve_selection(request: &str, options: &[Entry]) -> Result<Action, InputError> {
    let tokens: Vec<&str> = request.split_whitespace().collect();
    let number: i64 = tokens
        .first()
        .ok_or(InputError::InvalidLinkRequest)?
        .parse()
        .map_err(|err: ParseIntError| match err.kind() {
            // Numeric but huge: still a number, just not one on the menu.
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => InputError::UnknownOption,
            _ => InputError::InvalidLinkRequest,
        })?;
    let entry = usize::try_from(number)
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| options.get(index))
        .ok_or(InputError::UnknownOption)?;

    if entry.parameters().is_empty() {
        if tokens.len() != 1 {
            return Err(InputError::TakesNoParameters);
        }
        return Ok(Action::Select(entry.command()));
    }

    let mut values: HashMap<Placeholder, String> = HashMap::new();
    for param in entry.parameters() {
        let value = match &param.placeholder {
            Placeholder::Variadic => tokens[1..].join(" "),
            positional => positional
                .index()
                .and_then(|index| tokens.get(index))
                .map(|token| (*token).to_string())
                .ok_or_else(|| InputError::MissingParameter {
                    label: param.label.clone(),
                })?,
        };
        if has_disallowed(&value) {
            return Err(InputError::InvalidValue {
                label: param.label.clone(),
                value,
            });
        }
        values.insert(param.placeholder.clone(), value);
    }
    Ok(Action::Select(entry.render(&values)))
}

fn resolve_setting(text: &str) -> Result<Action, InputError> {
    let (_, setting) = text.split_once(' ').ok_or(InputError::NoSetting)?;
    let action = match setting.split_once('=') {
        Some((name, value)) => Action::setting(name.trim(), Some(value.trim())),
        None => Action::setting(setting.trim(), None),
    };
    Ok(action)
}
