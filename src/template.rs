//! Command templates: `$`-placeholder discovery, labels, and literal substitution.
//!
//! Syntax: `$$` is a literal dollar, `$*` takes every argument, `$<digits>`
//! takes one positional argument. Any other `$` is left as written, so shell
//! text like `${HOME}` needs no escaping.

use std::collections::{BTreeMap, HashMap};

/// Characters a supplied argument may not contain.
pub const DISALLOWED_CHARS: &[char] = &[';', '<', '>', '(', ')', '|', '&'];

#[must_use]
pub fn has_disallowed(value: &str) -> bool {
    value.contains(DISALLOWED_CHARS)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `$*`: all arguments joined by single spaces.
    Variadic,
    /// `$<digits>`, keeping the digits as written.
    Positional(String),
}

impl Placeholder {
    /// The template token, also the key used for label overrides.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::Variadic => "$*".to_string(),
            Self::Positional(digits) => format!("${digits}"),
        }
    }

    /// 1-based argument index; `None` for `$*`, `$0`, or digits out of range.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Variadic => None,
            Self::Positional(digits) => digits.parse::<usize>().ok().filter(|index| *index > 0),
        }
    }

    fn default_label(&self) -> String {
        match self {
            Self::Variadic => "TEXT".to_string(),
            Self::Positional(digits) => format!("PARAM{digits}"),
        }
    }

    fn sort_key(&self) -> (u8, u64) {
        match self {
            Self::Variadic => (1, 0),
            Self::Positional(digits) => (0, digits.parse().unwrap_or(u64::MAX)),
        }
    }
}

/// A placeholder plus the label users see in the menu and in errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub placeholder: Placeholder,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// One launchable menu entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    title: String,
    template: String,
    segments: Vec<Segment>,
    parameters: Vec<Parameter>,
}

impl Entry {
    /// Parse `template` once; `overrides` maps tokens like `"$1"` to labels.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        template: impl Into<String>,
        overrides: &BTreeMap<String, String>,
    ) -> Self {
        let template = template.into();
        let segments = parse_segments(&template);

        let mut parameters: Vec<Parameter> = Vec::new();
        for segment in &segments {
            let Segment::Slot(placeholder) = segment else {
                continue;
            };
            if parameters.iter().any(|param| &param.placeholder == placeholder) {
                continue;
            }
            let label = overrides
                .get(&placeholder.token())
                .cloned()
                .unwrap_or_else(|| placeholder.default_label());
            parameters.push(Parameter {
                placeholder: placeholder.clone(),
                label,
            });
        }

        Self {
            title: title.into(),
            template,
            segments,
            parameters,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Distinct placeholders in order of first appearance.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Labels in menu order: positionals by index, then the variadic one.
    #[must_use]
    pub fn display_labels(&self) -> Vec<&str> {
        let mut params: Vec<&Parameter> = self.parameters.iter().collect();
        params.sort_by_key(|param| param.placeholder.sort_key());
        params.iter().map(|param| param.label.as_str()).collect()
    }

    /// Menu line for selection number `number`.
    #[must_use]
    pub fn menu_line(&self, number: usize) -> String {
        let labels = self.display_labels();
        if labels.is_empty() {
            return format!("[!{number}] {}", self.title);
        }
        let labels: Vec<String> = labels.iter().map(|label| format!("<{label}>")).collect();
        format!("[!{number} {}] {}", labels.join(" "), self.title)
    }

    /// The command with `$$` unescaped and every placeholder filled from
    /// `values`. Values are inserted verbatim; a placeholder without a value
    /// is written back as its token.
    #[must_use]
    pub fn render(&self, values: &HashMap<Placeholder, String>) -> String {
        let mut out = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => match values.get(placeholder) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&placeholder.token()),
                },
            }
        }
        out
    }

    /// The command for an entry without placeholders.
    #[must_use]
    pub fn command(&self) -> String {
        self.render(&HashMap::new())
    }
}

fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            literal.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                literal.push('$');
            }
            Some('*') => {
                chars.next();
                flush_literal(&mut segments, &mut literal);
                segments.push(Segment::Slot(Placeholder::Variadic));
            }
            Some(digit) if digit.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                    digits.push(digit);
                }
                flush_literal(&mut segments, &mut literal);
                segments.push(Segment::Slot(Placeholder::Positional(digits)));
            }
            _ => literal.push('$'),
        }
    }
    flush_literal(&mut segments, &mut literal);
    segments
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}
