//! Byte-to-event parsing so key handling never sees raw escape sequences.
//!
//! Only the handful of sequences a VT-100/VT-220 keyboard sends are named;
//! anything else in escape form is dropped rather than interpreted.

use super::{InputEvent, Key};

const ESC: u8 = 0x1b;
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;

/// Parser output: user input, or a cursor-position report answering DSR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Event(InputEvent),
    CursorReport { row: usize, col: usize },
}

#[derive(Debug, Default)]
pub struct InputParser {
    pending: Vec<u8>,
}

impl InputParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an escape sequence is waiting for more bytes.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn consume_bytes(&mut self, bytes: &[u8], out: &mut Vec<Inbound>) {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(bytes);

        let mut run: Vec<u8> = Vec::new();
        let mut idx = 0;
        while idx < buf.len() {
            let byte = buf[idx];
            match byte {
                ESC => {
                    flush_run(&mut run, out);
                    match parse_escape(&buf[idx..]) {
                        Escape::Incomplete => {
                            self.pending = buf[idx..].to_vec();
                            return;
                        }
                        Escape::Parsed { len, inbound } => {
                            if let Some(inbound) = inbound {
                                out.push(inbound);
                            }
                            idx += len;
                        }
                    }
                    continue;
                }
                b'\r' | b'\n' => {
                    flush_run(&mut run, out);
                    out.push(Inbound::Event(InputEvent::Bytes(vec![byte])));
                }
                BS => {
                    flush_run(&mut run, out);
                    out.push(Inbound::Event(InputEvent::Key(Key::Backspace)));
                }
                DEL => {
                    flush_run(&mut run, out);
                    out.push(Inbound::Event(InputEvent::Key(Key::Delete)));
                }
                _ => run.push(byte),
            }
            idx += 1;
        }
        flush_run(&mut run, out);
    }

    /// Give up on a half-received escape sequence after the line went idle.
    pub fn flush_pending(&mut self, out: &mut Vec<Inbound>) {
        if self.pending == [ESC] {
            // A bare ESC keypress; the editor discards control bytes anyway.
            out.push(Inbound::Event(InputEvent::Bytes(vec![ESC])));
        } else if !self.pending.is_empty() {
            tracing::debug!(bytes = ?self.pending, "dropping incomplete escape sequence");
        }
        self.pending.clear();
    }
}

fn flush_run(run: &mut Vec<u8>, out: &mut Vec<Inbound>) {
    if !run.is_empty() {
        out.push(Inbound::Event(InputEvent::Bytes(std::mem::take(run))));
    }
}

enum Escape {
    Incomplete,
    Parsed { len: usize, inbound: Option<Inbound> },
}

/// Parse one escape sequence at the start of `buf` (which begins with ESC).
fn parse_escape(buf: &[u8]) -> Escape {
    let Some(&introducer) = buf.get(1) else {
        return Escape::Incomplete;
    };
    match introducer {
        b'[' => parse_csi(buf),
        b'O' => match buf.get(2) {
            None => Escape::Incomplete,
            Some(&fin) => Escape::Parsed {
                len: 3,
                inbound: cursor_key(fin).map(|key| Inbound::Event(InputEvent::Key(key))),
            },
        },
        // ESC followed by anything else: deliver the ESC alone, keep the rest.
        _ => Escape::Parsed {
            len: 1,
            inbound: Some(Inbound::Event(InputEvent::Bytes(vec![ESC]))),
        },
    }
}

fn parse_csi(buf: &[u8]) -> Escape {
    for (offset, &byte) in buf.iter().enumerate().skip(2) {
        match byte {
            0x30..=0x3f => continue,
            0x40..=0x7e => {
                let params = &buf[2..offset];
                return Escape::Parsed {
                    len: offset + 1,
                    inbound: csi_inbound(params, byte),
                };
            }
            _ => {
                // Malformed; drop what we have and resume at the offending byte.
                tracing::debug!(bytes = ?&buf[..offset], "dropping malformed CSI sequence");
                return Escape::Parsed {
                    len: offset,
                    inbound: None,
                };
            }
        }
    }
    Escape::Incomplete
}

fn cursor_key(fin: u8) -> Option<Key> {
    match fin {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    }
}

fn csi_inbound(params: &[u8], fin: u8) -> Option<Inbound> {
    let key = match fin {
        b'~' => match params {
            b"1" | b"7" => Some(Key::Home),
            b"4" | b"8" => Some(Key::End),
            b"5" => Some(Key::PageUp),
            b"6" => Some(Key::PageDown),
            b"3" => Some(Key::Delete),
            _ => None,
        },
        b'R' => return parse_cursor_report(params),
        _ if params.is_empty() => cursor_key(fin),
        _ => None,
    };
    if key.is_none() {
        tracing::debug!(params = ?params, fin, "ignoring unrecognized CSI sequence");
    }
    key.map(|key| Inbound::Event(InputEvent::Key(key)))
}

fn parse_cursor_report(params: &[u8]) -> Option<Inbound> {
    let text = std::str::from_utf8(params).ok()?;
    let (row, col) = text.split_once(';')?;
    Some(Inbound::CursorReport {
        row: row.parse().ok()?,
        col: col.parse().ok()?,
    })
}
