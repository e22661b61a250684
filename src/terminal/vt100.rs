//! VT-100 byte encoding and input thread for a serial-attached terminal.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::input::{Inbound, InputParser};
use super::{InputEvent, TermCommand, TermResult, Terminal, TransportError};
use crate::interrupt;
use crate::serial::{self, SerialSettings};

const SET_BOLD: &[u8] = b"\x1b[1m";
const SET_NORMAL: &[u8] = b"\x1b[0m";
const SET_REVERSE: &[u8] = b"\x1b[7m";
const CLEAR_LINE: &[u8] = b"\x1b[2K";
const CLEAR_TO_EOL: &[u8] = b"\x1b[K";
const CLEAR_TO_ORIGIN: &[u8] = b"\x1b[1J";
const CURSOR_HOME: &[u8] = b"\x1b[H";
// Index / reverse index: plain moves, except at a region edge where they scroll.
const REVERSE_INDEX: &[u8] = b"\x1bM";
const INDEX: &[u8] = b"\x1bD";
const SAVE_CURSOR: &[u8] = b"\x1b7";
const RESTORE_CURSOR: &[u8] = b"\x1b8";
const CLEAR_REGION: &[u8] = b"\x1b[r";
const WRAP_ENABLE: &[u8] = b"\x1b[?7h";
const WRAP_DISABLE: &[u8] = b"\x1b[?7l";
const COLUMNS_80: &[u8] = b"\x1b[?3l";
const COLUMNS_132: &[u8] = b"\x1b[?3h";
const FULL_RESET: &[u8] = b"\x1bc";
// LNM: Return sends CR LF, so a submitted line always ends in LF.
const NEWLINE_MODE: &[u8] = b"\x1b[20h";
const REQUEST_CURSOR: &[u8] = b"\x1b[6n";

/// Max pending inbound messages before the reader thread blocks.
const INPUT_CHANNEL_CAPACITY: usize = 256;
const INPUT_POLL_MS: u64 = 100;
const IDLE_READ_SLEEP_MS: u64 = 10;
const CURSOR_REPORT_TIMEOUT: Duration = Duration::from_secs(2);
const READER_JOIN_TIMEOUT_MS: u64 = 200;
const THREAD_JOIN_POLL_MS: u64 = 10;

enum ReaderMessage {
    Inbound(Inbound),
    Closed(String),
}

fn command_bytes(command: TermCommand) -> &'static [u8] {
    match command {
        TermCommand::SetBold => SET_BOLD,
        TermCommand::SetNormal => SET_NORMAL,
        TermCommand::SetReverse => SET_REVERSE,
        TermCommand::ClearLine => CLEAR_LINE,
        TermCommand::ClearToEndOfLine => CLEAR_TO_EOL,
        TermCommand::ClearToOrigin => CLEAR_TO_ORIGIN,
        TermCommand::MoveCursorOrigin => CURSOR_HOME,
        TermCommand::MoveCursorUp => REVERSE_INDEX,
        TermCommand::MoveCursorDown => INDEX,
        TermCommand::SaveCursor => SAVE_CURSOR,
        TermCommand::RestoreCursor => RESTORE_CURSOR,
    }
}

fn should_retry_read_error(err: &io::Error) -> bool {
    err.kind() == ErrorKind::Interrupted || err.kind() == ErrorKind::WouldBlock
}

fn spawn_reader_thread<R>(
    mut port: R,
    tx: Sender<ReaderMessage>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 256];
        let mut parser = InputParser::new();
        while !stop.load(Ordering::SeqCst) {
            let n = match port.read(&mut buf) {
                Ok(n) => n,
                Err(err) if should_retry_read_error(&err) => {
                    thread::sleep(Duration::from_millis(IDLE_READ_SLEEP_MS));
                    continue;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "terminal read failed");
                    let _ = tx.send(ReaderMessage::Closed(err.to_string()));
                    return;
                }
            };
            let mut inbound = Vec::new();
            if n == 0 {
                // Inter-byte timeout expired: the line is idle.
                parser.flush_pending(&mut inbound);
                if inbound.is_empty() {
                    thread::sleep(Duration::from_millis(IDLE_READ_SLEEP_MS));
                }
            } else {
                parser.consume_bytes(&buf[..n], &mut inbound);
            }
            for message in inbound {
                if tx.send(ReaderMessage::Inbound(message)).is_err() {
                    return;
                }
            }
        }
    })
}

/// A VT-100 reached through any byte pipe, normally a serial port.
pub struct Vt100Terminal<W: Write> {
    port: W,
    out: Vec<u8>,
    inbound: Receiver<ReaderMessage>,
    lookahead: VecDeque<InputEvent>,
    stop: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
    columns: usize,
    rows: usize,
}

impl Vt100Terminal<std::fs::File> {
    /// Open the serial device and put the terminal into a known state.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the device cannot be opened or configured.
    pub fn open(settings: &SerialSettings, columns: usize, rows: usize) -> TermResult<Self> {
        let port = serial::open_port(settings)?;
        let reader = port.try_clone()?;
        let mut term = Self::new(port, reader, columns, rows);
        term.initialize()?;
        Ok(term)
    }
}

impl<W: Write> Vt100Terminal<W> {
    pub fn new<R>(port: W, reader: R, columns: usize, rows: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = bounded(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader_thread(reader, tx, Arc::clone(&stop));
        Self {
            port,
            out: Vec::with_capacity(1024),
            inbound: rx,
            lookahead: VecDeque::new(),
            stop,
            reader: Some(reader),
            columns,
            rows,
        }
    }

    fn initialize(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(SET_NORMAL);
        self.out.extend_from_slice(CLEAR_REGION);
        self.out.extend_from_slice(NEWLINE_MODE);
        if self.columns == 132 {
            self.set_132_columns()?;
        } else {
            self.set_80_columns()?;
        }
        self.flush()
    }

    fn flush(&mut self) -> TermResult<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        self.port.write_all(&self.out)?;
        self.port.flush()?;
        self.out.clear();
        Ok(())
    }

    fn stash(&mut self, message: ReaderMessage) -> TermResult<Option<InputEvent>> {
        match message {
            ReaderMessage::Inbound(Inbound::Event(event)) => Ok(Some(event)),
            // A report nobody is waiting for.
            ReaderMessage::Inbound(Inbound::CursorReport { .. }) => Ok(None),
            ReaderMessage::Closed(reason) => Err(TransportError::Io(reason)),
        }
    }
}

impl<W: Write> Terminal for Vt100Terminal<W> {
    fn columns(&self) -> usize {
        self.columns
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn move_cursor(&mut self, row: usize, col: usize) -> TermResult<()> {
        self.out
            .extend_from_slice(format!("\x1b[{row};{col}H").as_bytes());
        Ok(())
    }

    fn fetch_cursor(&mut self) -> TermResult<(usize, usize)> {
        self.out.extend_from_slice(REQUEST_CURSOR);
        self.flush()?;
        let deadline = Instant::now() + CURSOR_REPORT_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }
            match self.inbound.recv_timeout(remaining) {
                Ok(ReaderMessage::Inbound(Inbound::CursorReport { row, col })) => {
                    return Ok((row, col));
                }
                Ok(ReaderMessage::Inbound(Inbound::Event(event))) => {
                    self.lookahead.push_back(event);
                }
                Ok(ReaderMessage::Closed(reason)) => return Err(TransportError::Io(reason)),
                Err(RecvTimeoutError::Timeout) => return Err(TransportError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
    }

    fn send_text(&mut self, text: &str) -> TermResult<()> {
        for ch in text.chars() {
            if ch == '\n' {
                self.out.extend_from_slice(b"\r\n");
            } else {
                let mut utf8 = [0u8; 4];
                self.out
                    .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
        }
        Ok(())
    }

    fn send_command(&mut self, command: TermCommand) -> TermResult<()> {
        self.out.extend_from_slice(command_bytes(command));
        Ok(())
    }

    fn set_scroll_region(&mut self, top: usize, bottom: usize) -> TermResult<()> {
        self.out
            .extend_from_slice(format!("\x1b[{top};{bottom}r").as_bytes());
        Ok(())
    }

    fn clear_scroll_region(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(CLEAR_REGION);
        Ok(())
    }

    fn set_auto_wrap(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(WRAP_ENABLE);
        Ok(())
    }

    fn clear_auto_wrap(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(WRAP_DISABLE);
        Ok(())
    }

    fn set_80_columns(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(COLUMNS_80);
        self.columns = 80;
        Ok(())
    }

    fn set_132_columns(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(COLUMNS_132);
        self.columns = 132;
        Ok(())
    }

    fn recv_input(&mut self) -> TermResult<InputEvent> {
        self.flush()?;
        if let Some(event) = self.lookahead.pop_front() {
            return Ok(event);
        }
        loop {
            if interrupt::take_interrupt() {
                return Ok(InputEvent::Interrupt);
            }
            match self
                .inbound
                .recv_timeout(Duration::from_millis(INPUT_POLL_MS))
            {
                Ok(message) => {
                    if let Some(event) = self.stash(message)? {
                        return Ok(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
    }

    fn peek_input(&mut self) -> TermResult<Option<InputEvent>> {
        self.flush()?;
        if let Some(event) = self.lookahead.front() {
            return Ok(Some(event.clone()));
        }
        loop {
            match self.inbound.try_recv() {
                Ok(message) => {
                    if let Some(event) = self.stash(message)? {
                        self.lookahead.push_back(event.clone());
                        return Ok(Some(event));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
    }

    fn reset(&mut self) -> TermResult<()> {
        self.out.extend_from_slice(FULL_RESET);
        self.flush()
    }
}

impl<W: Write> Drop for Vt100Terminal<W> {
    fn drop(&mut self) {
        let _ = self.flush();
        self.stop.store(true, Ordering::SeqCst);
        let Some(handle) = self.reader.take() else {
            return;
        };
        let deadline = Instant::now() + Duration::from_millis(READER_JOIN_TIMEOUT_MS);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(THREAD_JOIN_POLL_MS));
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            tracing::debug!("terminal reader still blocked; detaching");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::Key;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("intentional write failure"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("intentional flush failure"))
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("EIO"))
        }
    }

    fn terminal_with_input(input: &[u8]) -> (Vt100Terminal<SharedBuf>, SharedBuf) {
        let out = SharedBuf::default();
        let term = Vt100Terminal::new(out.clone(), Cursor::new(input.to_vec()), 80, 24);
        (term, out)
    }

    #[test]
    fn output_is_buffered_until_input_is_awaited() {
        let (mut term, out) = terminal_with_input(b"x");
        term.move_cursor(3, 1).unwrap();
        term.send_command(TermCommand::SetBold).unwrap();
        term.send_text("a\nb").unwrap();
        assert_eq!(out.contents(), "");

        let event = term.recv_input().unwrap();
        assert_eq!(event, InputEvent::Bytes(b"x".to_vec()));
        assert_eq!(out.contents(), "\u{1b}[3;1H\u{1b}[1ma\r\nb");
    }

    #[test]
    fn scroll_region_and_column_modes_encode_as_vt100() {
        let (mut term, out) = terminal_with_input(b"");
        term.set_scroll_region(3, 22).unwrap();
        term.clear_scroll_region().unwrap();
        term.set_132_columns().unwrap();
        assert_eq!(term.columns(), 132);
        term.reset().unwrap();
        assert_eq!(out.contents(), "\u{1b}[3;22r\u{1b}[r\u{1b}[?3h\u{1b}c");
    }

    #[test]
    fn initialize_enables_newline_mode_before_column_mode() {
        let (mut term, out) = terminal_with_input(b"");
        term.initialize().unwrap();
        assert_eq!(out.contents(), "\u{1b}[0m\u{1b}[r\u{1b}[20h\u{1b}[?3l");

        let out = SharedBuf::default();
        let mut wide = Vt100Terminal::new(out.clone(), Cursor::new(Vec::new()), 132, 24);
        wide.initialize().unwrap();
        assert!(out.contents().ends_with("\u{1b}[20h\u{1b}[?3h"));
        assert_eq!(wide.columns(), 132);
    }

    #[test]
    fn peek_keeps_event_for_next_recv() {
        let (mut term, _out) = terminal_with_input(b"\x1b[A\x1b[A");
        let mut peeked = None;
        for _ in 0..100 {
            peeked = term.peek_input().unwrap();
            if peeked.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(peeked, Some(InputEvent::Key(Key::Up)));
        assert_eq!(term.recv_input().unwrap(), InputEvent::Key(Key::Up));
        assert_eq!(term.recv_input().unwrap(), InputEvent::Key(Key::Up));
    }

    #[test]
    fn fetch_cursor_keeps_keys_that_arrive_first() {
        let (mut term, out) = terminal_with_input(b"k\x1b[24;5R");
        assert_eq!(term.fetch_cursor().unwrap(), (24, 5));
        assert!(out.contents().ends_with("\u{1b}[6n"));
        assert_eq!(term.recv_input().unwrap(), InputEvent::Bytes(b"k".to_vec()));
    }

    #[test]
    fn read_failure_surfaces_as_transport_error() {
        let mut term = Vt100Terminal::new(SharedBuf::default(), BrokenReader, 80, 24);
        assert_eq!(
            term.recv_input(),
            Err(TransportError::Io("EIO".to_string()))
        );
    }

    #[test]
    fn write_failure_surfaces_as_transport_error() {
        let mut term = Vt100Terminal::new(FailingWriter, Cursor::new(Vec::new()), 80, 24);
        term.send_text("hello").unwrap();
        assert!(matches!(term.reset(), Err(TransportError::Io(_))));
    }
}
