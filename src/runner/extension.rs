//! @ai:module:intent Between-call "add more iterations" requests
//! @ai:module:layer infrastructure
//! @ai:module:public_api ExtensionSource, CallPosition, KeypressExtension, NoExtension
//! @ai:module:stateless false

use crate::console::Console;
use crate::endpoint::Endpoint;
use crate::error::Interrupted;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::time::Duration;

/// @ai:intent Where the run loop currently is
#[derive(Debug, Clone, Copy)]
pub struct CallPosition<'a> {
    pub endpoint: &'a Endpoint,
    /// 1-based question index.
    pub question: usize,
    /// 1-based iteration just completed.
    pub iteration: u32,
}

/// @ai:intent Source of extension requests, checked only between calls
pub trait ExtensionSource {
    /// @ai:intent Return extra iterations requested for the current pair, 0 for none
    /// @ai:post Err(Interrupted) means the operator asked to stop the run
    /// @ai:effects must not block unless an extension was actually requested
    fn poll_extension(&mut self, position: &CallPosition<'_>) -> Result<u32, Interrupted>;
}

/// @ai:intent Extension source that never requests anything
pub struct NoExtension;

impl ExtensionSource for NoExtension {
    fn poll_extension(&mut self, _position: &CallPosition<'_>) -> Result<u32, Interrupted> {
        Ok(0)
    }
}

/// What a key pressed between calls asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Ignore,
    Extend,
    Interrupt,
}

/// @ai:effects pure
fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&'c'))
}

/// @ai:intent Classify one key event; Ctrl-C wins over the reserved key
/// @ai:effects pure
fn classify_key(key: &KeyEvent, reserved: char) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    if is_ctrl_c(key) {
        return KeyAction::Interrupt;
    }

    match key.code {
        KeyCode::Char(c) if c.eq_ignore_ascii_case(&reserved) => KeyAction::Extend,
        _ => KeyAction::Ignore,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEdit {
    Continue,
    Submit,
    Interrupt,
}

/// @ai:intent Apply one key to a line being typed in raw mode
/// @ai:effects pure
fn edit_line(line: &mut String, key: &KeyEvent) -> LineEdit {
    if key.kind != KeyEventKind::Press {
        return LineEdit::Continue;
    }

    if is_ctrl_c(key) {
        return LineEdit::Interrupt;
    }

    match key.code {
        KeyCode::Enter => LineEdit::Submit,
        KeyCode::Backspace => {
            line.pop();
            LineEdit::Continue
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            line.push(c);
            LineEdit::Continue
        }
        _ => LineEdit::Continue,
    }
}

/// Whether an io error carries a keyboard interrupt from `RawLineReader`.
fn is_interrupt(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<Interrupted>())
}

/// @ai:intent Line reader that types in raw mode so Ctrl-C arrives as a key
///
/// The answer is read one line at a time; Ctrl-C surfaces as an
/// `io::Error` wrapping `Interrupted`.
struct RawLineReader {
    buf: Vec<u8>,
    pos: usize,
}

impl RawLineReader {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
        }
    }

    /// @ai:effects io
    fn read_line_raw() -> io::Result<String> {
        terminal::enable_raw_mode()?;

        let typed = (|| -> io::Result<String> {
            let mut out = io::stdout();
            let mut line = String::new();

            loop {
                let Event::Key(key) = event::read()? else {
                    continue;
                };

                let before = line.chars().count();
                match edit_line(&mut line, &key) {
                    LineEdit::Submit => {
                        write!(out, "\r\n")?;
                        out.flush()?;
                        line.push('\n');
                        return Ok(line);
                    }
                    LineEdit::Interrupt => {
                        write!(out, "^C\r\n")?;
                        out.flush()?;
                        return Err(io::Error::other(Interrupted));
                    }
                    LineEdit::Continue => {
                        let after = line.chars().count();
                        if after > before {
                            if let Some(c) = line.chars().last() {
                                write!(out, "{}", c)?;
                            }
                        } else if after < before {
                            write!(out, "\x08 \x08")?;
                        }
                        out.flush()?;
                    }
                }
            }
        })();

        terminal::disable_raw_mode()?;
        typed
    }
}

impl Read for RawLineReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for RawLineReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.buf.len() {
            self.buf = Self::read_line_raw()?.into_bytes();
            self.pos = 0;
        }
        Ok(&self.buf[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.buf.len());
    }
}

/// @ai:intent Reserved-key poll on the controlling terminal
///
/// Without a terminal on stdin this is a no-op. A terminal error disables
/// the monitor for the rest of the run instead of failing it. Ctrl-C seen
/// while the terminal is in raw mode stops the run.
pub struct KeypressExtension {
    key: char,
    active: bool,
}

impl KeypressExtension {
    /// @ai:effects io
    pub fn new(key: char) -> Self {
        let active = std::io::stdin().is_terminal();

        if !active {
            tracing::info!("stdin is not a terminal; interactive extension disabled");
        }

        Self { key, active }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// @ai:intent Drain pending terminal events and report the strongest request seen
    /// @ai:effects io
    fn pending_action(&self) -> io::Result<KeyAction> {
        terminal::enable_raw_mode()?;

        let drained = (|| -> io::Result<KeyAction> {
            let mut action = KeyAction::Ignore;

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    match classify_key(&key, self.key) {
                        KeyAction::Interrupt => return Ok(KeyAction::Interrupt),
                        KeyAction::Extend => action = KeyAction::Extend,
                        KeyAction::Ignore => {}
                    }
                }
            }

            Ok(action)
        })();

        terminal::disable_raw_mode()?;
        drained
    }
}

impl ExtensionSource for KeypressExtension {
    /// @ai:effects io
    fn poll_extension(&mut self, position: &CallPosition<'_>) -> Result<u32, Interrupted> {
        if !self.active {
            return Ok(0);
        }

        match self.pending_action() {
            Ok(KeyAction::Ignore) => Ok(0),
            Ok(KeyAction::Interrupt) => Err(Interrupted),
            Ok(KeyAction::Extend) => {
                let mut console = Console::new(RawLineReader::new(), io::stdout());

                match console.prompt_extension(&position.endpoint.id, position.question) {
                    Ok(extra) => Ok(extra),
                    Err(e) if is_interrupt(&e) => Err(Interrupted),
                    Err(e) => {
                        tracing::warn!("Could not read extension count: {}", e);
                        Ok(0)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Keypress polling failed, disabling extension: {}", e);
                self.active = false;
                Ok(0)
            }
        }
    }
}

/// @ai:intent Pre-planned extensions and interrupts keyed by (endpoint id, question, iteration)
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedExtension {
    plan: std::collections::HashMap<(String, usize, u32), Result<u32, Interrupted>>,
}

#[cfg(test)]
impl ScriptedExtension {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Request `extra` iterations after the given regular call
    pub(crate) fn after(mut self, endpoint_id: &str, question: usize, iteration: u32, extra: u32) -> Self {
        self.plan
            .insert((endpoint_id.to_string(), question, iteration), Ok(extra));
        self
    }

    /// @ai:intent Stop the run after the given regular call
    pub(crate) fn interrupt_after(mut self, endpoint_id: &str, question: usize, iteration: u32) -> Self {
        self.plan
            .insert((endpoint_id.to_string(), question, iteration), Err(Interrupted));
        self
    }
}

#[cfg(test)]
impl ExtensionSource for ScriptedExtension {
    fn poll_extension(&mut self, position: &CallPosition<'_>) -> Result<u32, Interrupted> {
        self.plan
            .remove(&(
                position.endpoint.id.clone(),
                position.question,
                position.iteration,
            ))
            .unwrap_or(Ok(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointFamily;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_ctrl_c_interrupts_instead_of_being_ignored() {
        let ctrl_c = press(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(classify_key(&ctrl_c, 'e'), KeyAction::Interrupt);
        assert_eq!(classify_key(&ctrl_c, 'c'), KeyAction::Interrupt);
        assert_eq!(
            classify_key(&press(KeyCode::Char('c'), KeyModifiers::NONE), 'e'),
            KeyAction::Ignore
        );
    }

    #[test]
    fn test_reserved_key_matches_either_case() {
        assert_eq!(
            classify_key(&press(KeyCode::Char('E'), KeyModifiers::SHIFT), 'e'),
            KeyAction::Extend
        );
        assert_eq!(
            classify_key(&press(KeyCode::Char('x'), KeyModifiers::NONE), 'e'),
            KeyAction::Ignore
        );
    }

    #[test]
    fn test_edit_line_typing_and_submit() {
        let mut line = String::new();

        for c in ['1', '2', '3'] {
            assert_eq!(
                edit_line(&mut line, &press(KeyCode::Char(c), KeyModifiers::NONE)),
                LineEdit::Continue
            );
        }
        edit_line(&mut line, &press(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(line, "12");

        assert_eq!(
            edit_line(&mut line, &press(KeyCode::Enter, KeyModifiers::NONE)),
            LineEdit::Submit
        );
    }

    #[test]
    fn test_edit_line_ctrl_c_interrupts() {
        let mut line = "4".to_string();

        assert_eq!(
            edit_line(&mut line, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            LineEdit::Interrupt
        );
        assert_eq!(line, "4");
    }

    #[test]
    fn test_interrupt_survives_io_error_wrapping() {
        assert!(is_interrupt(&io::Error::other(Interrupted)));
        assert!(!is_interrupt(&io::Error::new(io::ErrorKind::Other, "closed")));
    }

    #[test]
    fn test_scripted_extension_fires_once() {
        let endpoint = Endpoint::classify("cohere.rerank-v3-5:0", None).unwrap();
        let mut source = ScriptedExtension::new().after(&endpoint.id, 2, 1, 4);

        let miss = CallPosition {
            endpoint: &endpoint,
            question: 1,
            iteration: 1,
        };
        let hit = CallPosition {
            endpoint: &endpoint,
            question: 2,
            iteration: 1,
        };

        assert_eq!(source.poll_extension(&miss), Ok(0));
        assert_eq!(source.poll_extension(&hit), Ok(4));
        assert_eq!(source.poll_extension(&hit), Ok(0));
    }

    #[test]
    fn test_no_extension() {
        let endpoint = Endpoint::classify("x", Some(EndpointFamily::Embedding)).unwrap();
        let position = CallPosition {
            endpoint: &endpoint,
            question: 1,
            iteration: 1,
        };
        assert_eq!(NoExtension.poll_extension(&position), Ok(0));
    }
}
