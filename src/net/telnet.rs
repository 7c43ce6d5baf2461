//! Telnet wire codec.
//!
//! # Responsibilities
//! - Strip IAC command sequences from the inbound byte stream
//! - Turn NAWS subnegotiations into window size reports
//! - Decode the remaining bytes into key events (control keys, ESC/CSI/SS3
//!   sequences, UTF-8 text)
//! - Escape IAC bytes in outbound frames
//!
//! # Design Decisions
//! - The decoder is a pure state machine; reads may split sequences anywhere
//! - A lone ESC at the end of a read is reported as the Esc key

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::Geometry;

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;
pub const OPT_NAWS: u8 = 31;

const ESC: u8 = 0x1b;
const MAX_SUBNEGOTIATION: usize = 64;
const MAX_ESCAPE: usize = 16;

/// Options the server requests right after accepting a connection:
/// server-side echo, character-at-a-time mode and window size reports.
pub const NEGOTIATION: [u8; 9] = [IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA, IAC, DO, OPT_NAWS];

/// One decoded input from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    Resize(Geometry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Option,
    Sub,
    SubIac,
}

#[derive(Debug)]
pub struct TelnetDecoder {
    state: State,
    sub: Vec<u8>,
    escape: Vec<u8>,
    utf8: Vec<u8>,
    after_cr: bool,
}

impl Default for TelnetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            sub: Vec::new(),
            escape: Vec::new(),
            utf8: Vec::new(),
            after_cr: false,
        }
    }

    /// Decode one read worth of bytes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Input> {
        let mut out = Vec::new();
        for &b in bytes {
            self.telnet_byte(b, &mut out);
        }
        if self.escape == [ESC] {
            self.escape.clear();
            out.push(key(KeyCode::Esc, KeyModifiers::NONE));
        }
        out
    }

    fn telnet_byte(&mut self, b: u8, out: &mut Vec<Input>) {
        self.state = match self.state {
            State::Data if b == IAC => State::Iac,
            State::Data => {
                self.data_byte(b, out);
                State::Data
            }
            State::Iac => match b {
                IAC => {
                    self.data_byte(IAC, out);
                    State::Data
                }
                SB => {
                    self.sub.clear();
                    State::Sub
                }
                WILL | WONT | DO | DONT => State::Option,
                _ => State::Data,
            },
            // Replies to our own requests; nothing to answer.
            State::Option => State::Data,
            State::Sub if b == IAC => State::SubIac,
            State::Sub => {
                if self.sub.len() < MAX_SUBNEGOTIATION {
                    self.sub.push(b);
                }
                State::Sub
            }
            State::SubIac => match b {
                SE => {
                    self.finish_subnegotiation(out);
                    State::Data
                }
                IAC => {
                    if self.sub.len() < MAX_SUBNEGOTIATION {
                        self.sub.push(IAC);
                    }
                    State::Sub
                }
                _ => State::Data,
            },
        };
    }

    fn finish_subnegotiation(&mut self, out: &mut Vec<Input>) {
        if let &[OPT_NAWS, w1, w2, h1, h2, ..] = self.sub.as_slice() {
            let width = u16::from_be_bytes([w1, w2]);
            let height = u16::from_be_bytes([h1, h2]);
            if width > 0 && height > 0 {
                out.push(Input::Resize(Geometry::new(width, height)));
            }
        }
        self.sub.clear();
    }

    fn data_byte(&mut self, b: u8, out: &mut Vec<Input>) {
        if !self.escape.is_empty() {
            self.escape_byte(b, out);
            return;
        }
        if !self.utf8.is_empty() || b >= 0x80 {
            self.utf8_byte(b, out);
            return;
        }

        let after_cr = std::mem::replace(&mut self.after_cr, false);
        let none = KeyModifiers::NONE;
        match b {
            b'\r' => {
                self.after_cr = true;
                out.push(key(KeyCode::Enter, none));
            }
            b'\n' | 0 if after_cr => {}
            b'\n' => out.push(key(KeyCode::Enter, none)),
            0 => {}
            b'\t' => out.push(key(KeyCode::Tab, none)),
            0x7f | 0x08 => out.push(key(KeyCode::Backspace, none)),
            ESC => self.escape.push(ESC),
            1..=26 => out.push(key(KeyCode::Char((b'a' + b - 1) as char), KeyModifiers::CONTROL)),
            0x20..=0x7e => out.push(key(KeyCode::Char(b as char), none)),
            _ => {}
        }
    }

    fn escape_byte(&mut self, b: u8, out: &mut Vec<Input>) {
        self.escape.push(b);
        let none = KeyModifiers::NONE;

        match self.escape[1] {
            b'[' | b'O' if self.escape.len() == 2 => {}
            b'O' => {
                let code = match b {
                    b'A' => Some(KeyCode::Up),
                    b'B' => Some(KeyCode::Down),
                    b'C' => Some(KeyCode::Right),
                    b'D' => Some(KeyCode::Left),
                    b'H' => Some(KeyCode::Home),
                    b'F' => Some(KeyCode::End),
                    _ => None,
                };
                self.escape.clear();
                if let Some(code) = code {
                    out.push(key(code, none));
                }
            }
            b'[' => {
                if (0x40..=0x7e).contains(&b) {
                    let code = csi_key(&self.escape[2..self.escape.len() - 1], b);
                    self.escape.clear();
                    if let Some(code) = code {
                        let modifiers = if code == KeyCode::BackTab {
                            KeyModifiers::SHIFT
                        } else {
                            none
                        };
                        out.push(key(code, modifiers));
                    }
                } else if self.escape.len() >= MAX_ESCAPE {
                    self.escape.clear();
                }
            }
            _ => {
                // ESC followed by an ordinary byte: the Esc key, then that byte.
                self.escape.clear();
                out.push(key(KeyCode::Esc, none));
                self.data_byte(b, out);
            }
        }
    }

    fn utf8_byte(&mut self, b: u8, out: &mut Vec<Input>) {
        if !self.utf8.is_empty() && b & 0xc0 != 0x80 {
            // Truncated sequence: drop it and decode this byte on its own.
            self.utf8.clear();
            self.data_byte(b, out);
            return;
        }
        self.utf8.push(b);
        let expected = match self.utf8[0] {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => {
                self.utf8.clear();
                return;
            }
        };
        if self.utf8.len() < expected {
            return;
        }
        if let Some(c) = std::str::from_utf8(&self.utf8).ok().and_then(|s| s.chars().next()) {
            out.push(key(KeyCode::Char(c), KeyModifiers::NONE));
        }
        self.utf8.clear();
    }
}

fn csi_key(params: &[u8], final_byte: u8) -> Option<KeyCode> {
    match final_byte {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        b'Z' => Some(KeyCode::BackTab),
        b'~' => match params {
            b"1" | b"7" => Some(KeyCode::Home),
            b"2" => Some(KeyCode::Insert),
            b"3" => Some(KeyCode::Delete),
            b"4" | b"8" => Some(KeyCode::End),
            b"5" => Some(KeyCode::PageUp),
            b"6" => Some(KeyCode::PageDown),
            _ => None,
        },
        _ => None,
    }
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> Input {
    Input::Key(KeyEvent::new(code, modifiers))
}

/// Double every IAC byte so frame data is never read as a command.
pub fn escape_iac(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len());
    for &b in frame {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(inputs: &[Input]) -> Vec<KeyCode> {
        inputs
            .iter()
            .filter_map(|i| match i {
                Input::Key(k) => Some(k.code),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn naws_becomes_resize() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.feed(&[IAC, WILL, OPT_NAWS, IAC, SB, OPT_NAWS, 0, 120, 0, 40, IAC, SE]);
        assert_eq!(out, vec![Input::Resize(Geometry::new(120, 40))]);
    }

    #[test]
    fn naws_split_across_reads() {
        let mut decoder = TelnetDecoder::new();
        assert!(decoder.feed(&[IAC, SB, OPT_NAWS, 0]).is_empty());
        let out = decoder.feed(&[80, 0, 24, IAC, SE, b'q']);
        assert_eq!(out[0], Input::Resize(Geometry::new(80, 24)));
        assert_eq!(keys(&out), vec![KeyCode::Char('q')]);
    }

    #[test]
    fn naws_with_escaped_iac() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.feed(&[IAC, SB, OPT_NAWS, 0, IAC, IAC, 0, 50, IAC, SE]);
        assert_eq!(out, vec![Input::Resize(Geometry::new(255, 50))]);
    }

    #[test]
    fn line_endings_produce_one_enter() {
        let mut decoder = TelnetDecoder::new();
        assert_eq!(keys(&decoder.feed(b"\r\n")), vec![KeyCode::Enter]);
        assert_eq!(keys(&decoder.feed(&[b'\r', 0])), vec![KeyCode::Enter]);
        assert_eq!(keys(&decoder.feed(b"\n")), vec![KeyCode::Enter]);
    }

    #[test]
    fn control_keys() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.feed(&[3, b'\t', 0x7f]);
        assert_eq!(out[0], Input::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert_eq!(keys(&out[1..]), vec![KeyCode::Tab, KeyCode::Backspace]);
    }

    #[test]
    fn escape_sequences() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.feed(b"\x1b[A\x1b[B\x1bOC\x1b[5~\x1b[6~\x1b[H\x1b[4~");
        assert_eq!(
            keys(&out),
            vec![
                KeyCode::Up,
                KeyCode::Down,
                KeyCode::Right,
                KeyCode::PageUp,
                KeyCode::PageDown,
                KeyCode::Home,
                KeyCode::End
            ]
        );

        let out = decoder.feed(b"\x1b[Z");
        assert_eq!(out, vec![Input::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT))]);
    }

    #[test]
    fn escape_split_and_lone_escape() {
        let mut decoder = TelnetDecoder::new();
        assert!(decoder.feed(b"\x1b[").is_empty());
        assert_eq!(keys(&decoder.feed(b"D")), vec![KeyCode::Left]);

        assert_eq!(keys(&decoder.feed(b"\x1b")), vec![KeyCode::Esc]);
        assert_eq!(keys(&decoder.feed(b"\x1bq")), vec![KeyCode::Esc, KeyCode::Char('q')]);
    }

    #[test]
    fn utf8_text() {
        let mut decoder = TelnetDecoder::new();
        let bytes = "é€".as_bytes();
        assert!(decoder.feed(&bytes[..1]).is_empty());
        assert_eq!(keys(&decoder.feed(&bytes[1..])), vec![KeyCode::Char('é'), KeyCode::Char('€')]);
    }

    #[test]
    fn truncated_utf8_keeps_following_key() {
        let mut decoder = TelnetDecoder::new();
        assert_eq!(keys(&decoder.feed(&[0xc3, b'q'])), vec![KeyCode::Char('q')]);

        let mut out = decoder.feed(&[0xe2, 0x82]);
        out.extend(decoder.feed(&[0x1b, b'[', b'A']));
        assert_eq!(keys(&out), vec![KeyCode::Up]);

        let restart = [0xc3, 0xc3, 0xa9];
        assert_eq!(keys(&decoder.feed(&restart)), vec![KeyCode::Char('é')]);
    }

    #[test]
    fn commands_are_stripped() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.feed(&[IAC, DO, OPT_ECHO, b'j', IAC, 241, b'k']);
        assert_eq!(keys(&out), vec![KeyCode::Char('j'), KeyCode::Char('k')]);
    }

    #[test]
    fn iac_is_doubled() {
        assert_eq!(escape_iac(&[1, IAC, 2]), vec![1, IAC, IAC, 2]);
        assert_eq!(escape_iac(b"plain"), b"plain".to_vec());
    }
}
