use std::fmt;
use std::sync::Arc;

use crate::kinds::TokenKind;
use crate::lexicon::Lexicon;

/// Data for use in user friendly lexical analysis error messages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Human friendly line number of this location
    line_number: usize,
    /// Human friendly offset of this location within its line
    offset: usize,
    /// A label describing the source of the string in which this location occurs
    label: String,
}

impl Location {
    fn new(label: String) -> Self {
        Self {
            line_number: 1,
            offset: 1,
            label,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Location {
    fn fmt(&self, dest: &mut fmt::Formatter) -> fmt::Result {
        if self.label.len() > 0 {
            if self.label.contains(' ') || self.label.contains('\t') {
                write!(
                    dest,
                    "\"{}\":{}:{}",
                    self.label, self.line_number, self.offset
                )
            } else {
                write!(dest, "{}:{}:{}", self.label, self.line_number, self.offset)
            }
        } else {
            write!(dest, "{}:{}", self.line_number, self.offset)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnexpectedText(String, Location),
    TokenTooLong(Location, usize),
}

impl Error {
    pub fn location(&self) -> &Location {
        match self {
            Error::UnexpectedText(_, location) => location,
            Error::TokenTooLong(location, _) => location,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, dest: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedText(text, location) => {
                write!(dest, "unexpected text \"{}\" at: {}", text, location)
            }
            Error::TokenTooLong(location, length) => {
                write!(dest, "token of {} bytes at: {} is too long", length, location)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Longest lexeme the scanner will buffer before giving up on a token.
pub const MAX_LEXEME_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
    location: Location,
    num_val: Option<i64>,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Decoded value of a valid integer literal; `None` for every other
    /// kind and for literals whose value does not fit.
    pub fn num_val(&self) -> Option<i64> {
        self.num_val
    }
}

fn decode_num_val(kind: TokenKind, lexeme: &str) -> Option<i64> {
    match kind {
        TokenKind::OctInt => i64::from_str_radix(&lexeme[1..], 8).ok(),
        TokenKind::DecInt => lexeme.parse().ok(),
        TokenKind::HexInt => i64::from_str_radix(&lexeme[2..], 16).ok(),
        _ => None,
    }
}

/// A lazy, restartable token sequence terminated by an explicit end-marker.
///
/// Tokens are scanned on demand and buffered so the cursor can be marked,
/// rewound (recursive-descent backtracking) or restarted from the front.
/// Once the text is exhausted every further `front` yields an end-marker
/// token carrying the final location.
#[derive(Debug)]
pub struct TokenStream {
    lexicon: Arc<Lexicon>,
    text: String,
    index: usize,
    location: Location,
    buffer: Vec<Result<Token, Error>>,
    cursor: usize,
}

impl TokenStream {
    pub fn new(lexicon: &Arc<Lexicon>, text: String, label: String) -> Self {
        let location = Location::new(label);
        Self {
            lexicon: Arc::clone(lexicon),
            text,
            index: 0,
            location,
            buffer: Vec::with_capacity(128),
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The token (or lexical error) under the cursor.
    pub fn front(&mut self) -> Result<Token, Error> {
        while self.buffer.len() <= self.cursor {
            let next = self.scan_next();
            self.buffer.push(next);
        }
        self.buffer[self.cursor].clone()
    }

    pub fn advance(&mut self) {
        // make sure the current entry has been scanned before moving past it
        let _ = self.front();
        self.cursor += 1;
    }

    pub fn front_advance(&mut self) -> Result<Token, Error> {
        let front = self.front();
        self.advance();
        front
    }

    /// Rewind the cursor to the first token.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn mark(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.cursor);
        self.cursor = mark;
    }

    fn incr_index_and_location(&mut self, length: usize) {
        let next_index = self.index + length;
        let slice = &self.text[self.index..next_index];
        let mut i = 0;
        while i < length {
            if let Some(eol_i) = slice[i..].find("\r\n") {
                self.location.line_number += 1;
                self.location.offset = 1;
                i += eol_i + 2;
            } else if let Some(eol_i) = slice[i..].find('\n') {
                self.location.line_number += 1;
                self.location.offset = 1;
                i += eol_i + 1;
            } else {
                self.location.offset += length - i;
                i = length;
            };
        }
        self.index = next_index;
    }

    fn end_marker_token(&self) -> Token {
        Token {
            kind: self.lexicon.end_marker(),
            lexeme: String::new(),
            location: self.location.clone(),
            num_val: None,
        }
    }

    fn scan_next(&mut self) -> Result<Token, Error> {
        self.incr_index_and_location(self.lexicon.skippable_count(&self.text[self.index..]));
        if self.index >= self.text.len() {
            return Ok(self.end_marker_token());
        }

        let current_location = self.location.clone();
        let start = self.index;
        let o_llm = self.lexicon.longest_literal_match(&self.text[self.index..]);
        let o_lrm = self.lexicon.longest_regex_match(&self.text[self.index..]);

        let o_match = match (o_llm, o_lrm) {
            // a regex match wins only when it is strictly longer, so that
            // keywords beat identifiers of the same length
            (Some(llm), Some(lrm)) => {
                if lrm.1 > llm.1 {
                    Some(lrm)
                } else {
                    Some(llm)
                }
            }
            (Some(llm), None) => Some(llm),
            (None, Some(lrm)) => Some(lrm),
            (None, None) => None,
        };

        if let Some((kind, length)) = o_match {
            self.incr_index_and_location(length);
            if length > MAX_LEXEME_LEN {
                return Err(Error::TokenTooLong(current_location, length));
            }
            let lexeme = self.text[start..self.index].to_string();
            let num_val = decode_num_val(kind, &lexeme);
            Ok(Token {
                kind,
                lexeme,
                location: current_location,
                num_val,
            })
        } else {
            let distance = self
                .lexicon
                .distance_to_next_valid_byte(&self.text[self.index..]);
            self.incr_index_and_location(distance);
            Err(Error::UnexpectedText(
                self.text[start..self.index].to_string(),
                current_location,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::teaching_lexicon;

    fn kinds_of(text: &str) -> Vec<TokenKind> {
        let mut stream = TokenStream::new(&teaching_lexicon(), text.to_string(), String::new());
        let mut kinds = vec![];
        loop {
            match stream.front_advance() {
                Ok(token) => {
                    if token.kind() == TokenKind::EndMarker {
                        break;
                    }
                    kinds.push(token.kind());
                }
                Err(_) => panic!("unexpected lexical error in {:?}", text),
            }
        }
        kinds
    }

    #[test]
    fn integer_literal_kinds() {
        assert_eq!(kinds_of("0"), vec![TokenKind::DecInt]);
        assert_eq!(kinds_of("007"), vec![TokenKind::OctInt]);
        assert_eq!(kinds_of("089"), vec![TokenKind::BadOctInt]);
        assert_eq!(kinds_of("0xFF"), vec![TokenKind::HexInt]);
        assert_eq!(kinds_of("0xZZ"), vec![TokenKind::BadHexInt]);
        assert_eq!(kinds_of("abc123"), vec![TokenKind::Ident]);
        assert_eq!(kinds_of("begin"), vec![TokenKind::Begin]);
    }

    #[test]
    fn keywords_beat_identifier_ties() {
        assert_eq!(kinds_of("if iffy"), vec![TokenKind::If, TokenKind::Ident]);
        assert_eq!(kinds_of("doing"), vec![TokenKind::Ident]);
    }

    #[test]
    fn num_vals_are_decoded() {
        let mut stream =
            TokenStream::new(&teaching_lexicon(), "017 17 0x17".to_string(), String::new());
        assert_eq!(stream.front_advance().unwrap().num_val(), Some(0o17));
        assert_eq!(stream.front_advance().unwrap().num_val(), Some(17));
        assert_eq!(stream.front_advance().unwrap().num_val(), Some(0x17));
    }

    #[test]
    fn locations_track_lines_and_offsets() {
        let text = "x = 1;\ny = 2;".to_string();
        let mut stream = TokenStream::new(&teaching_lexicon(), text, String::new());
        let token = stream.front_advance().unwrap();
        assert_eq!(token.location().line_number(), 1);
        assert_eq!(token.location().offset(), 1);
        for _ in 0..3 {
            stream.advance();
        }
        let token = stream.front_advance().unwrap();
        assert_eq!(token.lexeme(), "y");
        assert_eq!(token.location().line_number(), 2);
        assert_eq!(token.location().offset(), 1);
    }

    #[test]
    fn end_marker_is_synthesised_and_sticky() {
        let mut stream = TokenStream::new(&teaching_lexicon(), "x".to_string(), String::new());
        assert_eq!(stream.front_advance().unwrap().kind(), TokenKind::Ident);
        assert_eq!(stream.front_advance().unwrap().kind(), TokenKind::EndMarker);
        assert_eq!(stream.front().unwrap().kind(), TokenKind::EndMarker);
    }

    #[test]
    fn rewinding_replays_buffered_tokens() {
        let mut stream =
            TokenStream::new(&teaching_lexicon(), "a + b".to_string(), String::new());
        let mark = stream.mark();
        assert_eq!(stream.front_advance().unwrap().lexeme(), "a");
        assert_eq!(stream.front_advance().unwrap().lexeme(), "+");
        stream.rewind(mark);
        assert_eq!(stream.front_advance().unwrap().lexeme(), "a");
        stream.restart();
        assert_eq!(stream.front().unwrap().lexeme(), "a");
    }

    #[test]
    fn unknown_characters_are_reported_and_skipped() {
        let mut stream = TokenStream::new(&teaching_lexicon(), "x @ y".to_string(), String::new());
        assert_eq!(stream.front_advance().unwrap().lexeme(), "x");
        match stream.front_advance() {
            Err(Error::UnexpectedText(text, location)) => {
                assert_eq!(text, "@");
                assert_eq!(location.offset(), 3);
            }
            other => panic!("expected unexpected-text error, got {:?}", other),
        }
        assert_eq!(stream.front_advance().unwrap().lexeme(), "y");
    }
}
