use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::kinds::TokenKind;

#[derive(Debug)]
pub enum LexiconError<'a> {
    EmptyPattern(TokenKind),
    UnanchoredRegex(&'a str),
    DuplicateLiteral(&'a str),
    RegexError(regex::Error),
}

impl<'a> From<regex::Error> for LexiconError<'a> {
    fn from(error: regex::Error) -> Self {
        LexiconError::RegexError(error)
    }
}

/// Token recognition tables: literal lexemes, anchored regular expressions
/// and skip rules.  Literal matches win length ties against regex matches
/// so that keywords beat identifiers.
#[derive(Debug)]
pub struct Lexicon {
    literal_lexemes: Vec<(TokenKind, String)>,
    regex_lexemes: Vec<(TokenKind, Regex)>,
    skip_regexes: Vec<Regex>,
    end_marker: TokenKind,
}

impl Lexicon {
    pub fn new<'a>(
        literal_lexemes: &[(TokenKind, &'a str)],
        regex_lexemes: &[(TokenKind, &'a str)],
        skip_regex_strs: &[&'a str],
        end_marker: TokenKind,
    ) -> Result<Self, LexiconError<'a>> {
        let mut literals = vec![];
        for (kind, lexeme) in literal_lexemes.iter() {
            if lexeme.len() == 0 {
                return Err(LexiconError::EmptyPattern(*kind));
            };
            if literals
                .iter()
                .any(|entry: &(TokenKind, String)| entry.1.as_str() == *lexeme)
            {
                return Err(LexiconError::DuplicateLiteral(*lexeme));
            };
            literals.push((*kind, lexeme.to_string()));
        }
        let mut regexes = vec![];
        for (kind, pattern) in regex_lexemes.iter() {
            if !pattern.starts_with("\\A") {
                return Err(LexiconError::UnanchoredRegex(*pattern));
            };
            regexes.push((*kind, Regex::new(*pattern)?));
        }
        let mut skips = vec![];
        for pattern in skip_regex_strs.iter() {
            if !pattern.starts_with("\\A") {
                return Err(LexiconError::UnanchoredRegex(*pattern));
            };
            skips.push(Regex::new(*pattern)?);
        }
        Ok(Self {
            literal_lexemes: literals,
            regex_lexemes: regexes,
            skip_regexes: skips,
            end_marker,
        })
    }

    pub fn end_marker(&self) -> TokenKind {
        self.end_marker
    }

    /// Returns the number of skippable bytes at the start of `text`.
    pub fn skippable_count(&self, text: &str) -> usize {
        let mut index = 0;
        'outer: while index < text.len() {
            for regex in self.skip_regexes.iter() {
                if let Some(m) = regex.find(&text[index..]) {
                    if m.end() > 0 {
                        index += m.end();
                        continue 'outer;
                    }
                }
            }
            break;
        }
        index
    }

    /// Returns the longest literal lexeme matching the start of `text`.
    pub fn longest_literal_match(&self, text: &str) -> Option<(TokenKind, usize)> {
        let mut best: Option<(TokenKind, usize)> = None;
        for (kind, lexeme) in self.literal_lexemes.iter() {
            if text.starts_with(lexeme.as_str()) {
                match best {
                    Some((_, length)) if length >= lexeme.len() => (),
                    _ => best = Some((*kind, lexeme.len())),
                }
            }
        }
        best
    }

    /// Returns the first longest regex match at the start of `text`.
    pub fn longest_regex_match(&self, text: &str) -> Option<(TokenKind, usize)> {
        let mut best: Option<(TokenKind, usize)> = None;
        for (kind, regex) in self.regex_lexemes.iter() {
            if let Some(m) = regex.find(text) {
                match best {
                    Some((_, length)) if length >= m.end() => (),
                    _ => best = Some((*kind, m.end())),
                }
            }
        }
        best
    }

    /// Returns `true` if any matcher (or skip rule) matches the start of `text`.
    fn matches(&self, text: &str) -> bool {
        self.skippable_count(text) > 0
            || self.longest_literal_match(text).is_some()
            || self.longest_regex_match(text).is_some()
    }

    /// Returns the distance in bytes to the next recognisable content of `text`.
    pub fn distance_to_next_valid_byte(&self, text: &str) -> usize {
        for (index, _) in text.char_indices() {
            if index > 0 && self.matches(&text[index..]) {
                return index;
            }
        }
        text.len()
    }
}

lazy_static! {
    static ref TEACHING_LEXICON: Arc<Lexicon> = {
        use TokenKind::*;
        let lexicon = Lexicon::new(
            &[
                (If, "if"),
                (Then, "then"),
                (Else, "else"),
                (While, "while"),
                (Do, "do"),
                (Begin, "begin"),
                (End, "end"),
                (Plus, "+"),
                (Minus, "-"),
                (Star, "*"),
                (Slash, "/"),
                (Assign, "="),
                (NotEqual, "<>"),
                (Less, "<"),
                (LessEqual, "<="),
                (Greater, ">"),
                (GreaterEqual, ">="),
                (LParen, "("),
                (RParen, ")"),
                (Semicolon, ";"),
            ],
            &[
                (Ident, r"\A[A-Za-z][A-Za-z0-9]*"),
                (DecInt, r"\A(0|[1-9][0-9]*)"),
                (OctInt, r"\A0[0-7]+"),
                (HexInt, r"\A0[xX][0-9A-Fa-f]+"),
                (BadOctInt, r"\A0[0-7]*[89][0-9]*"),
                (BadHexInt, r"\A0[xX][0-9A-Fa-f]*[G-Zg-z][0-9A-Za-z]*"),
            ],
            &[r"\A\s+"],
            EndMarker,
        );
        Arc::new(lexicon.expect("the teaching language lexicon is well formed"))
    };
}

/// The token recognition tables for the teaching language.
pub fn teaching_lexicon() -> Arc<Lexicon> {
    Arc::clone(&TEACHING_LEXICON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_prefer_longest() {
        let lexicon = teaching_lexicon();
        assert_eq!(
            lexicon.longest_literal_match("<= 1"),
            Some((TokenKind::LessEqual, 2))
        );
        assert_eq!(
            lexicon.longest_literal_match("<>"),
            Some((TokenKind::NotEqual, 2))
        );
        assert_eq!(lexicon.longest_literal_match("< 1"), Some((TokenKind::Less, 1)));
    }

    #[test]
    fn regex_matches_prefer_longest() {
        let lexicon = teaching_lexicon();
        assert_eq!(
            lexicon.longest_regex_match("0xFF,"),
            Some((TokenKind::HexInt, 4))
        );
        assert_eq!(
            lexicon.longest_regex_match("089;"),
            Some((TokenKind::BadOctInt, 3))
        );
        assert_eq!(
            lexicon.longest_regex_match("beginx"),
            Some((TokenKind::Ident, 6))
        );
    }

    #[test]
    fn skip_and_recovery_distances() {
        let lexicon = teaching_lexicon();
        assert_eq!(lexicon.skippable_count("  \n\tx"), 4);
        assert_eq!(lexicon.skippable_count("x"), 0);
        assert_eq!(lexicon.distance_to_next_valid_byte("@@x"), 2);
    }
}
