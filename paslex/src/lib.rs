pub mod kinds;
pub mod lexicon;
pub mod stream;

pub use crate::kinds::TokenKind;
pub use crate::lexicon::{teaching_lexicon, Lexicon, LexiconError};
pub use crate::stream::{Error, Location, Token, TokenStream, MAX_LEXEME_LEN};
