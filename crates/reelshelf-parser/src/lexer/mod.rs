//! Logos-based lexer for release-name noise.
//!
//! Titles are cleaned word by word; a word is noise when the lexer consumes
//! it as exactly one [`Token`].

mod token;
pub use token::Token;

use logos::Logos;

/// Classify a single whitespace-free word.
///
/// Returns `None` unless the entire word is one noise token.
pub fn classify_word(word: &str) -> Option<Token> {
    if word.is_empty() {
        return None;
    }
    let mut lex = Token::lexer(word);
    match lex.next() {
        Some(Ok(token)) if lex.span().end == word.len() => Some(token),
        _ => None,
    }
}

/// Whether a word is release noise.
///
/// Hyphenated compounds whose leading part is noise (`x264-GROUP`,
/// `WEB-DL-TEAM`) count as noise too; `Spider-Man` does not.
pub fn is_noise_word(word: &str) -> bool {
    if classify_word(word).is_some() {
        return true;
    }
    word.match_indices('-')
        .any(|(idx, _)| classify_word(&word[..idx]).is_some())
}
