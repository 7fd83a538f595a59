//! Tokens and a tokenizer for source lines.

use logos::Logos;

/// Maximum length of a single token in bytes. Longer tokens are truncated.
pub const MAX_TOKEN_LEN: usize = 47;

/// Maximum number of tokens read from a single line.
pub const MAX_TOKENS: usize = 12;

/// Pieces of a source line. Commas and whitespace outside of brackets separate tokens.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    #[error]
    #[regex(r"[ \t\r\n\f,]+", logos::skip)]
    Error,

    /// A bracketed memory operand such as `[R1]` or `[ R1 ]`. An unclosed bracket runs to the
    /// end of the line.
    #[regex(r"\[[^\]]*\]?")]
    Bracket(&'a str),

    /// Any run of characters that are neither separators nor an opening bracket.
    #[regex(r"[^ \t\r\n\f,\[]+")]
    Word(&'a str),
}

/// Returns true for lines that contain nothing to decode.
///
/// Blank lines and lines whose first non-space character is `;` or `#` are comments.
pub fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(';') || line.starts_with('#')
}

/// Splits a line into tokens.
///
/// Pieces that are not separated by a comma or whitespace are joined, so `x[R1]` is a single
/// token.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut lexer = Token::lexer(line.trim());
    let mut tokens: Vec<String> = Vec::new();
    let mut last_end = None;

    while let Some(token) = lexer.next() {
        let span = lexer.span();

        let piece = match token {
            Token::Bracket(piece) | Token::Word(piece) => piece,
            Token::Error => lexer.slice(),
        };

        match tokens.last_mut() {
            Some(previous) if last_end == Some(span.start) => previous.push_str(piece),
            _ => {
                if tokens.len() == MAX_TOKENS {
                    break;
                }

                tokens.push(piece.to_string());
            }
        }

        last_end = Some(span.end);
    }

    tokens
        .into_iter()
        .map(|token| truncate(token.trim(), MAX_TOKEN_LEN).to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Cuts `input` to at most `max` bytes without splitting a character.
pub(crate) fn truncate(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }

    let mut end = max;

    while !input.is_char_boundary(end) {
        end -= 1;
    }

    &input[..end]
}
