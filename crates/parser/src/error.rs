use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character `{ch}` at byte {at}")]
    UnexpectedChar { ch: char, at: usize },

    #[error("number out of bounds at byte {at}")]
    NumberOutOfBounds { at: usize },

    #[error("unterminated string literal starting at byte {at}")]
    UnterminatedString { at: usize },

    #[error("expected {expected}, found `{found}` at byte {at}")]
    UnexpectedToken {
        expected: String,
        found: String,
        at: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}
