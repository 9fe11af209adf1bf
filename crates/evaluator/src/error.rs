use thiserror::Error;

/// The expression text could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("malformed number '{text}' at position {position}")]
    MalformedNumber { text: String, position: usize },
    #[error("mismatched parenthesis at position {position}")]
    MismatchedParen { position: usize },
    #[error("unexpected token at position {position}")]
    UnexpectedToken { position: usize },
    #[error("expression nested too deeply at position {position}")]
    TooDeep { position: usize },
    #[error("empty expression")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("division by zero")]
    DivisionByZero,
    #[error("missing operand at position {position}")]
    MissingOperand { position: usize },
}
