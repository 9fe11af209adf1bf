//! Arithmetic over `f64`: numbers, `+ - * /`, parentheses, and prefix minus.

mod error;
mod parser;
mod token;

pub use error::{EvalError, ParseError};
pub use parser::{evaluate, MAX_DEPTH};
pub use token::{tokenize, Operator, Spanned, Token};

/// One successfully evaluated expression.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: f64,
}

/// Evaluator that remembers its last result and what produced it.
#[derive(Debug, Default)]
pub struct Calculator {
    last_result: f64,
    history: Vec<HistoryEntry>,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `expression`. Failures leave the last result and the history
    /// untouched.
    pub fn evaluate(&mut self, expression: &str) -> Result<f64, EvalError> {
        let result = evaluate(expression)?;
        self.last_result = result;
        self.history.push(HistoryEntry {
            expression: expression.trim().to_string(),
            result,
        });
        Ok(result)
    }

    /// Result of the last successful evaluation, `0.0` before any.
    pub fn last_result(&self) -> f64 {
        self.last_result
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
