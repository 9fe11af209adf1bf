//! Recursive-descent evaluation over the token stream.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := unary (('*' | '/') unary)*
//! unary      := '-' unary | primary
//! primary    := number | '(' expression ')'
//! ```

use crate::error::{EvalError, ParseError};
use crate::token::{tokenize, Operator, Spanned, Token};

/// Deepest run of nested parentheses and prefix minuses accepted.
pub const MAX_DEPTH: usize = 256;

/// Evaluates `expression` with the usual precedence: `*` and `/` bind tighter
/// than `+` and `-`, and operators of equal precedence associate left.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty.into());
    }
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        end: expression.chars().count(),
        depth: 0,
    };
    let value = parser.expression()?;
    match parser.peek() {
        None => Ok(value),
        Some(Spanned {
            token: Token::RightParen,
            position,
        }) => Err(ParseError::MismatchedParen { position }.into()),
        Some(Spanned { position, .. }) => Err(ParseError::UnexpectedToken { position }.into()),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    cursor: usize,
    end: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Spanned> {
        self.tokens.get(self.cursor).copied()
    }

    fn next_operator(&mut self, accepted: &[Operator]) -> Option<Operator> {
        match self.peek()?.token {
            Token::Operator(op) if accepted.contains(&op) => {
                self.cursor += 1;
                Some(op)
            }
            _ => None,
        }
    }

    /// Runs `body` one nesting level deeper; fails past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        position: usize,
        body: impl FnOnce(&mut Self) -> Result<f64, EvalError>,
    ) -> Result<f64, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep { position }.into());
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op) = self.next_operator(&[Operator::Add, Operator::Subtract]) {
            let rhs = self.term()?;
            value = apply(op, value, rhs)?;
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_operator(&[Operator::Multiply, Operator::Divide]) {
            let rhs = self.unary()?;
            value = apply(op, value, rhs)?;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Spanned {
                token: Token::Operator(Operator::Subtract),
                position,
            }) => {
                self.cursor += 1;
                self.nested(position, |parser| parser.unary())
                    .map(|value| -value)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        let Some(Spanned { token, position }) = self.peek() else {
            return Err(EvalError::MissingOperand { position: self.end });
        };
        match token {
            Token::Number(value) => {
                self.cursor += 1;
                Ok(value)
            }
            Token::LeftParen => {
                self.cursor += 1;
                let value = self.nested(position, |parser| parser.expression())?;
                match self.peek() {
                    Some(Spanned {
                        token: Token::RightParen,
                        ..
                    }) => {
                        self.cursor += 1;
                        Ok(value)
                    }
                    None => Err(ParseError::MismatchedParen { position }.into()),
                    Some(Spanned { position, .. }) => {
                        Err(ParseError::UnexpectedToken { position }.into())
                    }
                }
            }
            Token::Operator(_) | Token::RightParen => Err(EvalError::MissingOperand { position }),
        }
    }
}

fn apply(op: Operator, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    Ok(match op {
        Operator::Add => lhs + rhs,
        Operator::Subtract => lhs - rhs,
        Operator::Multiply => lhs * rhs,
        Operator::Divide if rhs == 0.0 => return Err(EvalError::DivisionByZero),
        Operator::Divide => lhs / rhs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(evaluate("2 + 3 * 4"), Ok(14.0));
        assert_eq!(evaluate("(2 + 3) * 4"), Ok(20.0));
        assert_eq!(evaluate("10 - 4 - 3"), Ok(3.0));
        assert_eq!(evaluate("64 / 4 / 2"), Ok(8.0));
        assert_eq!(evaluate("1.5 * .5"), Ok(0.75));
    }

    #[test]
    fn accepts_prefix_minus() {
        assert_eq!(evaluate("-3 + 5"), Ok(2.0));
        assert_eq!(evaluate("2 * -(1 + 1)"), Ok(-4.0));
        assert_eq!(evaluate("--4"), Ok(4.0));
    }

    #[test]
    fn division_by_zero_is_an_eval_error() {
        assert_eq!(evaluate("1 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn reports_missing_operands() {
        assert_eq!(
            evaluate("1 +"),
            Err(EvalError::MissingOperand { position: 3 })
        );
        assert_eq!(
            evaluate("* 2"),
            Err(EvalError::MissingOperand { position: 0 })
        );
        assert_eq!(
            evaluate("()"),
            Err(EvalError::MissingOperand { position: 1 })
        );
    }

    #[test]
    fn reports_mismatched_parens() {
        assert_eq!(
            evaluate("(1 + 2"),
            Err(ParseError::MismatchedParen { position: 0 }.into())
        );
        assert_eq!(
            evaluate("1 + 2)"),
            Err(ParseError::MismatchedParen { position: 5 }.into())
        );
    }

    #[test]
    fn deep_nesting_is_rejected_instead_of_recursing() {
        let parens = "(".repeat(100_000);
        assert_eq!(
            evaluate(&parens),
            Err(ParseError::TooDeep {
                position: MAX_DEPTH
            }
            .into())
        );

        let minuses = "-".repeat(100_000) + "1";
        assert_eq!(
            evaluate(&minuses),
            Err(ParseError::TooDeep {
                position: MAX_DEPTH
            }
            .into())
        );
    }

    #[test]
    fn nesting_up_to_the_limit_still_evaluates() {
        let input = format!("{}7{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&input), Ok(7.0));
        let input = "-".repeat(MAX_DEPTH) + "3";
        assert_eq!(evaluate(&input), Ok(3.0));
    }

    #[test]
    fn rejects_empty_and_adjacent_numbers() {
        assert_eq!(evaluate("   "), Err(ParseError::Empty.into()));
        assert_eq!(
            evaluate("1 2"),
            Err(ParseError::UnexpectedToken { position: 2 }.into())
        );
    }
}
