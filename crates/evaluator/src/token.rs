use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A token and the character offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Splits `input` into tokens. Whitespace separates tokens and is otherwise
/// ignored.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().enumerate().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut text = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_ascii_digit() || c == '.') {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::MalformedNumber { text, position })?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    position,
                });
                continue;
            }
            '+' => Token::Operator(Operator::Add),
            '-' => Token::Operator(Operator::Subtract),
            '*' => Token::Operator(Operator::Multiply),
            '/' => Token::Operator(Operator::Divide),
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            character => return Err(ParseError::InvalidCharacter { character, position }),
        };
        chars.next();
        tokens.push(Spanned { token, position });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn splits_numbers_operators_and_parens() {
        assert_eq!(
            kinds(" (1.5+ 20)*.5 "),
            vec![
                Token::LeftParen,
                Token::Number(1.5),
                Token::Operator(Operator::Add),
                Token::Number(20.0),
                Token::RightParen,
                Token::Operator(Operator::Multiply),
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn records_character_positions() {
        let positions: Vec<usize> = tokenize("12 - 3")
            .unwrap()
            .iter()
            .map(|spanned| spanned.position)
            .collect();
        assert_eq!(positions, vec![0, 3, 5]);
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(
            tokenize("2 ^ 3"),
            Err(ParseError::InvalidCharacter {
                character: '^',
                position: 2
            })
        );
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(matches!(
            tokenize("1.2.3 + 1"),
            Err(ParseError::MalformedNumber { position: 0, .. })
        ));
        assert!(matches!(
            tokenize("4 * ."),
            Err(ParseError::MalformedNumber { position: 4, .. })
        ));
    }
}
