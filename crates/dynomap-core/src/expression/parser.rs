//! Splitter for caller-supplied update expressions.
//!
//! Breaks an `UpdateExpression` back into its keyword buckets so it can be
//! merged with derived actions. Keywords are matched case-insensitively and
//! only at the top level; actions are separated by commas outside parentheses.
//! Action text is kept verbatim apart from whitespace normalization.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ExpressionError;
use super::update::{UpdateExpressions, UpdateKeyword};

/// Lexer token for update expressions.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// A run of path, alias, or identifier characters with its byte span.
    Word { start: usize, end: usize },
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,` with its byte offset.
    Comma(usize),
    /// Any other non-whitespace character.
    Other,
    /// End of input.
    Eof,
}

/// Tokenizer over an update expression.
struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn next_token(&mut self) -> Token {
        while self.chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.chars.next();
        }

        let Some(&(pos, ch)) = self.chars.peek() else {
            return Token::Eof;
        };

        match ch {
            '(' => {
                self.chars.next();
                Token::LParen
            }
            ')' => {
                self.chars.next();
                Token::RParen
            }
            ',' => {
                self.chars.next();
                Token::Comma(pos)
            }
            c if is_word_char(c) => self.read_word(pos),
            _ => {
                self.chars.next();
                Token::Other
            }
        }
    }

    fn read_word(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if !is_word_char(c) {
                break;
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }
        Token::Word { start, end }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | ':' | '.' | '[' | ']')
}

/// Split an update expression into keyword buckets.
///
/// # Examples
///
/// ```
/// use dynomap_core::expression::parse_update;
///
/// let parsed = parse_update("set #a = :a, #b = list_append(#b, :b) remove #c").unwrap();
/// assert_eq!(parsed.set, vec!["#a = :a", "#b = list_append(#b, :b)"]);
/// assert_eq!(parsed.remove, vec!["#c"]);
/// ```
pub fn parse_update(input: &str) -> Result<UpdateExpressions, ExpressionError> {
    let mut lexer = Lexer::new(input);
    let mut parsed = UpdateExpressions::default();
    let mut keyword: Option<UpdateKeyword> = None;
    let mut action_start = 0;
    let mut depth = 0_usize;

    loop {
        match lexer.next_token() {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.checked_sub(1).ok_or_else(|| unbalanced(input))?;
            }
            Token::Comma(pos) if depth == 0 => {
                let Some(kw) = keyword else {
                    return Err(unexpected("SET, ADD, REMOVE or DELETE", ","));
                };
                parsed.push(kw, take_action(input, action_start, pos, kw)?);
                action_start = pos + 1;
            }
            Token::Word { start, end } if depth == 0 => {
                let Some(next) = UpdateKeyword::from_word(lexer.slice(start, end)) else {
                    if keyword.is_none() {
                        return Err(unexpected(
                            "SET, ADD, REMOVE or DELETE",
                            lexer.slice(start, end),
                        ));
                    }
                    continue;
                };
                if let Some(kw) = keyword {
                    parsed.push(kw, take_action(input, action_start, start, kw)?);
                }
                keyword = Some(next);
                action_start = end;
            }
            Token::Eof => break,
            Token::Comma(_) | Token::Word { .. } | Token::Other => {
                if keyword.is_none() {
                    return Err(unexpected("SET, ADD, REMOVE or DELETE", input.trim()));
                }
            }
        }
    }

    if depth != 0 {
        return Err(unbalanced(input));
    }
    if let Some(kw) = keyword {
        parsed.push(kw, take_action(input, action_start, input.len(), kw)?);
    }
    Ok(parsed)
}

fn take_action(
    input: &str,
    start: usize,
    end: usize,
    keyword: UpdateKeyword,
) -> Result<String, ExpressionError> {
    let action = input[start..end].split_whitespace().collect::<Vec<_>>().join(" ");
    if action.is_empty() {
        return Err(ExpressionError::EmptyAction {
            keyword: keyword.as_str().to_owned(),
        });
    }
    Ok(action)
}

fn unexpected(expected: &str, found: &str) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        expected: expected.to_owned(),
        found: found.to_owned(),
    }
}

fn unbalanced(input: &str) -> ExpressionError {
    ExpressionError::UnbalancedParentheses {
        expression: input.to_owned(),
    }
}
