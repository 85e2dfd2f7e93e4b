//! `if-feature` boolean expressions
//!
//! Tokens are separated by whitespace and parentheses; `and`, `or` and `not`
//! are keywords, everything else is a (possibly prefixed) feature name.
//! Precedence from strongest to weakest: parentheses, `not`, `and`, `or`.

use crate::statement::is_identifier_ref;
use std::fmt;
use thiserror::Error;

/// Why an expression is not well formed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IfFeatureError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected '{token}'")]
    UnexpectedToken { token: String },

    #[error("expression ends unexpectedly")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("'{name}' is not a valid feature name")]
    InvalidFeatureName { name: String },

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Name(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::Name(name) => f.write_str(name),
        }
    }
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        tokens.push(match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Name(word.clone()),
        });
        word.clear();
    };
    for c in expression.chars() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// A parsed `if-feature` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfFeatureExpr {
    Feature(String),
    Not(Box<IfFeatureExpr>),
    And(Vec<IfFeatureExpr>),
    Or(Vec<IfFeatureExpr>),
}

impl IfFeatureExpr {
    pub fn parse(expression: &str) -> Result<Self, IfFeatureError> {
        let tokens = tokenize(expression);
        if tokens.is_empty() {
            return Err(IfFeatureError::Empty);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(Token::Close) => Err(IfFeatureError::UnbalancedParentheses),
            Some(token) => Err(IfFeatureError::UnexpectedToken {
                token: token.to_string(),
            }),
        }
    }

    /// Evaluate with `is_supported` deciding each feature name
    pub fn evaluate(&self, is_supported: &dyn Fn(&str) -> bool) -> bool {
        match self {
            IfFeatureExpr::Feature(name) => is_supported(name),
            IfFeatureExpr::Not(inner) => !inner.evaluate(is_supported),
            IfFeatureExpr::And(all) => all.iter().all(|e| e.evaluate(is_supported)),
            IfFeatureExpr::Or(any) => any.iter().any(|e| e.evaluate(is_supported)),
        }
    }

    /// Feature names referenced by the expression, in order of appearance
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'e>(&'e self, names: &mut Vec<&'e str>) {
        match self {
            IfFeatureExpr::Feature(name) => names.push(name),
            IfFeatureExpr::Not(inner) => inner.collect_names(names),
            IfFeatureExpr::And(items) | IfFeatureExpr::Or(items) => {
                for item in items {
                    item.collect_names(names);
                }
            }
        }
    }
}

/// Check the syntax of an expression without keeping the result
pub fn check_syntax(expression: &str) -> Result<(), IfFeatureError> {
    IfFeatureExpr::parse(expression).map(|_| ())
}

/// Maximum nesting of parentheses and `not`
const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<IfFeatureExpr, IfFeatureError> {
        let mut items = vec![self.and_expr()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            items.push(self.and_expr()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            IfFeatureExpr::Or(items)
        })
    }

    fn and_expr(&mut self) -> Result<IfFeatureExpr, IfFeatureError> {
        let mut items = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            items.push(self.unary()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            IfFeatureExpr::And(items)
        })
    }

    fn unary(&mut self) -> Result<IfFeatureExpr, IfFeatureError> {
        if self.depth >= MAX_NESTING {
            return Err(IfFeatureError::TooDeep { limit: MAX_NESTING });
        }
        self.depth += 1;
        let expr = self.primary();
        self.depth -= 1;
        expr
    }

    fn primary(&mut self) -> Result<IfFeatureExpr, IfFeatureError> {
        match self.next() {
            None => Err(IfFeatureError::UnexpectedEnd),
            Some(Token::Not) => Ok(IfFeatureExpr::Not(Box::new(self.unary()?))),
            Some(Token::Open) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    None => Err(IfFeatureError::UnbalancedParentheses),
                    Some(token) => Err(IfFeatureError::UnexpectedToken {
                        token: token.to_string(),
                    }),
                }
            }
            Some(Token::Name(name)) => {
                if is_identifier_ref(&name) {
                    Ok(IfFeatureExpr::Feature(name))
                } else {
                    Err(IfFeatureError::InvalidFeatureName { name })
                }
            }
            Some(Token::Close) => Err(IfFeatureError::UnbalancedParentheses),
            Some(token) => Err(IfFeatureError::UnexpectedToken {
                token: token.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported(names: &[&str]) -> impl Fn(&str) -> bool {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        move |name| names.iter().any(|n| n == name)
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            IfFeatureExpr::parse(&nested),
            Err(IfFeatureError::TooDeep { limit: MAX_NESTING })
        );
        let negated = format!("{}a", "not ".repeat(10_000));
        assert!(matches!(
            IfFeatureExpr::parse(&negated),
            Err(IfFeatureError::TooDeep { .. })
        ));

        let shallow = format!("{}a{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(IfFeatureExpr::parse(&shallow), Ok(IfFeatureExpr::Feature("a".into())));
    }

    #[test]
    fn test_precedence() {
        let expr = IfFeatureExpr::parse("a or b and not c").unwrap();
        assert_eq!(
            expr,
            IfFeatureExpr::Or(vec![
                IfFeatureExpr::Feature("a".into()),
                IfFeatureExpr::And(vec![
                    IfFeatureExpr::Feature("b".into()),
                    IfFeatureExpr::Not(Box::new(IfFeatureExpr::Feature("c".into()))),
                ]),
            ])
        );
        assert!(expr.evaluate(&supported(&["b"])));
        assert!(!expr.evaluate(&supported(&["b", "c"])));
    }

    #[test]
    fn test_parentheses_without_spaces() {
        let expr = IfFeatureExpr::parse("(x:a or b)and(c)").unwrap();
        assert_eq!(expr.feature_names(), vec!["x:a", "b", "c"]);
        assert!(expr.evaluate(&supported(&["x:a", "c"])));
        assert!(!expr.evaluate(&supported(&["x:a"])));
    }

    #[test]
    fn test_three_way_and() {
        let expr = IfFeatureExpr::parse("F11 and F12 and F13").unwrap();
        assert!(!expr.evaluate(&supported(&["F11", "F12"])));
        assert!(expr.evaluate(&supported(&["F11", "F12", "F13"])));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(check_syntax("  "), Err(IfFeatureError::Empty));
        assert_eq!(check_syntax("a and"), Err(IfFeatureError::UnexpectedEnd));
        assert_eq!(check_syntax("(a or b"), Err(IfFeatureError::UnbalancedParentheses));
        assert_eq!(check_syntax("a or b)"), Err(IfFeatureError::UnbalancedParentheses));
        assert!(matches!(check_syntax("a b"), Err(IfFeatureError::UnexpectedToken { .. })));
        assert!(matches!(check_syntax("and a"), Err(IfFeatureError::UnexpectedToken { .. })));
        assert!(matches!(
            check_syntax("1x"),
            Err(IfFeatureError::InvalidFeatureName { .. })
        ));
        assert!(check_syntax("not not a").is_ok());
    }
}
