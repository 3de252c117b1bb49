//! Host binding-language expressions.
//! - parse: scanner + Pratt parser for watch/binding expressions
//! - eval/eval_tracked: evaluation against a store, with optional
//!   dependency capture for observations

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::ModelError;
use crate::observe::DepKey;
use crate::store::ModelStore;
use crate::value::{loose_eq, Value};

/// Token naming the reactive root inside guarded expressions.
pub const ROOT_TOKEN: &str = "vm";

/// Binding-language expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(SmolStr),
    /// Boolean literal.
    Bool(bool),
    /// `null` literal.
    Null,
    /// `undefined` literal.
    Undefined,
    /// The reactive root (`vm`).
    Root,
    /// `object.name` member access.
    Member { object: Box<Expr>, name: SmolStr },
    /// `object[index]` member access.
    Index { object: Box<Expr>, index: Box<Expr> },
    /// Unary operator application.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operator application.
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators. `Eq` covers both `=` and `==`; `NotEq` covers `!=`
/// and `<>`. Equality is the loose host rule, not strict identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(SmolStr),
    Ident(SmolStr),
    AndAnd,
    OrOr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

/// Parse a binding expression. Empty input is an error.
pub fn parse(source: &str) -> Result<Expr, ModelError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(ModelError::parse("empty expression"));
    }
    let tokens = scan(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(ModelError::parse("trailing input after expression"));
    }
    Ok(expr)
}

fn scan(source: &str) -> Result<Vec<Token>, ModelError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos < chars.len()
                && chars[pos] == '.'
                && chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit())
            {
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text: String = chars[start..pos].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ModelError::parse(format!("invalid number '{text}'")))?;
            tokens.push(Token::Number(value));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            tokens.push(Token::Ident(SmolStr::new(text)));
            continue;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut text = String::new();
            let mut closed = false;
            while pos < chars.len() {
                let c = chars[pos];
                if c == quote {
                    closed = true;
                    pos += 1;
                    break;
                }
                if c == '\\' && pos + 1 < chars.len() {
                    text.push(chars[pos + 1]);
                    pos += 2;
                    continue;
                }
                text.push(c);
                pos += 1;
            }
            if !closed {
                return Err(ModelError::parse("unterminated string literal"));
            }
            tokens.push(Token::Str(SmolStr::new(text)));
            continue;
        }
        let two = chars.get(pos + 1).copied();
        let token = match (c, two) {
            ('&', Some('&')) => Some((Token::AndAnd, 2)),
            ('|', Some('|')) => Some((Token::OrOr, 2)),
            ('=', Some('=')) => Some((Token::Eq, 2)),
            ('!', Some('=')) => Some((Token::NotEq, 2)),
            ('<', Some('>')) => Some((Token::NotEq, 2)),
            ('<', Some('=')) => Some((Token::LtEq, 2)),
            ('>', Some('=')) => Some((Token::GtEq, 2)),
            ('=', _) => Some((Token::Eq, 1)),
            ('<', _) => Some((Token::Lt, 1)),
            ('>', _) => Some((Token::Gt, 1)),
            ('+', _) => Some((Token::Plus, 1)),
            ('-', _) => Some((Token::Minus, 1)),
            ('*', _) => Some((Token::Star, 1)),
            ('/', _) => Some((Token::Slash, 1)),
            ('%', _) => Some((Token::Percent, 1)),
            ('!', _) => Some((Token::Bang, 1)),
            ('.', _) => Some((Token::Dot, 1)),
            ('(', _) => Some((Token::LParen, 1)),
            (')', _) => Some((Token::RParen, 1)),
            ('[', _) => Some((Token::LBracket, 1)),
            (']', _) => Some((Token::RBracket, 1)),
            _ => None,
        };
        let Some((token, width)) = token else {
            return Err(ModelError::parse(format!("unexpected character '{c}'")));
        };
        tokens.push(token);
        pos += width;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: &Token, context: &str) -> Result<(), ModelError> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ModelError::parse(format!("expected {context}")))
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expr, ModelError> {
        let mut lhs = self.prefix()?;
        loop {
            let Some((op, power)) = self.peek().and_then(binary_op) else {
                break;
            };
            if power < min_power {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(power + 1)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ModelError> {
        let Some(token) = self.next() else {
            return Err(ModelError::parse("unexpected end of expression"));
        };
        let expr = match token {
            Token::Number(value) => Expr::Number(value),
            Token::Str(value) => Expr::Str(value),
            Token::Ident(name) => match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                name if name == ROOT_TOKEN => Expr::Root,
                other => {
                    return Err(ModelError::parse(format!("unexpected identifier '{other}'")));
                }
            },
            Token::Bang => {
                let operand = self.expression(UNARY_POWER)?;
                Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) }
            }
            Token::Minus => {
                let operand = self.expression(UNARY_POWER)?;
                Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(&Token::RParen, "')'")?;
                inner
            }
            other => {
                return Err(ModelError::parse(format!("unexpected token {other:?}")));
            }
        };
        self.postfix(expr)
    }

    fn postfix(&mut self, mut expr: Expr) -> Result<Expr, ModelError> {
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let Some(Token::Ident(name)) = self.next() else {
                        return Err(ModelError::parse("expected member name after '.'"));
                    };
                    expr = Expr::Member { object: Box::new(expr), name };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression(0)?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
                }
                _ => return Ok(expr),
            }
        }
    }
}

const UNARY_POWER: u8 = 7;

fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    let pair = match token {
        Token::OrOr => (BinaryOp::Or, 1),
        Token::AndAnd => (BinaryOp::And, 2),
        Token::Eq => (BinaryOp::Eq, 3),
        Token::NotEq => (BinaryOp::NotEq, 3),
        Token::Lt => (BinaryOp::Lt, 4),
        Token::LtEq => (BinaryOp::LtEq, 4),
        Token::Gt => (BinaryOp::Gt, 4),
        Token::GtEq => (BinaryOp::GtEq, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Star => (BinaryOp::Mul, 6),
        Token::Slash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    };
    Some(pair)
}

/// Evaluate `expr` against `root` without dependency capture.
pub fn eval(store: &ModelStore, root: &Value, expr: &Expr) -> Result<Value, ModelError> {
    eval_tracked(store, root, expr, &mut Vec::new())
}

/// Evaluate `expr` against `root`, appending every `(container, key)` read
/// to `deps` so the caller can subscribe an observation to them.
pub fn eval_tracked(
    store: &ModelStore,
    root: &Value,
    expr: &Expr,
    deps: &mut Vec<DepKey>,
) -> Result<Value, ModelError> {
    match expr {
        Expr::Number(value) => Ok(Value::Number(*value)),
        Expr::Str(value) => Ok(Value::Str(value.clone())),
        Expr::Bool(value) => Ok(Value::Bool(*value)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Root => Ok(root.clone()),
        Expr::Member { object, name } => {
            let object = eval_tracked(store, root, object, deps)?;
            store.read_member_tracked(&object, name, deps)
        }
        Expr::Index { object, index } => {
            let object = eval_tracked(store, root, object, deps)?;
            let index = eval_tracked(store, root, index, deps)?;
            store.read_member_tracked(&object, &index_key(&index), deps)
        }
        Expr::Unary { op, operand } => {
            let operand = eval_tracked(store, root, operand, deps)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!operand.is_truthy()),
                UnaryOp::Neg => Value::Number(-operand.to_number()),
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            // && and || short-circuit and yield the operand value itself,
            // which is what makes guarded chains return the member value.
            if let BinaryOp::And = op {
                let lhs = eval_tracked(store, root, lhs, deps)?;
                if !lhs.is_truthy() {
                    return Ok(lhs);
                }
                return eval_tracked(store, root, rhs, deps);
            }
            if let BinaryOp::Or = op {
                let lhs = eval_tracked(store, root, lhs, deps)?;
                if lhs.is_truthy() {
                    return Ok(lhs);
                }
                return eval_tracked(store, root, rhs, deps);
            }
            let lhs = eval_tracked(store, root, lhs, deps)?;
            let rhs = eval_tracked(store, root, rhs, deps)?;
            binary(*op, &lhs, &rhs)
        }
    }
}

fn index_key(index: &Value) -> SmolStr {
    match index {
        Value::Str(key) => key.clone(),
        Value::Number(value) if value.fract() == 0.0 && value.is_finite() => {
            #[allow(clippy::cast_possible_truncation)]
            SmolStr::new((*value as i64).to_string())
        }
        other => SmolStr::new(format!("{}", other.to_number())),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ModelError> {
    let value = match op {
        BinaryOp::Or | BinaryOp::And => unreachable!("short-circuit ops handled by caller"),
        BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
        BinaryOp::NotEq => Value::Bool(!loose_eq(lhs, rhs)),
        BinaryOp::Lt => relational(lhs, rhs, |ord| ord == std::cmp::Ordering::Less),
        BinaryOp::LtEq => relational(lhs, rhs, |ord| ord != std::cmp::Ordering::Greater),
        BinaryOp::Gt => relational(lhs, rhs, |ord| ord == std::cmp::Ordering::Greater),
        BinaryOp::GtEq => relational(lhs, rhs, |ord| ord != std::cmp::Ordering::Less),
        BinaryOp::Add => {
            if let (Value::Str(_), _) | (_, Value::Str(_)) = (lhs, rhs) {
                Value::Str(SmolStr::new(format!("{}{}", display(lhs), display(rhs))))
            } else {
                Value::Number(lhs.to_number() + rhs.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => {
            let divisor = rhs.to_number();
            if divisor == 0.0 {
                return Err(ModelError::DivisionByZero);
            }
            Value::Number(lhs.to_number() / divisor)
        }
        BinaryOp::Rem => {
            let divisor = rhs.to_number();
            if divisor == 0.0 {
                return Err(ModelError::ModuloByZero);
            }
            Value::Number(lhs.to_number() % divisor)
        }
    };
    Ok(value)
}

fn relational(lhs: &Value, rhs: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Value::Bool(test(a.cmp(b)));
    }
    let (a, b) = (lhs.to_number(), rhs.to_number());
    match a.partial_cmp(&b) {
        Some(ord) => Value::Bool(test(ord)),
        None => Value::Bool(false),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(value) => value.to_string(),
        Value::Number(value) => {
            if value.fract() == 0.0 && value.is_finite() {
                #[allow(clippy::cast_possible_truncation)]
                return (*value as i64).to_string();
            }
            value.to_string()
        }
        Value::Str(value) => value.to_string(),
        Value::Function(function) => format!("function {}", function.name),
        other => format!("[{}]", other.kind_word()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModelStore;

    fn person(store: &ModelStore) -> Value {
        let hobbies = store.new_seq("Array");
        let record = store.new_record("Person");
        store.init_field(record, "name", Value::from("Astrid"));
        store.init_field(record, "age", Value::from(34));
        store.init_field(record, "hobbies", Value::Seq(hobbies));
        Value::Record(record)
    }

    #[test]
    fn guarded_chain_survives_empty_sequence() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("(vm.hobbies && vm.hobbies.length)").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn guarded_chain_yields_guard_value_when_missing() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("(vm.missing && vm.missing.length)").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Undefined);
    }

    #[test]
    fn unguarded_chain_through_missing_member_errors() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("vm.missing.length").unwrap();
        assert_eq!(
            eval(&store, &root, &expr),
            Err(ModelError::MemberOfUndefined("length".into()))
        );
    }

    #[test]
    fn comparison_uses_loose_equality() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("vm.age = 34").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Bool(true));
        let expr = parse("vm.age == '34'").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Bool(true));
        let expr = parse("vm.age <> 34").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Bool(false));
    }

    #[test]
    fn plus_concatenates_with_strings() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("vm.name + '!'").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::from("Astrid!"));
        let expr = parse("vm.age + 1").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::Number(35.0));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let store = ModelStore::new();
        let root = person(&store);
        let expr = parse("vm.age / 0").unwrap();
        assert_eq!(eval(&store, &root, &expr), Err(ModelError::DivisionByZero));
    }

    #[test]
    fn index_access_reads_elements() {
        let store = ModelStore::new();
        let root = person(&store);
        let hobbies = match eval(&store, &root, &parse("vm.hobbies").unwrap()).unwrap() {
            Value::Seq(id) => id,
            other => panic!("expected seq, got {other:?}"),
        };
        store.fill_seq(hobbies, vec![Value::from("reading"), Value::from("sailing")]);
        let expr = parse("vm.hobbies[1]").unwrap();
        assert_eq!(eval(&store, &root, &expr).unwrap(), Value::from("sailing"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("vm.").is_err());
        assert!(parse("#nope").is_err());
        assert!(parse("(vm.a").is_err());
        assert!(parse("unknown").is_err());
    }
}
