//! 算术表达式求值
//!
//! 递归下降实现，语法与常见表达式库保持一致：
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := unary (('*' | '/' | '%') unary | implicit)*
//! implicit   := power                       // 2pi, 2(3+1)
//! unary      := ('+' | '-') unary | power
//! power      := postfix ('^' unary)?        // 右结合，-2^2 = -4
//! postfix    := primary '!'*
//! primary    := number | ident | ident '(' args ')' | '(' expression ')'
//! ```
//!
//! 求值失败返回 [`EvaluationError`]，由调用方决定如何兜底。

use std::fmt;

use phf::phf_map;
use thiserror::Error;

/// 求值错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("表达式为空")]
    Empty,
    #[error("位置 {pos} 出现无法识别的字符 '{ch}'")]
    UnexpectedCharacter { ch: char, pos: usize },
    #[error("位置 {pos} 出现意外的符号 '{found}'")]
    UnexpectedToken { found: String, pos: usize },
    #[error("表达式意外结束")]
    UnexpectedEnd,
    #[error("未知符号: {0}")]
    UnknownSymbol(String),
    #[error("未知函数: {0}")]
    UnknownFunction(String),
    #[error("函数 {name} 的参数个数不正确: {found}")]
    Arity { name: String, found: usize },
    #[error("阶乘只支持非负整数: {0}")]
    InvalidFactorial(f64),
    #[error("结果不是实数")]
    NotReal,
    #[error("表达式嵌套超过 {0} 层")]
    TooDeep(usize),
}

type EvalResult<T> = Result<T, EvaluationError>;

/// 括号、正负号、乘方的最大嵌套层数
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Copy)]
enum Function {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Variadic {
        min_args: usize,
        max_args: usize,
        apply: fn(&[f64]) -> f64,
    },
}

static FUNCTIONS: phf::Map<&'static str, Function> = phf_map! {
    "sqrt" => Function::Unary(f64::sqrt),
    "cbrt" => Function::Unary(f64::cbrt),
    "abs" => Function::Unary(f64::abs),
    "exp" => Function::Unary(f64::exp),
    "ln" => Function::Unary(f64::ln),
    "log2" => Function::Unary(f64::log2),
    "log10" => Function::Unary(f64::log10),
    "sin" => Function::Unary(f64::sin),
    "cos" => Function::Unary(f64::cos),
    "tan" => Function::Unary(f64::tan),
    "asin" => Function::Unary(f64::asin),
    "acos" => Function::Unary(f64::acos),
    "atan" => Function::Unary(f64::atan),
    "sinh" => Function::Unary(f64::sinh),
    "cosh" => Function::Unary(f64::cosh),
    "tanh" => Function::Unary(f64::tanh),
    "floor" => Function::Unary(f64::floor),
    "ceil" => Function::Unary(f64::ceil),
    "round" => Function::Unary(f64::round),
    "sign" => Function::Unary(sign),
    "pow" => Function::Binary(f64::powf),
    "atan2" => Function::Binary(f64::atan2),
    "nthRoot" => Function::Binary(nth_root),
    "mod" => Function::Binary(modulo),
    "log" => Function::Variadic { min_args: 1, max_args: 2, apply: log },
    "min" => Function::Variadic { min_args: 1, max_args: usize::MAX, apply: min },
    "max" => Function::Variadic { min_args: 1, max_args: usize::MAX, apply: max },
};

static CONSTANTS: phf::Map<&'static str, f64> = phf_map! {
    "pi" => std::f64::consts::PI,
    "PI" => std::f64::consts::PI,
    "e" => std::f64::consts::E,
    "E" => std::f64::consts::E,
    "tau" => std::f64::consts::TAU,
    "phi" => 1.618_033_988_749_895,
};

fn sign(x: f64) -> f64 {
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

fn nth_root(x: f64, n: f64) -> f64 {
    // 负数开奇次方
    if x < 0.0 && n.fract() == 0.0 && (n as i64) % 2 != 0 {
        -(-x).powf(1.0 / n)
    } else {
        x.powf(1.0 / n)
    }
}

fn modulo(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        x
    } else {
        x - y * (x / y).floor()
    }
}

fn log(args: &[f64]) -> f64 {
    match args {
        [x] => x.ln(),
        [x, base, ..] => x.ln() / base.ln(),
        [] => f64::NAN,
    }
}

fn min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn factorial(n: f64) -> EvalResult<f64> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(EvaluationError::InvalidFactorial(n));
    }
    if n > 170.0 {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Caret => f.write_str("^"),
            Token::Bang => f.write_str("!"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// 数字字面量：`12`、`3.5`、`.5`、`1e3`
fn lex_number(input: &str, start: usize) -> EvalResult<(f64, usize)> {
    let mut end = start + count_digits(&input[start..]);
    let int_digits = end - start;
    let mut frac_digits = 0;

    if input[end..].starts_with('.') {
        frac_digits = count_digits(&input[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return Err(EvaluationError::UnexpectedCharacter { ch: '.', pos: start });
    }

    // 指数部分后面必须跟数字，否则 `2e` 按 2 * e 处理
    let rest = &input[end..];
    if rest.starts_with(['e', 'E']) {
        let sign_len = usize::from(rest[1..].starts_with(['+', '-']));
        let exp_digits = count_digits(&rest[1 + sign_len..]);
        if exp_digits > 0 {
            end += 1 + sign_len + exp_digits;
        }
    }

    let value = input[start..end]
        .parse::<f64>()
        .map_err(|_| EvaluationError::UnexpectedCharacter { ch: '.', pos: start })?;
    Ok((value, end))
}

fn tokenize(input: &str) -> EvalResult<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (value, end) = lex_number(input, pos)?;
            tokens.push((Token::Number(value), pos));
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let len = input[pos..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            tokens.push((Token::Ident(input[pos..pos + len].to_string()), pos));
            pos += len;
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '!' => Token::Bang,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            other => return Err(EvaluationError::UnexpectedCharacter { ch: other, pos }),
        };
        tokens.push((token, pos));
        pos += c.len_utf8();
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.cursor).cloned();
        if item.is_some() {
            self.cursor += 1;
        }
        item
    }

    fn unexpected(token: Token, pos: usize) -> EvaluationError {
        EvaluationError::UnexpectedToken {
            found: token.to_string(),
            pos,
        }
    }

    fn expression(&mut self) -> EvalResult<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> EvalResult<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value /= self.unary()?;
                }
                Some(Token::Percent) => {
                    self.advance();
                    value = modulo(value, self.unary()?);
                }
                // 隐式乘法
                Some(Token::Ident(_)) | Some(Token::LParen) => {
                    value *= self.power()?;
                }
                _ => return Ok(value),
            }
        }
    }

    /// 每层括号、正负号和乘方右侧都会经过这里，在此限制递归深度
    fn unary(&mut self) -> EvalResult<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(EvaluationError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> EvalResult<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> EvalResult<f64> {
        let base = self.postfix()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> EvalResult<f64> {
        let mut value = self.primary()?;
        while matches!(self.peek(), Some(Token::Bang)) {
            self.advance();
            value = factorial(value)?;
        }
        Ok(value)
    }

    fn primary(&mut self) -> EvalResult<f64> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(value),
            Some((Token::LParen, _)) => {
                let value = self.expression()?;
                self.expect_close()?;
                Ok(value)
            }
            Some((Token::Ident(name), _)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let args = self.arguments()?;
                    call(&name, &args)
                } else {
                    CONSTANTS
                        .get(name.as_str())
                        .copied()
                        .ok_or(EvaluationError::UnknownSymbol(name))
                }
            }
            Some((token, pos)) => Err(Self::unexpected(token, pos)),
            None => Err(EvaluationError::UnexpectedEnd),
        }
    }

    fn expect_close(&mut self) -> EvalResult<()> {
        match self.advance() {
            Some((Token::RParen, _)) => Ok(()),
            Some((token, pos)) => Err(Self::unexpected(token, pos)),
            None => Err(EvaluationError::UnexpectedEnd),
        }
    }

    fn arguments(&mut self) -> EvalResult<Vec<f64>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some((Token::Comma, _)) => continue,
                Some((Token::RParen, _)) => return Ok(args),
                Some((token, pos)) => return Err(Self::unexpected(token, pos)),
                None => return Err(EvaluationError::UnexpectedEnd),
            }
        }
    }
}

fn call(name: &str, args: &[f64]) -> EvalResult<f64> {
    let function = FUNCTIONS
        .get(name)
        .copied()
        .ok_or_else(|| EvaluationError::UnknownFunction(name.to_string()))?;

    let arity_error = || EvaluationError::Arity {
        name: name.to_string(),
        found: args.len(),
    };

    match (function, args) {
        (Function::Unary(apply), [x]) => Ok(apply(*x)),
        (Function::Binary(apply), [x, y]) => Ok(apply(*x, *y)),
        (
            Function::Variadic {
                min_args,
                max_args,
                apply,
            },
            args,
        ) if (min_args..=max_args).contains(&args.len()) => Ok(apply(args)),
        _ => Err(arity_error()),
    }
}

/// 计算算术表达式的值
///
/// 相同输入永远得到相同结果；语法错误、未知符号、非实数结果都返回错误。
/// 除以零得到无穷大，不算错误。
pub fn evaluate(expression: &str) -> Result<f64, EvaluationError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(EvaluationError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let value = parser.expression()?;

    if let Some((token, pos)) = parser.advance() {
        return Err(Parser::unexpected(token, pos));
    }
    if value.is_nan() {
        return Err(EvaluationError::NotReal);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> f64 {
        evaluate(s).unwrap_or_else(|e| panic!("{} 求值失败: {}", s, e))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(eval("2+2"), 4.0);
        assert_eq!(eval("2+3*4"), 14.0);
        assert_eq!(eval("(2+3)*4"), 20.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("12 / 4 / 3"), 1.0);
        assert_eq!(eval(" 3 * 3 "), 9.0);
        assert_eq!(eval("17 % 5"), 2.0);
    }

    #[test]
    fn test_power_and_unary() {
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("2^-1"), 0.5);
        assert_eq!(eval("--3"), 3.0);
        assert_eq!(eval("+5"), 5.0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(eval(".5"), 0.5);
        assert_eq!(eval("5."), 5.0);
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5E-2"), 0.025);
        assert!(approx(eval("0.1+0.2"), 0.3));
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("abs(-3)"), 3.0);
        assert_eq!(eval("pow(2, 10)"), 1024.0);
        assert_eq!(eval("max(1, 7, 3)"), 7.0);
        assert_eq!(eval("min(4)"), 4.0);
        assert_eq!(eval("nthRoot(-8, 3)"), -2.0);
        assert_eq!(eval("mod(-1, 3)"), 2.0);
        assert_eq!(eval("sign(0)"), 0.0);
        assert!(approx(eval("log(100, 10)"), 2.0));
        assert!(approx(eval("log(e)"), 1.0));
        assert!(approx(eval("sin(pi/2)"), 1.0));
        assert!(approx(eval("2pi"), std::f64::consts::TAU));
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("2(3+1)"), 8.0);
        assert_eq!(eval("(1+1)(2+2)"), 8.0);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(eval("5!"), 120.0);
        assert_eq!(eval("0!"), 1.0);
        assert_eq!(eval("3!!"), 720.0);
        assert!(matches!(
            evaluate("2.5!"),
            Err(EvaluationError::InvalidFactorial(_))
        ));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(eval("1/0"), f64::INFINITY);
        assert_eq!(eval("-1/0"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate(""), Err(EvaluationError::Empty));
        assert_eq!(evaluate("   "), Err(EvaluationError::Empty));
        assert_eq!(evaluate("2+"), Err(EvaluationError::UnexpectedEnd));
        assert_eq!(evaluate("(1+2"), Err(EvaluationError::UnexpectedEnd));
        assert_eq!(
            evaluate("hello"),
            Err(EvaluationError::UnknownSymbol("hello".to_string()))
        );
        assert_eq!(
            evaluate("foo(1)"),
            Err(EvaluationError::UnknownFunction("foo".to_string()))
        );
        assert!(matches!(
            evaluate("3×3"),
            Err(EvaluationError::UnexpectedCharacter { ch: '×', pos: 1 })
        ));
        assert!(matches!(
            evaluate("1 2"),
            Err(EvaluationError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            evaluate("sqrt(1, 2)"),
            Err(EvaluationError::Arity { found: 2, .. })
        ));
        assert!(matches!(evaluate("."), Err(EvaluationError::UnexpectedCharacter { .. })));
        assert_eq!(evaluate("sqrt(-1)"), Err(EvaluationError::NotReal));
        assert!(evaluate("=4").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(eval(&shallow), 1.0);

        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&deep), Err(EvaluationError::TooDeep(MAX_DEPTH)));

        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&signs), Err(EvaluationError::TooDeep(MAX_DEPTH)));

        let powers = format!("2{}", "^2".repeat(10_000));
        assert_eq!(evaluate(&powers), Err(EvaluationError::TooDeep(MAX_DEPTH)));

        let calls = format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&calls), Err(EvaluationError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_long_flat_expression() {
        let sum = format!("1{}", "+1".repeat(100_000));
        assert_eq!(eval(&sum), 100_001.0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(evaluate("sqrt(2)*3"), evaluate("sqrt(2)*3"));
    }
}
