use crate::error::ExpressionError;
use crate::traits::{BivariateFunction, Scalar};
use std::collections::HashMap;

/// OpCodes for the Stack-based Virtual Machine.
/// The VM operates on a stack of `Scalar` values (f64 or Dual22).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes an independent variable onto the stack (0 = x, 1 = y).
    LoadVar(usize),
    /// Pushes the value of a parameter (by index) onto the stack.
    LoadParam(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top value (a), pushes a^n by repeated multiplication.
    PowI(u32),
    /// Pops top value (a), pushes sin(a).
    Sin,
    /// Pops top value (a), pushes cos(a).
    Cos,
    /// Pops top value (a), pushes exp(a).
    Exp,
    /// Pops top value (a), pushes -a.
    Neg,
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn ops(&self) -> &[OpCode] {
        &self.ops
    }
}

/// Stack-based Virtual Machine for evaluating compiled expressions.
///
/// The VM is stateless; `execute` takes all necessary context and leaves the
/// result as the single value on the stack.
pub struct VM;

impl VM {
    /// Executes the bytecode.
    ///
    /// # Type Parameters
    /// * `T`: The scalar type (e.g., `f64` or `Dual22`).
    pub fn execute<T: Scalar>(
        bytecode: &Bytecode,
        vars: [T; 2],
        params: &[f64],
        stack: &mut Vec<T>,
    ) -> T {
        stack.clear();

        for op in &bytecode.ops {
            match *op {
                OpCode::LoadConst(val) => stack.push(T::constant(val)),
                OpCode::LoadVar(idx) => stack.push(vars[idx]),
                OpCode::LoadParam(idx) => stack.push(T::constant(params[idx])),
                OpCode::Add => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a + b);
                }
                OpCode::Sub => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a - b);
                }
                OpCode::Mul => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a * b);
                }
                OpCode::Div => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a / b);
                }
                OpCode::PowI(n) => {
                    let a = pop(stack);
                    stack.push(powi(a, n));
                }
                OpCode::Sin => {
                    let a = pop(stack);
                    stack.push(a.sin());
                }
                OpCode::Cos => {
                    let a = pop(stack);
                    stack.push(a.cos());
                }
                OpCode::Exp => {
                    let a = pop(stack);
                    stack.push(a.exp());
                }
                OpCode::Neg => {
                    let a = pop(stack);
                    stack.push(-a);
                }
            }
        }

        pop(stack)
    }
}

// Bytecode only comes out of `Compiler`, which emits balanced programs.
fn pop<T>(stack: &mut Vec<T>) -> T {
    stack.pop().expect("compiled bytecode underflowed the VM stack")
}

fn pop_pair<T>(stack: &mut Vec<T>) -> (T, T) {
    let b = pop(stack);
    let a = pop(stack);
    (a, b)
}

fn powi<T: Scalar>(base: T, n: u32) -> T {
    let mut acc = T::one();
    let mut factor = base;
    let mut e = n;
    while e > 0 {
        if e & 1 == 1 {
            acc = acc * factor;
        }
        e >>= 1;
        if e > 0 {
            factor = factor * factor;
        }
    }
    acc
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, ^
    Unary(char, Box<Expr>),             // only '-'
    Call(String, Box<Expr>),            // sin, cos, exp
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// `x` and `y` resolve to the independent variables, anything else to a parameter.
pub struct Compiler {
    param_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(param_names: &[&str]) -> Self {
        let param_map = param_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { param_map }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode, ExpressionError> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<(), ExpressionError> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => match name.as_str() {
                "x" => ops.push(OpCode::LoadVar(0)),
                "y" => ops.push(OpCode::LoadVar(1)),
                _ => {
                    let idx = self
                        .param_map
                        .get(name)
                        .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone()))?;
                    ops.push(OpCode::LoadParam(*idx));
                }
            },
            Expr::Binary(left, '^', right) => {
                let exponent = match right.as_ref() {
                    Expr::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => {
                        *n as u32
                    }
                    _ => return Err(ExpressionError::UnsupportedExponent),
                };
                self.compile_recursive(left, ops)?;
                ops.push(OpCode::PowI(exponent));
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                match op {
                    '+' => ops.push(OpCode::Add),
                    '-' => ops.push(OpCode::Sub),
                    '*' => ops.push(OpCode::Mul),
                    '/' => ops.push(OpCode::Div),
                    other => return Err(ExpressionError::UnexpectedToken(other.to_string())),
                }
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    other => return Err(ExpressionError::UnexpectedToken(other.to_string())),
                }
            }
            Expr::Call(func, arg) => {
                self.compile_recursive(arg, ops)?;
                match func.as_str() {
                    "sin" => ops.push(OpCode::Sin),
                    "cos" => ops.push(OpCode::Cos),
                    "exp" => ops.push(OpCode::Exp),
                    _ => return Err(ExpressionError::UnknownFunction(func.clone())),
                }
            }
        }
        Ok(())
    }
}

// --- Simple Parser ---

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::TrailingInput(token.describe())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Identifier(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Scientific notation: 1e-3, 2.5E+4. A bare `e` stays an identifier.
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value = literal
                .parse()
                .map_err(|_| ExpressionError::InvalidNumber(literal.clone()))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Identifier(chars[start..i].iter().collect()));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => return Err(ExpressionError::UnexpectedChar(other, i)),
            };
            tokens.push(token);
            i += 1;
        }
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

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<(), ExpressionError> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_factor()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // Unary minus binds looser than `^`: -x^2 == -(x^2).
    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary('-', Box::new(expr)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_primary()?;

        while let Some(Token::Caret) = self.peek() {
            self.consume();
            let right = self.parse_primary()?;
            left = Expr::Binary(Box::new(left), '^', Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let arg = self.parse_expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

// --- Expression ---

/// A textual function of `x` and `y`, compiled once and evaluable on any
/// [`Scalar`], so the same expression drives both the stencil and AD paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    bytecode: Bytecode,
    params: Vec<f64>,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Self::parse_with_params(source, &[])
    }

    /// Parses `source`, binding each named parameter to a fixed value.
    pub fn parse_with_params(source: &str, params: &[(&str, f64)]) -> Result<Self, ExpressionError> {
        let ast = parse(source)?;
        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        let bytecode = Compiler::new(&names).compile(&ast)?;
        tracing::debug!(source, ops = bytecode.ops.len(), "compiled expression");
        Ok(Self {
            source: source.to_string(),
            bytecode,
            params: params.iter().map(|(_, value)| *value).collect(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn eval<T: Scalar>(&self, x: T, y: T) -> T {
        let mut stack = Vec::with_capacity(16);
        VM::execute(&self.bytecode, [x, y], &self.params, &mut stack)
    }
}

impl<T: Scalar> BivariateFunction<T> for Expression {
    fn apply(&self, x: T, y: T) -> T {
        self.eval(x, y)
    }
}
