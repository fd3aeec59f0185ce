use std::fmt;

use super::Builder;
use crate::error::{Result, ShaderError};
use crate::types::GlslType;

// ── Expression ─────────────────────────────────────────────────────────

/// An immutable, typed reference to a value in the generated shader.
///
/// `code` is either a literal/reference supplied by the caller or the name
/// of a temp variable produced by an earlier operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    code: String,
    ty: GlslType,
}

impl Expression {
    pub fn new(code: impl Into<String>, ty: GlslType) -> Self {
        Self {
            code: code.into(),
            ty,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn ty(&self) -> GlslType {
        self.ty
    }

    // ── Binary arithmetic ──────────────────────────────────────────────

    pub fn add(&self, b: &mut Builder, rhs: impl Into<Operand>) -> Result<Expression> {
        self.binary(b, BinOp::Add, rhs.into())
    }

    pub fn sub(&self, b: &mut Builder, rhs: impl Into<Operand>) -> Result<Expression> {
        self.binary(b, BinOp::Sub, rhs.into())
    }

    pub fn mul(&self, b: &mut Builder, rhs: impl Into<Operand>) -> Result<Expression> {
        self.binary(b, BinOp::Mul, rhs.into())
    }

    pub fn div(&self, b: &mut Builder, rhs: impl Into<Operand>) -> Result<Expression> {
        self.binary(b, BinOp::Div, rhs.into())
    }

    /// `<ty> vN = <self> <op> <rhs>;`, typed like `self`.
    ///
    /// `rhs` must be a literal, a float, or share `self`'s type.
    pub fn binary(&self, b: &mut Builder, op: BinOp, rhs: Operand) -> Result<Expression> {
        self.check_operand(op.name(), &rhs)?;
        b.assign(self.ty, format!("{} {} {}", self.code, op.symbol(), rhs.code()))
    }

    // ── Unary intrinsics ───────────────────────────────────────────────

    pub fn sin(&self, b: &mut Builder) -> Result<Expression> {
        self.unary(b, UnaryFn::Sin)
    }

    pub fn cos(&self, b: &mut Builder) -> Result<Expression> {
        self.unary(b, UnaryFn::Cos)
    }

    pub fn normalize(&self, b: &mut Builder) -> Result<Expression> {
        self.unary(b, UnaryFn::Normalize)
    }

    pub fn unary(&self, b: &mut Builder, func: UnaryFn) -> Result<Expression> {
        let ok = match func {
            UnaryFn::Sin | UnaryFn::Cos => self.ty != GlslType::Mat4,
            UnaryFn::Normalize => self.ty.is_vector(),
        };
        if !ok {
            return Err(ShaderError::type_mismatch(
                func.name(),
                func.accepts(),
                self.ty,
            ));
        }
        b.assign(self.ty, format!("{}({})", func.name(), self.code))
    }

    // ── Three-argument intrinsics ──────────────────────────────────────

    /// `step(<self>, <edge>, <self>)`: the receiver is also the trailing argument.
    pub fn step(&self, b: &mut Builder, edge: impl Into<Operand>) -> Result<Expression> {
        let edge = edge.into();
        self.check_operand("step", &edge)?;
        self.ternary(b, "step", &edge, &Operand::Expr(self.clone()))
    }

    /// `smoothstep(<self>, <edge0>, <edge1>)`.
    pub fn smoothstep(
        &self,
        b: &mut Builder,
        edge0: impl Into<Operand>,
        edge1: impl Into<Operand>,
    ) -> Result<Expression> {
        let (edge0, edge1) = (edge0.into(), edge1.into());
        self.check_operand("smoothstep", &edge0)?;
        self.check_operand("smoothstep", &edge1)?;
        self.ternary(b, "smoothstep", &edge0, &edge1)
    }

    fn ternary(&self, b: &mut Builder, func: &str, second: &Operand, third: &Operand) -> Result<Expression> {
        b.assign(
            self.ty,
            format!("{func}({}, {}, {})", self.code, second.code(), third.code()),
        )
    }

    // ── Swizzles ───────────────────────────────────────────────────────

    pub fn x(&self, b: &mut Builder) -> Result<Expression> {
        self.swizzle(b, Swizzle::X)
    }

    pub fn y(&self, b: &mut Builder) -> Result<Expression> {
        self.swizzle(b, Swizzle::Y)
    }

    pub fn z(&self, b: &mut Builder) -> Result<Expression> {
        self.swizzle(b, Swizzle::Z)
    }

    pub fn w(&self, b: &mut Builder) -> Result<Expression> {
        self.swizzle(b, Swizzle::W)
    }

    /// `float vN = <self>.<c>;`. Only vectors wide enough have the component.
    pub fn swizzle(&self, b: &mut Builder, c: Swizzle) -> Result<Expression> {
        if !self.ty.is_vector() || c.index() >= self.ty.component_count() {
            return Err(ShaderError::type_mismatch(
                &format!(".{}", c.letter()),
                c.accepts(),
                self.ty,
            ));
        }
        b.assign(GlslType::Float, format!("{}.{}", self.code, c.letter()))
    }

    fn check_operand(&self, op: &str, rhs: &Operand) -> Result<()> {
        match rhs.ty() {
            Some(ty) if ty != GlslType::Float && ty != self.ty => Err(ShaderError::type_mismatch(
                op,
                &format!("float or {}", self.ty),
                ty,
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

// ── Operands ───────────────────────────────────────────────────────────

/// Right-hand side of an operation: another expression or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expression),
    Number(f64),
}

impl Operand {
    /// Numbers render with one decimal digit.
    pub fn code(&self) -> String {
        match self {
            Operand::Expr(e) => e.code.clone(),
            Operand::Number(n) => fmt_literal(*n),
        }
    }

    /// `None` for numeric literals, which fit any operand slot.
    pub fn ty(&self) -> Option<GlslType> {
        match self {
            Operand::Expr(e) => Some(e.ty),
            Operand::Number(_) => None,
        }
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(n)
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expression> for Operand {
    fn from(e: &Expression) -> Self {
        Operand::Expr(e.clone())
    }
}

// ── Operators ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFn {
    Sin,
    Cos,
    Normalize,
}

impl UnaryFn {
    pub fn name(self) -> &'static str {
        match self {
            UnaryFn::Sin => "sin",
            UnaryFn::Cos => "cos",
            UnaryFn::Normalize => "normalize",
        }
    }

    fn accepts(self) -> &'static str {
        match self {
            UnaryFn::Sin | UnaryFn::Cos => "float or vector",
            UnaryFn::Normalize => "vector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swizzle {
    X,
    Y,
    Z,
    W,
}

impl Swizzle {
    pub fn letter(self) -> char {
        match self {
            Swizzle::X => 'x',
            Swizzle::Y => 'y',
            Swizzle::Z => 'z',
            Swizzle::W => 'w',
        }
    }

    fn index(self) -> usize {
        match self {
            Swizzle::X => 0,
            Swizzle::Y => 1,
            Swizzle::Z => 2,
            Swizzle::W => 3,
        }
    }

    fn accepts(self) -> &'static str {
        match self {
            Swizzle::X | Swizzle::Y => "vec2, vec3 or vec4",
            Swizzle::Z => "vec3 or vec4",
            Swizzle::W => "vec4",
        }
    }
}

// ── Free constructors ──────────────────────────────────────────────────

/// `vec2(x, y)` literal; `y` defaults to `x`.
pub fn vec2(x: f64, y: Option<f64>) -> Expression {
    let y = y.unwrap_or(x);
    Expression::new(
        format!("vec2({}, {})", fmt_literal(x), fmt_literal(y)),
        GlslType::Vec2,
    )
}

/// Float literal, rendered with one decimal digit.
pub fn float(v: f64) -> Expression {
    Expression::new(fmt_literal(v), GlslType::Float)
}

/// Render a number with one decimal digit, rounding exact ties away from
/// zero (`0.25` -> `0.3`, `-0.25` -> `-0.3`).
///
/// `{:.1}` already rounds on the exact binary value, so only exact ties
/// need care. Those are the odd multiples of 0.25.
pub(crate) fn fmt_literal(n: f64) -> String {
    if n == 0.0 {
        return "0.0".to_string();
    }
    let quarters = n.abs() * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        let up = (n.abs() * 10.0).ceil() / 10.0;
        let sign = if n < 0.0 { "-" } else { "" };
        return format!("{sign}{up:.1}");
    }
    format!("{n:.1}")
}

/// Unchecked reference to a uniform by name.
///
/// Does not register a declaration; prefer [`super::Fragment::uniform`]
/// inside a build.
pub fn uniform(name: &str, ty: GlslType) -> Expression {
    Expression::new(name, ty)
}
