//! Serialized expression graphs.
//!
//! A graph document describes one shader without Rust callbacks:
//!
//! ```json
//! {
//!   "uniforms": { "u_resolution": "vec2" },
//!   "main": { "op": "x", "arg": { "op": "div",
//!       "lhs": { "op": "frag_coord" },
//!       "rhs": { "op": "uniform", "name": "u_resolution" } } }
//! }
//! ```
//!
//! Nodes are evaluated depth-first, left to right, so emitted lines follow
//! that walk order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codegen::{self, BinOp, Builder, Expression, Fragment, Operand, ShaderOutput, Swizzle, UnaryFn};
use crate::error::{Result, ShaderError};
use crate::types::GlslType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Uniform name to type keyword, in document order.
    #[serde(default, with = "ordered_uniforms")]
    pub uniforms: Vec<(String, GlslType)>,
    pub main: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Node {
    FragCoord,
    Uniform { name: String },
    Literal { value: f64 },
    Vec2 { x: f64, y: Option<f64> },
    Add { lhs: Box<Node>, rhs: Box<Node> },
    Sub { lhs: Box<Node>, rhs: Box<Node> },
    Mul { lhs: Box<Node>, rhs: Box<Node> },
    Div { lhs: Box<Node>, rhs: Box<Node> },
    Sin { arg: Box<Node> },
    Cos { arg: Box<Node> },
    Normalize { arg: Box<Node> },
    Step { arg: Box<Node>, edge: Box<Node> },
    Smoothstep { arg: Box<Node>, edge0: Box<Node>, edge1: Box<Node> },
    X { arg: Box<Node> },
    Y { arg: Box<Node> },
    Z { arg: Box<Node> },
    W { arg: Box<Node> },
}

impl Graph {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ShaderError::graph(&e.to_string()))
    }

    pub fn build(&self, builder: &mut Builder) -> Result<ShaderOutput> {
        builder.build_full(self.uniforms.iter().cloned(), |b, frag| self.main.eval(b, frag))
    }
}

impl Node {
    /// Evaluate this node, emitting one line per operation.
    pub fn eval(&self, b: &mut Builder, frag: &Fragment) -> Result<Expression> {
        match self {
            Node::FragCoord => Ok(frag.frag_coord()),
            Node::Uniform { name } => frag.uniform(name),
            Node::Literal { value } => Ok(codegen::float(*value)),
            Node::Vec2 { x, y } => Ok(codegen::vec2(*x, *y)),
            Node::Add { lhs, rhs } => binary(b, frag, BinOp::Add, lhs, rhs),
            Node::Sub { lhs, rhs } => binary(b, frag, BinOp::Sub, lhs, rhs),
            Node::Mul { lhs, rhs } => binary(b, frag, BinOp::Mul, lhs, rhs),
            Node::Div { lhs, rhs } => binary(b, frag, BinOp::Div, lhs, rhs),
            Node::Sin { arg } => arg.eval(b, frag)?.unary(b, UnaryFn::Sin),
            Node::Cos { arg } => arg.eval(b, frag)?.unary(b, UnaryFn::Cos),
            Node::Normalize { arg } => arg.eval(b, frag)?.unary(b, UnaryFn::Normalize),
            Node::Step { arg, edge } => {
                let value = arg.eval(b, frag)?;
                let edge = edge.operand(b, frag)?;
                value.step(b, edge)
            }
            Node::Smoothstep { arg, edge0, edge1 } => {
                let value = arg.eval(b, frag)?;
                let edge0 = edge0.operand(b, frag)?;
                let edge1 = edge1.operand(b, frag)?;
                value.smoothstep(b, edge0, edge1)
            }
            Node::X { arg } => arg.eval(b, frag)?.swizzle(b, Swizzle::X),
            Node::Y { arg } => arg.eval(b, frag)?.swizzle(b, Swizzle::Y),
            Node::Z { arg } => arg.eval(b, frag)?.swizzle(b, Swizzle::Z),
            Node::W { arg } => arg.eval(b, frag)?.swizzle(b, Swizzle::W),
        }
    }

    /// Literals stay numeric so they accept any operand slot.
    fn operand(&self, b: &mut Builder, frag: &Fragment) -> Result<Operand> {
        match self {
            Node::Literal { value } => Ok(Operand::Number(*value)),
            other => other.eval(b, frag).map(Operand::Expr),
        }
    }
}

fn binary(b: &mut Builder, frag: &Fragment, op: BinOp, lhs: &Node, rhs: &Node) -> Result<Expression> {
    let lhs = lhs.eval(b, frag)?;
    let rhs = rhs.operand(b, frag)?;
    lhs.binary(b, op, rhs)
}

/// A JSON object of `name: type` read as a list, keeping key order.
mod ordered_uniforms {
    use super::*;
    use std::result::Result;

    pub fn serialize<S: Serializer>(uniforms: &[(String, GlslType)], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(uniforms.len()))?;
        for (name, ty) in uniforms {
            map.serialize_entry(name, ty)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, GlslType)>, D::Error> {
        d.deserialize_map(UniformsVisitor)
    }

    struct UniformsVisitor;

    impl<'de> Visitor<'de> for UniformsVisitor {
        type Value = Vec<(String, GlslType)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of uniform names to GLSL type keywords")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut uniforms = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, GlslType>()? {
                uniforms.push(entry);
            }
            Ok(uniforms)
        }
    }
}
