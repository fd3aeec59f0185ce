use std::fmt;

use crate::types::GlslType;

/// All errors produced while generating shader source.
#[derive(Debug)]
pub struct ShaderError {
    pub kind: ErrorKind,
    /// Name of the function being defined when the error occurred.
    pub scope: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Lookup of a uniform that was not declared for this build.
    #[error("unknown uniform: {0}")]
    UnknownUniform(String),
    /// An operation was applied to an operand of the wrong type.
    #[error("type mismatch in {op}: expected {expected}, got {got}")]
    TypeMismatch {
        op: String,
        expected: String,
        got: GlslType,
    },
    /// Nested `build`, use of an idle builder, or an unbalanced scope stack.
    #[error("builder reentrancy: {0}")]
    Reentrancy(String),
    /// Same uniform supplied twice with different types.
    #[error("uniform {name} declared as both {first} and {second}")]
    ConflictingUniform {
        name: String,
        first: GlslType,
        second: GlslType,
    },
    /// Call of a defined function with the wrong number of arguments.
    #[error("{function} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("unknown GLSL type: {0}")]
    UnknownType(String),
    /// Malformed serialized expression graph.
    #[error("invalid graph: {0}")]
    Graph(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(scope) = &self.scope {
            write!(f, " (in function {scope})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ShaderError {}

impl From<ErrorKind> for ShaderError {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, scope: None }
    }
}

pub type Result<T> = std::result::Result<T, ShaderError>;

/// Shorthand constructors.
impl ShaderError {
    pub fn unknown_uniform(name: &str) -> Self {
        ErrorKind::UnknownUniform(name.to_string()).into()
    }

    pub fn type_mismatch(op: &str, expected: &str, got: GlslType) -> Self {
        ErrorKind::TypeMismatch {
            op: op.to_string(),
            expected: expected.to_string(),
            got,
        }
        .into()
    }

    pub fn reentrancy(detail: &str) -> Self {
        ErrorKind::Reentrancy(detail.to_string()).into()
    }

    pub fn graph(msg: &str) -> Self {
        ErrorKind::Graph(msg.to_string()).into()
    }

    /// Attach the enclosing function name, keeping the innermost one.
    pub fn in_scope(mut self, name: &str) -> Self {
        if self.scope.is_none() {
            self.scope = Some(name.to_string());
        }
        self
    }
}
