use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ShaderError};

/// The closed set of GLSL types an expression can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl GlslType {
    pub const ALL: [GlslType; 5] = [
        GlslType::Float,
        GlslType::Vec2,
        GlslType::Vec3,
        GlslType::Vec4,
        GlslType::Mat4,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            GlslType::Float => "float",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::Mat4 => "mat4",
        }
    }

    /// Number of scalar components.
    pub fn component_count(self) -> usize {
        match self {
            GlslType::Float => 1,
            GlslType::Vec2 => 2,
            GlslType::Vec3 => 3,
            GlslType::Vec4 => 4,
            GlslType::Mat4 => 16,
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, GlslType::Vec2 | GlslType::Vec3 | GlslType::Vec4)
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for GlslType {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlslType::ALL
            .into_iter()
            .find(|t| t.keyword() == s)
            .ok_or_else(|| ErrorKind::UnknownType(s.to_string()).into())
    }
}
