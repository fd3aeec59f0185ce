//! Built-in shader programs.

use crate::codegen::{vec2, Builder, Expression, Fragment, Operand, Param, ShaderOutput};
use crate::error::Result;
use crate::types::GlslType;

type MainFn = fn(&mut Builder, &Fragment) -> Result<Expression>;

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub uniforms: &'static [(&'static str, GlslType)],
    main: MainFn,
}

impl Preset {
    pub fn build(&self, builder: &mut Builder) -> Result<ShaderOutput> {
        builder.build_full(self.uniforms.iter().copied(), self.main)
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "uv-gradient",
        description: "horizontal gradient from screen coordinate over resolution",
        uniforms: &[("u_time", GlslType::Float), ("u_resolution", GlslType::Vec2)],
        main: uv_gradient,
    },
    Preset {
        name: "pulse",
        description: "sine of time remapped to 0..1",
        uniforms: &[("u_time", GlslType::Float)],
        main: pulse,
    },
    Preset {
        name: "rings",
        description: "concentric rings through a helper function, discarded after 10s",
        uniforms: &[("u_time", GlslType::Float), ("u_resolution", GlslType::Vec2)],
        main: rings,
    },
];

pub fn preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

fn uv_gradient(b: &mut Builder, f: &Fragment) -> Result<Expression> {
    let uv = f.frag_coord().div(b, &f.uniform("u_resolution")?)?;
    uv.x(b)
}

fn pulse(b: &mut Builder, f: &Fragment) -> Result<Expression> {
    f.uniform("u_time")?.sin(b)?.mul(b, 0.5)?.add(b, 0.5)
}

fn rings(b: &mut Builder, f: &Fragment) -> Result<Expression> {
    let ring = b.define_function(
        "ring",
        GlslType::Float,
        &[Param::new("d", GlslType::Float), Param::new("t", GlslType::Float)],
        |b, args| {
            let phase = args[0].mul(b, 40.0)?.sub(b, &args[1])?;
            phase.sin(b)?.smoothstep(b, 0.0, 1.0)
        },
    )?;

    let time = f.uniform("u_time")?;
    let uv = f.frag_coord().div(b, &f.uniform("u_resolution")?)?;
    let centered = uv.sub(b, &vec2(0.5, None))?;
    let (x, y) = (centered.x(b)?, centered.y(b)?);
    let xx = x.mul(b, &x)?;
    let yy = y.mul(b, &y)?;
    let dist = xx.add(b, &yy)?;

    b.if_block(&format!("{time} > 10.0"), |b| b.emit("discard;".to_string()))?;
    ring.call(b, &[Operand::from(&dist), Operand::from(&time)])
}
