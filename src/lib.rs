pub mod codegen;
pub mod error;
pub mod graph;
pub mod presets;
pub mod types;

pub use codegen::{
    float, uniform, vec2, Builder, BuilderConfig, CounterPolicy, Expression, Fragment, FunctionRef,
    Operand, Param, ShaderOutput,
};
pub use error::{ErrorKind, Result, ShaderError};
pub use types::GlslType;

/// Generate a fragment shader with a fresh [`Builder`].
///
/// `main` receives the builder and a [`Fragment`] exposing the screen
/// coordinate and the declared uniforms; its returned expression becomes
/// channel 0 of `gl_FragColor`.
pub fn glsl<I, N, F>(uniforms: I, main: F) -> Result<String>
where
    I: IntoIterator<Item = (N, GlslType)>,
    N: Into<String>,
    F: FnOnce(&mut Builder, &Fragment) -> Result<Expression>,
{
    Builder::new().build(uniforms, main)
}

/// Generate a fragment shader from a JSON graph document.
pub fn glsl_from_json(text: &str) -> Result<ShaderOutput> {
    let graph = graph::Graph::from_json(text)?;
    graph.build(&mut Builder::new())
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn end_to_end_time_passthrough() {
        let src = glsl([("u_time", GlslType::Float)], |_, f| f.uniform("u_time"))
            .expect("generation should succeed");
        assert!(src.contains("uniform float u_time;"));
        assert!(src.ends_with("void main(){\n  gl_FragColor = vec4(u_time, 0.0, 1.0);\n}"));
    }

    #[test]
    fn end_to_end_function_and_branch() {
        let src = glsl([("u_time", GlslType::Float)], |b, f| {
            let t = f.uniform("u_time")?;
            let wobble = b.define_function(
                "wobble",
                GlslType::Float,
                &[Param::new("x", GlslType::Float)],
                |b, args| args[0].cos(b)?.mul(b, 0.25),
            )?;
            let w = wobble.call(b, &[Operand::from(&t)])?;
            b.if_else(
                &format!("{w} > 0.0"),
                |b| b.emit("discard;".to_string()),
                |b| w.add(b, 1.0).map(drop),
            )?;
            Ok(w)
        })
        .expect("generation should succeed");

        let uniforms = src.find("uniform float u_time;").unwrap();
        let func = src.find("float wobble(float x) {").unwrap();
        let main = src.find("void main(){").unwrap();
        assert!(uniforms < func && func < main);
        assert!(src.contains("float v2 = wobble(u_time);"));
        assert!(src.contains("if(v2 > 0.0){\n  discard;\n  }\n  else{\n  float v3 = v2 + 1.0;\n  }"));
    }

    #[test]
    fn end_to_end_json_graph() {
        let out = glsl_from_json(
            r#"{ "uniforms": { "u_resolution": "vec2" },
                 "main": { "op": "y", "arg": { "op": "normalize", "arg": {
                     "op": "div", "lhs": { "op": "frag_coord" },
                     "rhs": { "op": "uniform", "name": "u_resolution" } } } } }"#,
        )
        .expect("generation should succeed");
        assert!(out.source.contains("vec2 v1 = normalize(v0);"));
        assert!(out.source.contains("float v2 = v1.y;"));
    }

    #[test]
    fn raw_constructors() {
        assert_eq!(vec2(1.0, None).code(), "vec2(1.0, 1.0)");
        assert_eq!(vec2(0.25, Some(2.0)).ty(), GlslType::Vec2);
        assert_eq!(float(3.0).code(), "3.0");
        let u = uniform("u_mouse", GlslType::Vec2);
        assert_eq!((u.code(), u.ty()), ("u_mouse", GlslType::Vec2));
    }
}
