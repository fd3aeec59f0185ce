//! Output-contract tests against the public API: section order, uniform
//! deduplication, scope isolation and counter policy.

use glsl_gen::{
    float, Builder, BuilderConfig, CounterPolicy, ErrorKind, Expression, Fragment, GlslType, Param,
    Result,
};

fn sections(src: &str) -> (&str, &str) {
    let main = src.find("void main(){").expect("missing main block");
    (&src[..main], &src[main..])
}

fn graph(b: &mut Builder, f: &Fragment) -> Result<Expression> {
    let t = f.uniform("u_time")?;
    let res = f.uniform("u_resolution")?;
    b.define_function("scale", GlslType::Vec2, &[Param::new("p", GlslType::Vec2)], |b, a| {
        a[0].mul(b, 2.0)
    })?;
    let uv = f.frag_coord().div(b, &res)?;
    let u = uv.x(b)?;
    let wave = t.sin(b)?;
    u.add(b, &wave)
}

const UNIFORMS: [(&str, GlslType); 2] = [("u_time", GlslType::Float), ("u_resolution", GlslType::Vec2)];

#[test]
fn sections_appear_in_contract_order() {
    let src = glsl_gen::glsl(UNIFORMS, graph).unwrap();
    let (head, main) = sections(&src);

    assert!(head.starts_with("uniform float u_time;\nuniform vec2 u_resolution;\n\n"));
    assert!(head.contains("vec2 scale(vec2 p) {\n  vec2 v0 = p * 2.0;\n  return v0;\n}"));
    assert!(head.ends_with("}\n\n"));
    assert!(main.starts_with("void main(){\n  "));
    assert!(main.ends_with("gl_FragColor = vec4(v4, 0.0, 1.0);\n}"));
}

#[test]
fn identical_builds_are_byte_identical() {
    let mut builder = Builder::new();
    let first = builder.build(UNIFORMS, graph).unwrap();
    let second = builder.build(UNIFORMS, graph).unwrap();
    assert_eq!(first, second);
}

#[test]
fn persistent_counter_keeps_declarations_stable() {
    let mut builder = Builder::with_config(BuilderConfig {
        counter: CounterPolicy::Persistent,
    });
    let first = builder.build(UNIFORMS, graph).unwrap();
    let second = builder.build(UNIFORMS, graph).unwrap();

    let decls = |s: &str| s.lines().filter(|l| l.starts_with("uniform ")).map(String::from).collect::<Vec<_>>();
    assert_eq!(decls(&first), decls(&second));
    assert_ne!(first, second);
    assert!(second.contains("vec2 scale(vec2 p) {\n  vec2 v5 = p * 2.0;"));
}

#[test]
fn every_uniform_declared_exactly_once() {
    let src = glsl_gen::glsl(
        [("u_a", GlslType::Float), ("u_b", GlslType::Vec3), ("u_c", GlslType::Mat4)],
        |b, f| {
            let a = f.uniform("u_a")?;
            let mut acc = a.clone();
            for _ in 0..5 {
                acc = acc.add(b, &f.uniform("u_a")?)?;
            }
            Ok(acc)
        },
    )
    .unwrap();

    for decl in ["uniform float u_a;", "uniform vec3 u_b;", "uniform mat4 u_c;"] {
        assert_eq!(src.matches(decl).count(), 1, "{decl}");
    }
}

#[test]
fn caller_buffer_restored_after_function() {
    let mut builder = Builder::new();
    builder
        .build([("u_t", GlslType::Float)], |b, f| {
            let t = f.uniform("u_t")?.cos(b)?;
            let snapshot = b.current_lines().to_vec();
            let depth = b.depth();
            b.define_function("noop", GlslType::Float, &[], |b, _| float(1.0).add(b, 2.0))?;
            assert_eq!(b.current_lines(), snapshot.as_slice());
            assert_eq!(b.depth(), depth);
            Ok(t)
        })
        .unwrap();
}

#[test]
fn errors_name_the_failure() {
    let err = glsl_gen::glsl([("u_t", GlslType::Float)], |b, f| {
        b.define_function("bad", GlslType::Float, &[], |b, _| f.uniform("u_t")?.y(b))?;
        f.uniform("u_t")
    })
    .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "type mismatch in .y: expected vec2, vec3 or vec4, got float (in function bad)"
    );
}
