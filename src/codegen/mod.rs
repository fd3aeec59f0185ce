use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ErrorKind, Result, ShaderError};
use crate::types::GlslType;

mod expr;


pub use self::expr::{float, uniform, vec2, BinOp, Expression, Operand, Swizzle, UnaryFn};

/// Deepest scope stack a build may reach (the `main` scope counts as one).
pub const MAX_SCOPE_DEPTH: usize = 64;

/// Screen-coordinate expression handed to every `main` callback.
const FRAG_COORD: &str = "gl_FragCoord.xy";

// ── Public types ───────────────────────────────────────────────────────

/// How temp-variable numbering behaves across builds on one [`Builder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterPolicy {
    /// Every build starts again at `v0`.
    #[default]
    PerBuild,
    /// Numbering continues from the previous build.
    Persistent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub counter: CounterPolicy,
}

/// One `uniform <type> <name>;` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: GlslType,
}

/// A function parameter for [`Builder::define_function`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: GlslType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: GlslType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Full build output: shader source plus the pieces it was assembled from.
#[derive(Debug, Clone, Serialize)]
pub struct ShaderOutput {
    pub source: String,
    pub uniforms: Vec<UniformDecl>,
    /// Rendered function definitions, in catalog order.
    pub functions: Vec<String>,
}

/// Context handed to the `main` callback of a build.
#[derive(Debug, Clone)]
pub struct Fragment {
    uniforms: Vec<UniformDecl>,
}

impl Fragment {
    /// The 2-component screen coordinate (`gl_FragCoord.xy`).
    pub fn frag_coord(&self) -> Expression {
        Expression::new(FRAG_COORD, GlslType::Vec2)
    }

    /// Reference a uniform declared for this build.
    pub fn uniform(&self, name: &str) -> Result<Expression> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| Expression::new(u.name.clone(), u.ty))
            .ok_or_else(|| ShaderError::unknown_uniform(name))
    }
}

/// Handle to a function emitted by [`Builder::define_function`].
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRef {
    name: String,
    ret: GlslType,
    params: Vec<GlslType>,
}

impl FunctionRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> GlslType {
        self.ret
    }

    /// Emit `<ret> vN = <name>(<args>);` into the current scope.
    pub fn call(&self, builder: &mut Builder, args: &[Operand]) -> Result<Expression> {
        let op = format!("call to {}", self.name);
        if args.len() != self.params.len() {
            return Err(ErrorKind::ArgumentCount {
                function: self.name.clone(),
                expected: self.params.len(),
                got: args.len(),
            }
            .into());
        }
        for (arg, &param) in args.iter().zip(&self.params) {
            match arg.ty() {
                Some(ty) if ty != param => {
                    return Err(ShaderError::type_mismatch(&op, param.keyword(), ty));
                }
                None if param != GlslType::Float => {
                    return Err(ShaderError::type_mismatch(&op, param.keyword(), GlslType::Float));
                }
                _ => {}
            }
        }
        let rendered: Vec<String> = args.iter().map(Operand::code).collect();
        builder.assign(self.ret, format!("{}({})", self.name, rendered.join(", ")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Building,
}

// ── Builder ────────────────────────────────────────────────────────────

/// Generation context for one shader at a time.
///
/// Owns a stack of statement buffers (the top one is live), the function
/// catalog, the uniform registry and the temp-variable counter. Every
/// [`Expression`] operation takes the builder explicitly and appends one
/// line to the live buffer.
#[derive(Debug)]
pub struct Builder {
    config: BuilderConfig,
    phase: Phase,
    scopes: Vec<Vec<String>>,
    functions: Vec<String>,
    uniforms: Vec<UniformDecl>,
    next_var: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            scopes: Vec::new(),
            functions: Vec::new(),
            uniforms: Vec::new(),
            next_var: 0,
        }
    }

    pub fn is_building(&self) -> bool {
        self.phase == Phase::Building
    }

    /// Number of nested scopes currently open (0 when idle).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Lines of the live buffer.
    pub fn current_lines(&self) -> &[String] {
        self.scopes.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Generate shader source. See [`Builder::build_full`].
    pub fn build<I, N, F>(&mut self, uniforms: I, main: F) -> Result<String>
    where
        I: IntoIterator<Item = (N, GlslType)>,
        N: Into<String>,
        F: FnOnce(&mut Builder, &Fragment) -> Result<Expression>,
    {
        self.build_full(uniforms, main).map(|out| out.source)
    }

    /// Run one complete generation pass.
    ///
    /// Resets the buffer, function catalog and uniform registry, registers
    /// `uniforms` in order, runs `main`, and assigns its result to channel 0
    /// of `gl_FragColor`.
    pub fn build_full<I, N, F>(&mut self, uniforms: I, main: F) -> Result<ShaderOutput>
    where
        I: IntoIterator<Item = (N, GlslType)>,
        N: Into<String>,
        F: FnOnce(&mut Builder, &Fragment) -> Result<Expression>,
    {
        if self.phase == Phase::Building {
            return Err(ShaderError::reentrancy(
                "build called while another build is in progress",
            ));
        }
        self.reset();
        self.phase = Phase::Building;
        debug!(start_var = self.next_var, "build started");

        let result = self.run_build(uniforms, main);

        self.phase = Phase::Idle;
        self.scopes.clear();
        match &result {
            Ok(out) => debug!(
                uniforms = out.uniforms.len(),
                functions = out.functions.len(),
                vars = self.next_var,
                "build finished"
            ),
            Err(e) => debug!(error = %e, "build failed"),
        }
        result
    }

    fn reset(&mut self) {
        self.scopes.clear();
        self.scopes.push(Vec::new());
        self.functions.clear();
        self.uniforms.clear();
        if self.config.counter == CounterPolicy::PerBuild {
            self.next_var = 0;
        }
    }

    fn run_build<I, N, F>(&mut self, uniforms: I, main: F) -> Result<ShaderOutput>
    where
        I: IntoIterator<Item = (N, GlslType)>,
        N: Into<String>,
        F: FnOnce(&mut Builder, &Fragment) -> Result<Expression>,
    {
        for (name, ty) in uniforms {
            self.register_uniform(name.into(), ty)?;
        }

        let fragment = Fragment {
            uniforms: self.uniforms.clone(),
        };
        let result = main(self, &fragment)?;
        self.emit(format!("gl_FragColor = vec4({}, 0.0, 1.0);", result.code()))?;

        if self.scopes.len() != 1 {
            return Err(ShaderError::reentrancy(&format!(
                "scope stack left at depth {} at end of build",
                self.scopes.len()
            )));
        }
        let lines = self.scopes.pop().unwrap_or_default();

        Ok(ShaderOutput {
            source: render(&self.uniforms, &self.functions, &lines),
            uniforms: self.uniforms.clone(),
            functions: self.functions.clone(),
        })
    }

    fn register_uniform(&mut self, name: String, ty: GlslType) -> Result<()> {
        if let Some(existing) = self.uniforms.iter().find(|u| u.name == name) {
            if existing.ty != ty {
                return Err(ErrorKind::ConflictingUniform {
                    name,
                    first: existing.ty,
                    second: ty,
                }
                .into());
            }
            return Ok(());
        }
        self.uniforms.push(UniformDecl { name, ty });
        Ok(())
    }

    // ── Scoped generation ──────────────────────────────────────────────

    /// Emit a separate top-level function.
    ///
    /// `body` runs against a fresh statement buffer and receives one
    /// expression per parameter. Its lines never reach the caller's buffer;
    /// they become the function body, ending in `return <code>;`.
    pub fn define_function<F>(
        &mut self,
        name: &str,
        ret: GlslType,
        params: &[Param],
        body: F,
    ) -> Result<FunctionRef>
    where
        F: FnOnce(&mut Builder, &[Expression]) -> Result<Expression>,
    {
        self.ensure_building("define_function")?;
        let depth = self.enter_scope()?;

        let args: Vec<Expression> = params
            .iter()
            .map(|p| Expression::new(p.name.clone(), p.ty))
            .collect();
        let outcome = body(self, &args).and_then(|value| {
            if value.ty() != ret {
                return Err(ShaderError::type_mismatch(
                    &format!("return of {name}"),
                    ret.keyword(),
                    value.ty(),
                ));
            }
            self.emit(format!("return {};", value.code()))
        });
        let lines = self.exit_scope(depth);

        let lines = outcome.and(lines).map_err(|e| e.in_scope(name))?;
        let param_list: Vec<String> = params.iter().map(|p| format!("{} {}", p.ty, p.name)).collect();
        let block: Vec<String> = lines.iter().map(|l| format!("  {l}")).collect();
        self.functions.push(format!(
            "{ret} {name}({}) {{\n{}\n}}",
            param_list.join(", "),
            block.join("\n")
        ));
        debug!(function = name, lines = lines.len(), "function defined");

        Ok(FunctionRef {
            name: name.to_string(),
            ret,
            params: params.iter().map(|p| p.ty).collect(),
        })
    }

    /// Emit `if(<cond>){ ... }` directly into the live buffer.
    ///
    /// The branch is not isolated: its statements interleave with the
    /// surrounding ones in call order. If `then` fails, everything emitted
    /// since `if(` is dropped so the buffer never holds an unclosed block.
    pub fn if_block<T>(&mut self, cond: &str, then: T) -> Result<()>
    where
        T: FnOnce(&mut Builder) -> Result<()>,
    {
        let mark = self.mark("if_block")?;
        let result = self.emit_branch(format!("if({cond}){{"), then);
        self.rollback_on_error(mark, result)
    }

    /// Like [`Builder::if_block`], followed by `else{ ... }`.
    ///
    /// A failure in either branch drops the whole construct.
    pub fn if_else<T, E>(&mut self, cond: &str, then: T, otherwise: E) -> Result<()>
    where
        T: FnOnce(&mut Builder) -> Result<()>,
        E: FnOnce(&mut Builder) -> Result<()>,
    {
        let mark = self.mark("if_else")?;
        let mut result = self.emit_branch(format!("if({cond}){{"), then);
        if result.is_ok() {
            result = self.emit_branch("else{".to_string(), otherwise);
        }
        self.rollback_on_error(mark, result)
    }

    fn emit_branch<T>(&mut self, open: String, body: T) -> Result<()>
    where
        T: FnOnce(&mut Builder) -> Result<()>,
    {
        self.emit(open)?;
        body(self)?;
        self.emit("}".to_string())
    }

    /// Scope depth and live-buffer length, for [`Builder::rollback_on_error`].
    fn mark(&self, op: &str) -> Result<(usize, usize)> {
        self.ensure_building(op)?;
        Ok((self.scopes.len(), self.current_lines().len()))
    }

    fn rollback_on_error(&mut self, (depth, len): (usize, usize), result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.scopes.truncate(depth);
            if let Some(scope) = self.scopes.last_mut() {
                scope.truncate(len);
            }
        }
        result
    }

    fn enter_scope(&mut self) -> Result<usize> {
        if self.scopes.len() >= MAX_SCOPE_DEPTH {
            return Err(ShaderError::reentrancy(&format!(
                "scope nesting exceeds {MAX_SCOPE_DEPTH} levels"
            )));
        }
        self.scopes.push(Vec::new());
        Ok(self.scopes.len())
    }

    /// Pop the scope opened at `depth`, restoring the enclosing buffer.
    fn exit_scope(&mut self, depth: usize) -> Result<Vec<String>> {
        if self.scopes.len() != depth {
            let found = self.scopes.len();
            self.scopes.truncate(depth.saturating_sub(1));
            return Err(ShaderError::reentrancy(&format!(
                "scope closed at depth {found}, opened at {depth}"
            )));
        }
        Ok(self.scopes.pop().unwrap_or_default())
    }

    // ── Emission ───────────────────────────────────────────────────────

    fn ensure_building(&self, op: &str) -> Result<()> {
        if self.phase != Phase::Building || self.scopes.is_empty() {
            return Err(ShaderError::reentrancy(&format!(
                "{op} used outside of a build"
            )));
        }
        Ok(())
    }

    /// Append a raw line to the live buffer.
    pub fn emit(&mut self, line: String) -> Result<()> {
        self.ensure_building("emit")?;
        trace!(depth = self.scopes.len(), %line, "emit");
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(line);
        }
        Ok(())
    }

    /// Declare a fresh temp `<ty> vN = <value>;` and return it.
    pub(crate) fn assign(&mut self, ty: GlslType, value: String) -> Result<Expression> {
        self.ensure_building("assign")?;
        let name = format!("v{}", self.next_var);
        self.next_var += 1;
        self.emit(format!("{ty} {name} = {value};"))?;
        Ok(Expression::new(name, ty))
    }
}

/// Assemble uniforms, function catalog and the `main` block.
fn render(uniforms: &[UniformDecl], functions: &[String], lines: &[String]) -> String {
    let decls: Vec<String> = uniforms
        .iter()
        .map(|u| format!("uniform {} {};", u.ty, u.name))
        .collect();
    format!(
        "{}\n\n{}\n\nvoid main(){{\n  {}\n}}",
        decls.join("\n"),
        functions.join("\n\n"),
        lines.join("\n  ")
    )
}
