//! Shader stages, programs and the errors they emit.
//!
//! A shader [`Stage`] is a single compiled unit of GPU code: a vertex shader or a fragment
//! shader. Two stages are linked together into a [`Program`], which is the object you make
//! current and feed uniform values and vertex attributes to.
//!
//! Stages and programs own their GPU handles: dropping them releases the GPU objects, on every
//! path, including a link failing halfway through a program construction.

pub mod builtin;
pub mod names;
pub mod program;
pub mod types;
pub mod uniform;

use std::error;
use std::fmt;

use crate::backend::shader::Shader;

pub use self::names::{ActiveSymbol, SymbolKind};
pub use self::program::Program;
pub use self::types::GlslType;
pub use self::uniform::{UniformShape, UniformUpdate, UniformValue};

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Fragment shader.
  FragmentShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
    }
  }
}

/// Errors that shader stages can emit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StageError {
  /// Occurs when a shader fails to compile. The `String` is the compiler log.
  CompilationFailed(StageType, String),
  /// Occurs when a stage without a compiled handle is used (its last compilation failed).
  NotCompiled(StageType),
}

impl StageError {
  /// Create a compilation error.
  pub fn compilation_failed(ty: StageType, reason: impl Into<String>) -> Self {
    StageError::CompilationFailed(ty, reason.into())
  }
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageError::CompilationFailed(ref ty, ref r) => write!(f, "{} compilation error: {}", ty, r),

      StageError::NotCompiled(ty) => write!(f, "{} has no compiled handle", ty),
    }
  }
}

impl error::Error for StageError {}

impl From<StageError> for ProgramError {
  fn from(e: StageError) -> Self {
    ProgramError::StageError(e)
  }
}

/// Errors that a [`Program`] can generate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramError {
  /// A shader stage failed to compile or validate its state.
  StageError(StageError),
  /// Program link failed. You can inspect the reason by looking at the contained `String`.
  LinkFailed(String),
  /// The program is not linked (its last link failed); it cannot be made current.
  NotLinked(String),
  /// A logical name is already mapped for this program.
  ///
  /// Registering it again would make name resolution ambiguous, so the first mapping is kept.
  AlternateNameTaken {
    /// Whether the mapping targets uniforms or attributes.
    kind: SymbolKind,
    /// Logical name being registered twice.
    logical: String,
    /// Canonical name the logical name is already mapped to.
    existing: String,
    /// Canonical name of the rejected registration.
    rejected: String,
  },
  /// Some uniform or attribute is ill-formed with regard to what the engine supports.
  Warning(ProgramWarning),
}

impl ProgramError {
  /// Create a link error.
  pub fn link_failed(reason: impl Into<String>) -> Self {
    ProgramError::LinkFailed(reason.into())
  }
}

impl fmt::Display for ProgramError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ProgramError::StageError(ref e) => write!(f, "shader program has stage error: {}", e),

      ProgramError::LinkFailed(ref s) => write!(f, "shader program failed to link: {}", s),

      ProgramError::NotLinked(ref name) => write!(f, "shader program {} is not linked", name),

      ProgramError::AlternateNameTaken {
        kind,
        ref logical,
        ref existing,
        ref rejected,
      } => write!(
        f,
        "alternate {} name {} is already mapped to {} (rejected mapping to {})",
        kind, logical, existing, rejected
      ),

      ProgramError::Warning(ref e) => write!(f, "shader program warning: {}", e),
    }
  }
}

impl error::Error for ProgramError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ProgramError::StageError(e) => Some(e),
      ProgramError::Warning(e) => Some(e),
      _ => None,
    }
  }
}

/// Program warnings, not necessarily considered blocking errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramWarning {
  /// Some uniform configuration is ill-formed. It can be a problem of inactive uniform, mismatch
  /// type, etc. Check the [`UniformWarning`] type for more information.
  Uniform(UniformWarning),
  /// Some vertex attribute is ill-formed.
  VertexAttrib(VertexAttribWarning),
}

impl fmt::Display for ProgramWarning {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ProgramWarning::Uniform(ref e) => write!(f, "uniform warning: {}", e),
      ProgramWarning::VertexAttrib(ref e) => write!(f, "vertex attribute warning: {}", e),
    }
  }
}

impl error::Error for ProgramWarning {}

impl From<ProgramWarning> for ProgramError {
  fn from(e: ProgramWarning) -> Self {
    ProgramError::Warning(e)
  }
}

/// Warnings related to uniform issues.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UniformWarning {
  /// Inactive uniform (not in use / no participation to the final output in shaders), or a name
  /// that resolves to nothing at all.
  Inactive(String),
  /// The value family doesn’t match the type that got reflected from the backend.
  ///
  /// The `String` is the name of the uniform; the type is the reflected one.
  TypeMismatch(String, GlslType),
  /// The number of values doesn’t fit the reflected type and array size.
  SizeMismatch {
    /// Name of the uniform.
    name: String,
    /// Number of scalar values the uniform can take at most.
    expected: usize,
    /// Number of scalar values that were provided.
    found: usize,
  },
  /// The reflected type has no entry in the uniform dispatch table.
  UnsupportedType(String, GlslType),
  /// No active uniform lives at that location in this program.
  UnknownLocation(i32),
}

impl UniformWarning {
  /// Create an inactive uniform warning.
  pub fn inactive<N>(name: N) -> Self
  where
    N: Into<String>,
  {
    UniformWarning::Inactive(name.into())
  }

  /// Create a type mismatch.
  pub fn type_mismatch<N>(name: N, ty: GlslType) -> Self
  where
    N: Into<String>,
  {
    UniformWarning::TypeMismatch(name.into(), ty)
  }

  /// Create a size mismatch.
  pub fn size_mismatch<N>(name: N, expected: usize, found: usize) -> Self
  where
    N: Into<String>,
  {
    UniformWarning::SizeMismatch {
      name: name.into(),
      expected,
      found,
    }
  }

  /// Create an unsupported type warning.
  pub fn unsupported_type<N>(name: N, ty: GlslType) -> Self
  where
    N: Into<String>,
  {
    UniformWarning::UnsupportedType(name.into(), ty)
  }
}

impl fmt::Display for UniformWarning {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      UniformWarning::Inactive(ref s) => write!(f, "inactive {} uniform", s),

      UniformWarning::TypeMismatch(ref n, ref t) => {
        write!(f, "type mismatch for uniform {}: {}", n, t)
      }

      UniformWarning::SizeMismatch {
        ref name,
        expected,
        found,
      } => write!(
        f,
        "size mismatch for uniform {}: expected at most {} values, found {}",
        name, expected, found
      ),

      UniformWarning::UnsupportedType(ref n, ref t) => {
        write!(f, "unsupported type {} for uniform {}", t, n)
      }

      UniformWarning::UnknownLocation(location) => {
        write!(f, "no active uniform at location {}", location)
      }
    }
  }
}

impl error::Error for UniformWarning {}

impl From<UniformWarning> for ProgramWarning {
  fn from(e: UniformWarning) -> Self {
    ProgramWarning::Uniform(e)
  }
}

impl From<UniformWarning> for ProgramError {
  fn from(e: UniformWarning) -> Self {
    ProgramError::Warning(e.into())
  }
}

/// Warnings related to vertex attributes issues.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VertexAttribWarning {
  /// Inactive vertex attribute (not read), or a name that resolves to nothing at all.
  Inactive(String),
  /// The attribute is declared as an array; only single-element attributes are supported.
  ArrayedAttribute {
    /// Name of the attribute.
    name: String,
    /// Number of elements reported by the backend.
    elements: usize,
  },
}

impl VertexAttribWarning {
  /// Create an inactive vertex attribute warning.
  pub fn inactive<N>(name: N) -> Self
  where
    N: Into<String>,
  {
    VertexAttribWarning::Inactive(name.into())
  }
}

impl fmt::Display for VertexAttribWarning {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      VertexAttribWarning::Inactive(ref s) => write!(f, "inactive {} vertex attribute", s),

      VertexAttribWarning::ArrayedAttribute { ref name, elements } => write!(
        f,
        "vertex attribute {} has {} elements; only single-element attributes are supported",
        name, elements
      ),
    }
  }
}

impl error::Error for VertexAttribWarning {}

impl From<VertexAttribWarning> for ProgramWarning {
  fn from(e: VertexAttribWarning) -> Self {
    ProgramWarning::VertexAttrib(e)
  }
}

impl From<VertexAttribWarning> for ProgramError {
  fn from(e: VertexAttribWarning) -> Self {
    ProgramError::Warning(e.into())
  }
}

/// A shader stage.
///
/// The compiled handle is either valid and backed by successfully compiled source, or absent.
/// Recompiling releases the old handle before the new one is created.
pub struct Stage<B>
where
  B: ?Sized + Shader,
{
  ty: StageType,
  name: String,
  source: String,
  repr: Option<B::StageRepr>,
}

impl<B> Stage<B>
where
  B: ?Sized + Shader,
{
  /// Create and compile a new stage.
  pub fn new(
    backend: &mut B,
    ty: StageType,
    name: impl Into<String>,
    source: impl Into<String>,
  ) -> Result<Self, StageError> {
    let mut stage = Stage {
      ty,
      name: name.into(),
      source: source.into(),
      repr: None,
    };

    stage.compile_current(backend)?;
    Ok(stage)
  }

  /// Replace the source of the stage and compile it again.
  ///
  /// The previous handle is released first; if compilation fails, the stage is left without a
  /// handle.
  pub fn compile(&mut self, backend: &mut B, source: impl Into<String>) -> Result<(), StageError> {
    self.source = source.into();
    self.compile_current(backend)
  }

  fn compile_current(&mut self, backend: &mut B) -> Result<(), StageError> {
    self.repr = None;

    match unsafe { backend.new_stage(self.ty, &self.source) } {
      Ok(repr) => {
        self.repr = Some(repr);
        Ok(())
      }

      Err(e) => {
        log::error!("cannot compile {} ({}): {}", self.name, self.ty, e);
        Err(e)
      }
    }
  }

  /// Type of the stage.
  pub fn ty(&self) -> StageType {
    self.ty
  }

  /// Human-readable name of the stage.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Source the stage was last compiled from.
  pub fn source(&self) -> &str {
    &self.source
  }

  /// Whether the stage currently holds a compiled handle.
  pub fn is_compiled(&self) -> bool {
    self.repr.is_some()
  }

  /// Compiled handle; `0` if the stage has none.
  pub fn handle(&self) -> u32 {
    self.repr.as_ref().map_or(0, B::stage_handle)
  }

  pub(crate) fn repr(&self) -> Result<&B::StageRepr, StageError> {
    self.repr.as_ref().ok_or(StageError::NotCompiled(self.ty))
  }
}

impl<B> fmt::Debug for Stage<B>
where
  B: ?Sized + Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("Stage")
      .field("ty", &self.ty)
      .field("name", &self.name)
      .field("handle", &self.handle())
      .finish()
  }
}
