//! The shader registry.
//!
//! A [`ShaderRegistry`] is a named collection of shared [`Program`]s. It’s populated with the
//! [built-in programs](crate::shader::builtin) the first time it’s accessed, and with user
//! programs described by [`ShaderDescriptor`]s, usually loaded from data files.
//!
//! A registry is owned by a rendering context (see [`RenderContext`]); it lives as long as that
//! context and is never shared between threads.
//!
//! [`RenderContext`]: crate::context::RenderContext
//!
//! # Descriptor documents
//!
//! Descriptors are JSON objects:
//!
//! ```json
//! {
//!   "name": "tinted",
//!   "vertex": "…",
//!   "fragment": "…",
//!   "uniforms": { "color": "u_tint" },
//!   "attributes": { "position": "a_vertex" }
//! }
//! ```
//!
//! `uniforms` and `attributes` are optional and map logical names to canonical ones. A document
//! is either a single descriptor or an object with an `instances` list of descriptors.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error;
use std::fmt;
use std::rc::Rc;

use crate::backend::shader::Shader;
use crate::shader::builtin::{self, BuiltinShader};
use crate::shader::{Program, ProgramError};

/// A user-defined program description.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShaderDescriptor {
  pub name: String,
  pub vertex: String,
  pub fragment: String,
  /// Logical name → canonical name.
  #[serde(default)]
  pub uniforms: BTreeMap<String, String>,
  /// Logical name → canonical name.
  #[serde(default)]
  pub attributes: BTreeMap<String, String>,
}

impl ShaderDescriptor {
  pub fn new(
    name: impl Into<String>,
    vertex: impl Into<String>,
    fragment: impl Into<String>,
  ) -> Self {
    ShaderDescriptor {
      name: name.into(),
      vertex: vertex.into(),
      fragment: fragment.into(),
      uniforms: BTreeMap::new(),
      attributes: BTreeMap::new(),
    }
  }

  pub fn with_uniform(mut self, logical: impl Into<String>, canonical: impl Into<String>) -> Self {
    self.uniforms.insert(logical.into(), canonical.into());
    self
  }

  pub fn with_attribute(
    mut self,
    logical: impl Into<String>,
    canonical: impl Into<String>,
  ) -> Self {
    self.attributes.insert(logical.into(), canonical.into());
    self
  }

  /// Parse a descriptor document into its descriptors.
  pub fn parse_document(json: &str) -> Result<Vec<Self>, serde_json::Error> {
    let document: serde_json::Value = serde_json::from_str(json)?;

    match document.get("instances") {
      Some(instances) => Vec::deserialize(instances),
      None => ShaderDescriptor::deserialize(&document).map(|desc| vec![desc]),
    }
  }
}

/// Errors the registry can emit.
#[derive(Debug)]
pub enum RegistryError {
  /// No program is registered under that name.
  UnknownShader(String),
  /// A program failed to build.
  Program {
    /// Name of the program.
    name: String,
    error: ProgramError,
  },
  /// A descriptor document is malformed.
  Descriptor(serde_json::Error),
}

impl RegistryError {
  fn program(name: impl Into<String>, error: ProgramError) -> Self {
    RegistryError::Program {
      name: name.into(),
      error,
    }
  }
}

impl fmt::Display for RegistryError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      RegistryError::UnknownShader(ref name) => write!(f, "shader {} not found", name),

      RegistryError::Program {
        ref name,
        ref error,
      } => write!(f, "cannot build shader {}: {}", name, error),

      RegistryError::Descriptor(ref e) => write!(f, "malformed shader descriptor: {}", e),
    }
  }
}

impl error::Error for RegistryError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      RegistryError::UnknownShader(_) => None,
      RegistryError::Program { error, .. } => Some(error),
      RegistryError::Descriptor(e) => Some(e),
    }
  }
}

impl From<serde_json::Error> for RegistryError {
  fn from(e: serde_json::Error) -> Self {
    RegistryError::Descriptor(e)
  }
}

/// Named collection of shared programs.
pub struct ShaderRegistry<B>
where
  B: ?Sized + Shader,
{
  builtins: OnceCell<()>,
  programs: HashMap<String, Rc<Program<B>>>,
}

impl<B> Default for ShaderRegistry<B>
where
  B: ?Sized + Shader,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<B> ShaderRegistry<B>
where
  B: ?Sized + Shader,
{
  /// Create an empty registry. Built-in programs are compiled on first access.
  pub fn new() -> Self {
    ShaderRegistry {
      builtins: OnceCell::new(),
      programs: HashMap::new(),
    }
  }

  fn ensure_builtins(&mut self, backend: &mut B) -> Result<(), RegistryError> {
    let programs = &mut self.programs;

    self
      .builtins
      .get_or_try_init(|| -> Result<(), RegistryError> {
        for def in builtin::BUILTINS {
          let program = build_builtin(backend, def)?;
          programs.insert(def.name.to_owned(), Rc::new(program));
        }

        log::debug!("{} built-in shaders ready", builtin::BUILTINS.len());
        Ok(())
      })
      .map(|_| ())
  }

  /// Whether the built-in programs have been compiled yet.
  pub fn builtins_ready(&self) -> bool {
    self.builtins.get().is_some()
  }

  /// Get a registered program.
  pub fn get(&mut self, backend: &mut B, name: &str) -> Result<Rc<Program<B>>, RegistryError> {
    self.ensure_builtins(backend)?;

    self.programs.get(name).cloned().ok_or_else(|| {
      log::error!("shader {} not found", name);
      RegistryError::UnknownShader(name.to_owned())
    })
  }

  /// Get the [`default`](builtin::DEFAULT) built-in program.
  pub fn default_program(&mut self, backend: &mut B) -> Result<Rc<Program<B>>, RegistryError> {
    self.get(backend, builtin::DEFAULT)
  }

  /// Register a program under its name, replacing any program with the same name.
  pub fn register(
    &mut self,
    backend: &mut B,
    program: Program<B>,
  ) -> Result<Rc<Program<B>>, RegistryError> {
    self.ensure_builtins(backend)?;

    let name = program.name().to_owned();
    let program = Rc::new(program);

    if self.programs.insert(name.clone(), program.clone()).is_some() {
      log::warn!("overwriting shader {}", name);
    }

    Ok(program)
  }

  /// Get the program a descriptor names, building and registering it if it doesn’t exist yet.
  ///
  /// An existing program always wins: it’s returned as-is, even if the descriptor holds other
  /// sources.
  pub fn get_or_create(
    &mut self,
    backend: &mut B,
    desc: &ShaderDescriptor,
  ) -> Result<Rc<Program<B>>, RegistryError> {
    self.ensure_builtins(backend)?;

    if let Some(existing) = self.programs.get(&desc.name) {
      if existing.vertex_stage().source() != desc.vertex
        || existing.fragment_stage().source() != desc.fragment
      {
        log::warn!(
          "shader {} already exists; ignoring conflicting descriptor",
          desc.name
        );
      }

      return Ok(existing.clone());
    }

    let program = build_from_descriptor(backend, desc)?;
    let program = Rc::new(program);
    self.programs.insert(desc.name.clone(), program.clone());

    Ok(program)
  }

  /// Load every descriptor of a JSON document.
  pub fn load_descriptors(
    &mut self,
    backend: &mut B,
    json: &str,
  ) -> Result<Vec<Rc<Program<B>>>, RegistryError> {
    let descs = ShaderDescriptor::parse_document(json)?;

    descs
      .iter()
      .map(|desc| self.get_or_create(backend, desc))
      .collect()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.programs.contains_key(name)
  }

  /// Names of the registered programs, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<_> = self.programs.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  pub fn len(&self) -> usize {
    self.programs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.programs.is_empty()
  }
}

impl<B> fmt::Debug for ShaderRegistry<B>
where
  B: ?Sized + Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("ShaderRegistry")
      .field("builtins_ready", &self.builtins_ready())
      .field("programs", &self.names())
      .finish()
  }
}

fn build_builtin<B>(backend: &mut B, def: &BuiltinShader) -> Result<Program<B>, RegistryError>
where
  B: ?Sized + Shader,
{
  let build = |backend: &mut B| -> Result<Program<B>, ProgramError> {
    let mut program = Program::new(backend, def.name, def.vertex, def.fragment)?;

    for &(logical, canonical) in def.uniforms {
      program.set_alternate_uniform_name(canonical, logical)?;
    }

    for &(logical, canonical) in def.attributes {
      program.set_alternate_attribute_name(canonical, logical)?;
    }

    Ok(program)
  };

  build(backend).map_err(|e| RegistryError::program(def.name, e))
}

fn build_from_descriptor<B>(
  backend: &mut B,
  desc: &ShaderDescriptor,
) -> Result<Program<B>, RegistryError>
where
  B: ?Sized + Shader,
{
  let build = |backend: &mut B| -> Result<Program<B>, ProgramError> {
    let mut program = Program::new(backend, &desc.name, &desc.vertex, &desc.fragment)?;

    for (logical, canonical) in &desc.uniforms {
      program.set_alternate_uniform_name(canonical, logical)?;
    }

    for (logical, canonical) in &desc.attributes {
      program.set_alternate_attribute_name(canonical, logical)?;
    }

    Ok(program)
  };

  build(backend).map_err(|e| RegistryError::program(&desc.name, e))
}
