//! Graphics context.
//!
//! A graphics context is an object that abstracts all the low-level operations that happen on a
//! graphics device (it can be a GPU or a software implementation, for instance).
//!
//! This crate doesn’t provide you with creating such contexts. Instead, you must do it yourself
//! or rely on crates doing it for you. Once you have a backend, wrap it in a [`RenderContext`]:
//! it owns the backend along with the [`ShaderRegistry`] of programs built with it.
//!
//! # On context and threads
//!
//!   - An object which type implements `GraphicsContext` must be `!Send` and `!Sync`. This
//!     enforces that it cannot be moved nor shared between threads.
//!   - You can only create a single context per thread.

use std::rc::Rc;

use crate::backend::shader::Shader;
use crate::registry::{RegistryError, ShaderDescriptor, ShaderRegistry};
use crate::shader::Program;

/// Class of graphics context.
///
/// Such a context must not be Send nor Sync, which means that you cannot share it between
/// threads in any way (move / borrow).
pub unsafe trait GraphicsContext {
  type Backend: ?Sized;

  fn backend(&mut self) -> &mut Self::Backend;
}

/// A backend and the programs built with it.
pub struct RenderContext<B>
where
  B: Shader,
{
  // programs release their GPU objects before the backend goes away
  registry: ShaderRegistry<B>,
  backend: B,
}

impl<B> RenderContext<B>
where
  B: Shader,
{
  pub fn new(backend: B) -> Self {
    RenderContext {
      registry: ShaderRegistry::new(),
      backend,
    }
  }

  pub fn registry(&self) -> &ShaderRegistry<B> {
    &self.registry
  }

  /// Backend and registry, borrowed together.
  pub fn parts_mut(&mut self) -> (&mut B, &mut ShaderRegistry<B>) {
    (&mut self.backend, &mut self.registry)
  }

  /// Get a registered program.
  pub fn shader(&mut self, name: &str) -> Result<Rc<Program<B>>, RegistryError> {
    self.registry.get(&mut self.backend, name)
  }

  pub fn default_shader(&mut self) -> Result<Rc<Program<B>>, RegistryError> {
    self.registry.default_program(&mut self.backend)
  }

  /// See [`ShaderRegistry::get_or_create`].
  pub fn shader_from_descriptor(
    &mut self,
    desc: &ShaderDescriptor,
  ) -> Result<Rc<Program<B>>, RegistryError> {
    self.registry.get_or_create(&mut self.backend, desc)
  }

  /// See [`ShaderRegistry::load_descriptors`].
  pub fn load_shaders(&mut self, json: &str) -> Result<Vec<Rc<Program<B>>>, RegistryError> {
    self.registry.load_descriptors(&mut self.backend, json)
  }

  /// Build a program and register it.
  pub fn register_shader(
    &mut self,
    name: &str,
    vertex_src: &str,
    fragment_src: &str,
  ) -> Result<Rc<Program<B>>, RegistryError> {
    let program =
      Program::new(&mut self.backend, name, vertex_src, fragment_src).map_err(|error| {
        RegistryError::Program {
          name: name.to_owned(),
          error,
        }
      })?;

    self.registry.register(&mut self.backend, program)
  }

  pub fn into_backend(self) -> B {
    let RenderContext { registry, backend } = self;
    drop(registry);
    backend
  }
}

unsafe impl<B> GraphicsContext for RenderContext<B>
where
  B: Shader,
{
  type Backend = B;

  fn backend(&mut self) -> &mut Self::Backend {
    &mut self.backend
  }
}
