//! OpenGL 3.3 backend.
//!
//! This module implements an OpenGL 3.3 backend for prism. The backend type is [`GL33`].

mod shader;
mod state;
mod vertex;

pub use self::shader::{Program, Stage};
pub use self::state::GLState;
pub use self::state::StateQueryError;
use std::cell::RefCell;
use std::rc::Rc;

/// An OpenGL 3.3 backend.
///
/// This type is to be used as a prism backend type. It implements the whole backend API.
#[derive(Debug)]
pub struct GL33 {
  pub(crate) state: Rc<RefCell<GLState>>,
  glsl_header: Option<String>,
}

impl GL33 {
  /// Create a new OpenGL 3.3 backend.
  ///
  /// An OpenGL context must be current on the calling thread. Only one backend can be created
  /// per thread.
  pub fn new() -> Result<Self, StateQueryError> {
    GLState::new().map(|state| GL33 {
      state: Rc::new(RefCell::new(state)),
      glsl_header: None,
    })
  }

  /// Prepend `header` (typically a `#version` line) to every stage source before compiling it.
  pub fn with_glsl_header(mut self, header: impl Into<String>) -> Self {
    self.glsl_header = Some(header.into());
    self
  }

  pub fn glsl_header(&self) -> Option<&str> {
    self.glsl_header.as_deref()
  }

  /// Internal access to the backend state.
  ///
  /// # Unsafety
  ///
  /// This method is **highly unsafe** as it exposes the internals of the backend. Playing with it
  /// should be done with extreme caution.
  pub unsafe fn state(&self) -> &Rc<RefCell<GLState>> {
    &self.state
  }
}
