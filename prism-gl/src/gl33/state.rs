//! Graphics state.

use gl::types::*;
use std::cell::RefCell;
use std::error;
use std::fmt;
use std::marker::PhantomData;

// TLS synchronization barrier for `GLState`.
thread_local!(static TLS_ACQUIRE_GFX_STATE: RefCell<Option<()>> = RefCell::new(Some(())));

/// Cached value.
///
/// A cached value is used to prevent issuing costly GPU commands if we know the target value is
/// already set to what the command tries to set. For instance, if you ask to use the program `34`
/// once, that value will be set on the GPU and cached on our side. Later, if no other program has
/// been used, asking to use the program `34` again doesn’t perform anything GPU-wise.
#[derive(Debug)]
struct Cached<T>(Option<T>)
where
  T: PartialEq;

impl<T> Cached<T>
where
  T: PartialEq,
{
  fn new(initial: T) -> Self {
    Cached(Some(initial))
  }

  /// Explicitly invalidate a value.
  ///
  /// This is necessary when we want to be able to force a GPU command to run.
  fn invalidate(&mut self) {
    self.0 = None;
  }

  fn set(&mut self, value: T) {
    self.0 = Some(value);
  }

  /// A non-cached value is always invalid; a cached one is invalid if it differs from `new_val`.
  fn is_invalid(&self, new_val: &T) -> bool {
    match &self.0 {
      Some(ref t) => t != new_val,
      _ => true,
    }
  }

  fn is(&self, val: &T) -> bool {
    !self.is_invalid(val)
  }
}

/// The graphics state.
///
/// This type represents the current state of a given graphics context. It adds a small cache
/// layer over the low-level API to prevent issuing the same call (with the same parameters)
/// twice, and tracks the vertex attribute locations currently enabled.
#[derive(Debug)]
pub struct GLState {
  _a: PhantomData<*const ()>, // !Send and !Sync

  // shader program
  current_program: Cached<GLuint>,

  // vertex attributes
  enabled_vertex_attribs: Vec<GLuint>,
}

impl GLState {
  /// Create a new `GLState`.
  ///
  /// > Note: keep in mind you can create only one per thread.
  pub(crate) fn new() -> Result<Self, StateQueryError> {
    TLS_ACQUIRE_GFX_STATE.with(|rc| {
      let mut inner = rc.borrow_mut();

      match *inner {
        Some(_) => {
          inner.take();
          Self::get_from_context()
        }

        None => Err(StateQueryError::UnavailableGLState),
      }
    })
  }

  /// Get a `GLState` from the current OpenGL context.
  fn get_from_context() -> Result<Self, StateQueryError> {
    unsafe {
      let current_program = Cached::new(get_ctx_current_program()?);

      Ok(GLState {
        _a: PhantomData,
        current_program,
        enabled_vertex_attribs: Vec::new(),
      })
    }
  }

  /// Invalidate the currently in-use shader program.
  pub fn invalidate_shader_program(&mut self) {
    self.current_program.invalidate();
  }

  /// Vertex attribute locations currently enabled.
  pub fn enabled_vertex_attribs(&self) -> &[GLuint] {
    &self.enabled_vertex_attribs
  }

  pub(crate) unsafe fn use_program(&mut self, handle: GLuint) {
    if self.current_program.is_invalid(&handle) {
      gl::UseProgram(handle);
      self.current_program.set(handle);
    }
  }

  /// Forget a program that is about to be deleted; its handle might be reused.
  pub(crate) fn drop_program(&mut self, handle: GLuint) {
    if self.current_program.is(&handle) {
      self.current_program.invalidate();
    }
  }

  pub(crate) unsafe fn enable_vertex_attrib(&mut self, location: GLuint) {
    if !self.enabled_vertex_attribs.contains(&location) {
      gl::EnableVertexAttribArray(location);
      self.enabled_vertex_attribs.push(location);
    }
  }

  pub(crate) unsafe fn disable_vertex_attrib(&mut self, location: GLuint) {
    if let Some(index) = self
      .enabled_vertex_attribs
      .iter()
      .position(|&enabled| enabled == location)
    {
      gl::DisableVertexAttribArray(location);
      self.enabled_vertex_attribs.swap_remove(index);
    }
  }
}

/// An error that might happen when the context is queried.
#[non_exhaustive]
#[derive(Debug)]
pub enum StateQueryError {
  /// The [`GLState`] object is unavailable.
  ///
  /// That might occur if the current thread doesn’t support allocating a new graphics state. It
  /// might happen if you try to have more than one state on the same thread, for instance.
  UnavailableGLState,
  /// The context reported a negative object binding.
  InvalidBinding(GLenum, GLint),
}

impl fmt::Display for StateQueryError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StateQueryError::UnavailableGLState => write!(f, "unavailable graphics state"),
      StateQueryError::InvalidBinding(target, value) => {
        write!(f, "invalid binding 0x{:x} reported for 0x{:x}", value, target)
      }
    }
  }
}

impl error::Error for StateQueryError {}

unsafe fn get_ctx_binding(target: GLenum) -> Result<GLuint, StateQueryError> {
  let mut bound = 0 as GLint;
  gl::GetIntegerv(target, &mut bound);
  GLuint::try_from(bound).map_err(|_| StateQueryError::InvalidBinding(target, bound))
}

unsafe fn get_ctx_current_program() -> Result<GLuint, StateQueryError> {
  get_ctx_binding(gl::CURRENT_PROGRAM)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cached_values() {
    let mut cached = Cached::new(3);
    assert!(cached.is(&3));
    assert!(cached.is_invalid(&4));

    cached.invalidate();
    assert!(cached.is_invalid(&3));

    cached.set(4);
    assert!(cached.is(&4));
  }
}
