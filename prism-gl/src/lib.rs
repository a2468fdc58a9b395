//! OpenGL backends.
//!
//! This crate exports [OpenGL](https://www.khronos.org/opengl/) backends for
//! `prism`. Pick the backend type you want (currently, only
//! [`GL33`]), create it once your OpenGL context is current on the thread, and hand it to a
//! [`RenderContext`](prism::context::RenderContext).

#[cfg(feature = "gl33")]
pub mod gl33;

#[cfg(feature = "gl33")]
pub use gl33::GL33;
