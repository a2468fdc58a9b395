//! Vertex attribute backend.

use crate::backend::shader::Shader;
use crate::vertex::AttrFormat;

/// Memory layout of one vertex attribute inside a bound buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VertexAttribPointer {
  /// Number of components per vertex (1 to 4).
  pub elements: usize,
  pub format: AttrFormat,
  /// Whether integer data is normalised to `[0; 1]` / `[-1; 1]` when read as floats.
  pub normalise: bool,
  /// Distance in bytes between two consecutive vertices; `0` means tightly packed.
  pub stride: usize,
  /// Byte offset of the first component in the buffer.
  pub offset: usize,
}

/// Vertex attribute wiring.
pub unsafe trait VertexAttrib: Shader {
  /// Bind `buffer` as the vertex source and enable `location` with the given layout.
  unsafe fn enable_vertex_attrib(
    &mut self,
    buffer: u32,
    location: u32,
    pointer: &VertexAttribPointer,
  );

  /// Disable a vertex attribute location.
  unsafe fn disable_vertex_attrib(&mut self, location: u32);
}
