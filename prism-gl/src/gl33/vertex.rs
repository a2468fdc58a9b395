use crate::gl33::GL33;
use gl::{self, types::*};
use prism::{
  backend::vertex::{VertexAttrib, VertexAttribPointer},
  vertex::AttrFormat,
};
use std::ffi::c_void;

unsafe impl VertexAttrib for GL33 {
  unsafe fn enable_vertex_attrib(
    &mut self,
    buffer: u32,
    location: u32,
    pointer: &VertexAttribPointer,
  ) {
    // the geometry producer binds buffers too
    gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
    self.state.borrow_mut().enable_vertex_attrib(location);

    gl::VertexAttribPointer(
      location,
      pointer.elements as GLint,
      opengl_attr_format(pointer.format),
      if pointer.normalise {
        gl::TRUE
      } else {
        gl::FALSE
      },
      pointer.stride as GLsizei,
      pointer.offset as *const c_void,
    );
  }

  unsafe fn disable_vertex_attrib(&mut self, location: u32) {
    self.state.borrow_mut().disable_vertex_attrib(location);
  }
}

fn opengl_attr_format(format: AttrFormat) -> GLenum {
  match format {
    AttrFormat::Bool => gl::BYTE,
    AttrFormat::HalfFloat => gl::HALF_FLOAT,
    AttrFormat::Float => gl::FLOAT,
    AttrFormat::Double => gl::DOUBLE,
    AttrFormat::Fixed => gl::FIXED,
    AttrFormat::Short => gl::SHORT,
    AttrFormat::UnsignedShort => gl::UNSIGNED_SHORT,
    AttrFormat::Byte => gl::BYTE,
    AttrFormat::UnsignedByte => gl::UNSIGNED_BYTE,
    AttrFormat::Int => gl::INT,
    AttrFormat::UnsignedInt => gl::UNSIGNED_INT,
    AttrFormat::Int2_10_10_10Rev => gl::INT_2_10_10_10_REV,
    AttrFormat::UnsignedInt2_10_10_10Rev => gl::UNSIGNED_INT_2_10_10_10_REV,
    AttrFormat::UnsignedInt10f11f11fRev => gl::UNSIGNED_INT_10F_11F_11F_REV,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn booleans_are_bytes() {
    assert_eq!(opengl_attr_format(AttrFormat::Bool), gl::BYTE);
    assert_eq!(opengl_attr_format(AttrFormat::Byte), gl::BYTE);
    assert_eq!(opengl_attr_format(AttrFormat::Fixed), gl::FIXED);
  }
}
