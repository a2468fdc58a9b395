use crate::gl33::state::GLState;
use crate::gl33::GL33;
use gl::{self, types::*};
use prism::{
  backend::shader::Shader,
  shader::{
    uniform::Values, ActiveSymbol, GlslType, ProgramError, StageError, StageType, UniformUpdate,
  },
};
use std::{cell::RefCell, ffi::CString, ptr::null, rc::Rc};

#[derive(Debug)]
pub struct Stage {
  handle: GLuint,
  ty: StageType,
}

impl Drop for Stage {
  fn drop(&mut self) {
    log::debug!("deleting {} {}", self.ty, self.handle);

    unsafe {
      gl::DeleteShader(self.handle);
    }
  }
}

#[derive(Debug)]
pub struct Program {
  pub(crate) handle: GLuint,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Program {
  fn drop(&mut self) {
    self.state.borrow_mut().drop_program(self.handle);

    unsafe {
      gl::DeleteProgram(self.handle);
    }
  }
}

type GetActiveFn =
  unsafe fn(GLuint, GLuint, GLsizei, *mut GLsizei, *mut GLint, *mut GLenum, *mut GLchar);

type GetLocationFn = unsafe fn(GLuint, *const GLchar) -> GLint;

impl Program {
  fn link(&self) -> Result<(), ProgramError> {
    let handle = self.handle;

    unsafe {
      gl::LinkProgram(handle);

      let mut linked = GLint::from(gl::FALSE);
      gl::GetProgramiv(handle, gl::LINK_STATUS, &mut linked);

      if is_gl_true(linked) {
        Ok(())
      } else {
        let mut log_len: GLint = 0;
        gl::GetProgramiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

        let mut log = vec![0u8; log_len.max(0) as usize];
        let mut written: GLsizei = 0;
        gl::GetProgramInfoLog(
          handle,
          log_len,
          &mut written,
          log.as_mut_ptr() as *mut GLchar,
        );
        log.truncate(written.max(0) as usize);

        Err(ProgramError::link_failed(
          String::from_utf8_lossy(&log).into_owned(),
        ))
      }
    }
  }

  // shared by uniforms and attributes: both are enumerated by index and resolved by name
  unsafe fn actives(
    &self,
    count_param: GLenum,
    max_len_param: GLenum,
    get_active: GetActiveFn,
    get_location: GetLocationFn,
  ) -> Vec<ActiveSymbol> {
    let mut count: GLint = 0;
    gl::GetProgramiv(self.handle, count_param, &mut count);

    let mut max_len: GLint = 0;
    gl::GetProgramiv(self.handle, max_len_param, &mut max_len);

    let mut name = vec![0u8; max_len.max(1) as usize];
    let mut actives = Vec::with_capacity(count.max(0) as usize);

    for index in 0..count.max(0) as GLuint {
      let mut len: GLsizei = 0;
      let mut size: GLint = 0;
      let mut ty: GLenum = 0;

      get_active(
        self.handle,
        index,
        name.len() as GLsizei,
        &mut len,
        &mut size,
        &mut ty,
        name.as_mut_ptr() as *mut GLchar,
      );

      let raw_name = String::from_utf8_lossy(&name[..len.max(0) as usize]).into_owned();
      let symbol_name = strip_array_suffix(&raw_name).to_owned();

      let location = match CString::new(raw_name) {
        Ok(c_name) => get_location(self.handle, c_name.as_ptr()),
        Err(_) => -1,
      };

      // built-in inputs and block members have no location
      if location < 0 {
        log::debug!("skipping active symbol {} without location", symbol_name);
        continue;
      }

      actives.push(ActiveSymbol {
        name: symbol_name,
        elements: size.max(1) as usize,
        ty: glsl_type(ty),
        location,
      });
    }

    actives
  }
}

unsafe impl Shader for GL33 {
  type StageRepr = Stage;

  type ProgramRepr = Program;

  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError> {
    let c_src = CString::new(header_src(self.glsl_header(), src))
      .map_err(|_| StageError::compilation_failed(ty, "source contains a NUL byte"))?;

    let handle = gl::CreateShader(opengl_shader_type(ty));

    if handle == 0 {
      return Err(StageError::compilation_failed(
        ty,
        "unable to create shader stage",
      ));
    }

    gl::ShaderSource(handle, 1, [c_src.as_ptr()].as_ptr(), null());
    gl::CompileShader(handle);

    let mut compiled = GLint::from(gl::FALSE);
    gl::GetShaderiv(handle, gl::COMPILE_STATUS, &mut compiled);

    if is_gl_true(compiled) {
      Ok(Stage { handle, ty })
    } else {
      let mut log_len: GLint = 0;
      gl::GetShaderiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

      let mut log = vec![0u8; log_len.max(0) as usize];
      let mut written: GLsizei = 0;
      gl::GetShaderInfoLog(
        handle,
        log_len,
        &mut written,
        log.as_mut_ptr() as *mut GLchar,
      );
      log.truncate(written.max(0) as usize);

      gl::DeleteShader(handle);

      Err(StageError::compilation_failed(
        ty,
        String::from_utf8_lossy(&log).into_owned(),
      ))
    }
  }

  fn stage_handle(stage: &Self::StageRepr) -> u32 {
    stage.handle
  }

  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    let handle = gl::CreateProgram();

    if handle == 0 {
      return Err(ProgramError::link_failed("unable to create program"));
    }

    gl::AttachShader(handle, vertex.handle);
    gl::AttachShader(handle, fragment.handle);

    let program = Program {
      handle,
      state: self.state.clone(),
    };

    program.link().map(move |_| program)
  }

  fn program_handle(program: &Self::ProgramRepr) -> u32 {
    program.handle
  }

  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol> {
    program.actives(
      gl::ACTIVE_UNIFORMS,
      gl::ACTIVE_UNIFORM_MAX_LENGTH,
      gl::GetActiveUniform,
      gl::GetUniformLocation,
    )
  }

  unsafe fn active_attributes(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol> {
    program.actives(
      gl::ACTIVE_ATTRIBUTES,
      gl::ACTIVE_ATTRIBUTE_MAX_LENGTH,
      gl::GetActiveAttrib,
      gl::GetAttribLocation,
    )
  }

  unsafe fn use_program(&mut self, program: &Self::ProgramRepr) {
    self.state.borrow_mut().use_program(program.handle);
  }

  unsafe fn set_uniform(
    &mut self,
    _program: &Self::ProgramRepr,
    location: i32,
    update: UniformUpdate,
  ) {
    match update {
      UniformUpdate::Int {
        components,
        count,
        values,
      } => {
        let f = match components {
          1 => gl::Uniform1iv,
          2 => gl::Uniform2iv,
          3 => gl::Uniform3iv,
          4 => gl::Uniform4iv,
          _ => return unsupported_shape(location, components),
        };

        f(location, count as GLsizei, ptr(&values));
      }

      UniformUpdate::UInt {
        components,
        count,
        values,
      } => {
        let f = match components {
          1 => gl::Uniform1uiv,
          2 => gl::Uniform2uiv,
          3 => gl::Uniform3uiv,
          4 => gl::Uniform4uiv,
          _ => return unsupported_shape(location, components),
        };

        f(location, count as GLsizei, ptr(&values));
      }

      UniformUpdate::Float {
        components,
        count,
        values,
      } => {
        let f = match components {
          1 => gl::Uniform1fv,
          2 => gl::Uniform2fv,
          3 => gl::Uniform3fv,
          4 => gl::Uniform4fv,
          _ => return unsupported_shape(location, components),
        };

        f(location, count as GLsizei, ptr(&values));
      }

      UniformUpdate::Matrix {
        columns,
        count,
        values,
      } => {
        let f = match columns {
          2 => gl::UniformMatrix2fv,
          3 => gl::UniformMatrix3fv,
          4 => gl::UniformMatrix4fv,
          _ => return unsupported_shape(location, columns),
        };

        f(location, count as GLsizei, gl::FALSE, ptr(&values));
      }
    }
  }
}

fn ptr<T>(values: &Values<T>) -> *const T {
  values.as_slice().as_ptr()
}

fn unsupported_shape(location: i32, components: usize) {
  log::warn!(
    "no uniform entry point for {} components (location {})",
    components,
    location
  );
}

fn is_gl_true(status: GLint) -> bool {
  status == GLint::from(gl::TRUE)
}

fn opengl_shader_type(t: StageType) -> GLenum {
  match t {
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
  }
}

fn header_src(header: Option<&str>, src: &str) -> String {
  match header {
    Some(header) => {
      let mut full = String::with_capacity(header.len() + src.len() + 1);
      full.push_str(header);

      if !header.ends_with('\n') {
        full.push('\n');
      }

      full.push_str(src);
      full
    }

    None => src.to_owned(),
  }
}

// the driver reports array uniforms as `name[0]`
fn strip_array_suffix(name: &str) -> &str {
  name.strip_suffix("[0]").unwrap_or(name)
}

fn glsl_type(glty: GLenum) -> GlslType {
  match glty {
    // scalars
    gl::INT => GlslType::Int,
    gl::UNSIGNED_INT => GlslType::UInt,
    gl::FLOAT => GlslType::Float,
    gl::BOOL => GlslType::Bool,
    // vectors
    gl::INT_VEC2 => GlslType::IVec2,
    gl::INT_VEC3 => GlslType::IVec3,
    gl::INT_VEC4 => GlslType::IVec4,
    gl::UNSIGNED_INT_VEC2 => GlslType::UIVec2,
    gl::UNSIGNED_INT_VEC3 => GlslType::UIVec3,
    gl::UNSIGNED_INT_VEC4 => GlslType::UIVec4,
    gl::FLOAT_VEC2 => GlslType::Vec2,
    gl::FLOAT_VEC3 => GlslType::Vec3,
    gl::FLOAT_VEC4 => GlslType::Vec4,
    gl::BOOL_VEC2 => GlslType::BVec2,
    gl::BOOL_VEC3 => GlslType::BVec3,
    gl::BOOL_VEC4 => GlslType::BVec4,
    // matrices
    gl::FLOAT_MAT2 => GlslType::M22,
    gl::FLOAT_MAT3 => GlslType::M33,
    gl::FLOAT_MAT4 => GlslType::M44,
    // textures
    gl::INT_SAMPLER_2D => GlslType::ISampler2D,
    gl::UNSIGNED_INT_SAMPLER_2D => GlslType::UISampler2D,
    gl::SAMPLER_1D => GlslType::Sampler1D,
    gl::SAMPLER_2D => GlslType::Sampler2D,
    gl::SAMPLER_3D => GlslType::Sampler3D,
    gl::SAMPLER_2D_ARRAY => GlslType::Sampler2DArray,
    gl::SAMPLER_CUBE => GlslType::Cubemap,
    _ => GlslType::Unknown(glty),
  }
}
