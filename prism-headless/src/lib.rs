//! A GPU-less backend for `prism`.
//!
//! [`Headless`] implements the whole prism backend API without a graphics context. Stage sources
//! are parsed just enough to extract their interface (see [`glsl`]), linking validates the
//! interface between the two stages, and every backend call is recorded so that tests can
//! observe what the engine asked for.
//!
//! Active uniforms get locations in name order, array uniforms taking one location per element.
//! Active attributes get locations in declaration order. Uniform updates are recorded against
//! the current program, as a GL driver would.

pub mod glsl;
mod texture;

pub use crate::texture::HeadlessTexture;

use prism::backend::shader::Shader;
use prism::backend::vertex::{VertexAttrib, VertexAttribPointer};
use prism::shader::{ActiveSymbol, ProgramError, StageError, StageType, UniformUpdate};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use crate::glsl::{Declaration, StageInterface, Storage};

/// A backend call, as recorded by [`Headless`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  CompileStage { handle: u32, ty: StageType },
  DeleteStage(u32),
  LinkProgram(u32),
  DeleteProgram(u32),
  UseProgram(u32),
  SetUniform {
    program: u32,
    location: i32,
    value: RecordedUniform,
  },
  EnableVertexAttrib {
    buffer: u32,
    location: u32,
    pointer: VertexAttribPointer,
  },
  DisableVertexAttrib(u32),
}

/// Owned copy of a uniform update.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedUniform {
  Int { components: usize, values: Vec<i32> },
  UInt { components: usize, values: Vec<u32> },
  Float { components: usize, values: Vec<f32> },
  Matrix { columns: usize, values: Vec<f32> },
}

impl RecordedUniform {
  pub fn as_ints(&self) -> Option<&[i32]> {
    match self {
      RecordedUniform::Int { values, .. } => Some(values),
      _ => None,
    }
  }

  pub fn as_uints(&self) -> Option<&[u32]> {
    match self {
      RecordedUniform::UInt { values, .. } => Some(values),
      _ => None,
    }
  }

  /// Floats of a vector or of a matrix.
  pub fn as_floats(&self) -> Option<&[f32]> {
    match self {
      RecordedUniform::Float { values, .. } | RecordedUniform::Matrix { values, .. } => Some(values),
      _ => None,
    }
  }
}

impl<'a> From<UniformUpdate<'a>> for RecordedUniform {
  fn from(update: UniformUpdate<'a>) -> Self {
    match update {
      UniformUpdate::Int {
        components, values, ..
      } => RecordedUniform::Int {
        components,
        values: values.as_slice().to_vec(),
      },

      UniformUpdate::UInt {
        components, values, ..
      } => RecordedUniform::UInt {
        components,
        values: values.as_slice().to_vec(),
      },

      UniformUpdate::Float {
        components, values, ..
      } => RecordedUniform::Float {
        components,
        values: values.as_slice().to_vec(),
      },

      UniformUpdate::Matrix {
        columns, values, ..
      } => RecordedUniform::Matrix {
        columns,
        values: values.as_slice().to_vec(),
      },
    }
  }
}

#[derive(Debug, Default)]
struct HeadlessState {
  next_handle: u32,
  live_stages: BTreeSet<u32>,
  live_programs: BTreeSet<u32>,
  current_program: Option<u32>,
  bound_array_buffer: Option<u32>,
  enabled_vertex_attribs: BTreeMap<u32, (u32, VertexAttribPointer)>,
  uniform_values: HashMap<(u32, i32), RecordedUniform>,
  calls: Vec<Call>,
}

impl HeadlessState {
  fn gen_handle(&mut self) -> u32 {
    self.next_handle += 1;
    self.next_handle
  }

  fn delete_stage(&mut self, handle: u32) {
    self.live_stages.remove(&handle);
    self.calls.push(Call::DeleteStage(handle));
  }

  fn delete_program(&mut self, handle: u32) {
    self.live_programs.remove(&handle);
    self.uniform_values.retain(|&(program, _), _| program != handle);

    if self.current_program == Some(handle) {
      self.current_program = None;
    }

    self.calls.push(Call::DeleteProgram(handle));
  }
}

/// A headless backend.
///
/// Cloning a `Headless` yields another view on the same simulated context, which is handy to
/// keep inspecting it after moving the backend into a context.
#[derive(Clone, Debug, Default)]
pub struct Headless {
  state: Rc<RefCell<HeadlessState>>,
}

impl Headless {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of compiled stages not released yet.
  pub fn live_stages(&self) -> usize {
    self.state.borrow().live_stages.len()
  }

  /// Number of linked programs not released yet.
  pub fn live_programs(&self) -> usize {
    self.state.borrow().live_programs.len()
  }

  /// Whether `handle` names a stage or program not released yet.
  pub fn is_live(&self, handle: u32) -> bool {
    let state = self.state.borrow();
    state.live_stages.contains(&handle) || state.live_programs.contains(&handle)
  }

  pub fn current_program(&self) -> Option<u32> {
    self.state.borrow().current_program
  }

  pub fn bound_array_buffer(&self) -> Option<u32> {
    self.state.borrow().bound_array_buffer
  }

  /// Bind an array buffer behind the backend’s back, as a geometry producer uploading vertices
  /// would.
  pub fn bind_array_buffer(&self, buffer: u32) {
    self.state.borrow_mut().bound_array_buffer = Some(buffer);
  }

  /// Enabled vertex attribute locations, in increasing order.
  pub fn enabled_vertex_attribs(&self) -> Vec<u32> {
    self
      .state
      .borrow()
      .enabled_vertex_attribs
      .keys()
      .copied()
      .collect()
  }

  /// Buffer and layout an enabled location reads from.
  pub fn vertex_attrib_pointer(&self, location: u32) -> Option<(u32, VertexAttribPointer)> {
    self
      .state
      .borrow()
      .enabled_vertex_attribs
      .get(&location)
      .copied()
  }

  /// Last value written to the uniform at `location` of `program`.
  pub fn uniform_value(&self, program: u32, location: i32) -> Option<RecordedUniform> {
    self
      .state
      .borrow()
      .uniform_values
      .get(&(program, location))
      .cloned()
  }

  pub fn calls(&self) -> Vec<Call> {
    self.state.borrow().calls.clone()
  }

  pub fn clear_calls(&self) {
    self.state.borrow_mut().calls.clear();
  }
}

/// A compiled stage.
#[derive(Debug)]
pub struct Stage {
  handle: u32,
  ty: StageType,
  interface: StageInterface,
  state: Rc<RefCell<HeadlessState>>,
}

impl Stage {
  pub fn ty(&self) -> StageType {
    self.ty
  }

  pub fn interface(&self) -> &StageInterface {
    &self.interface
  }
}

impl Drop for Stage {
  fn drop(&mut self) {
    self.state.borrow_mut().delete_stage(self.handle);
  }
}

/// A linked program.
#[derive(Debug)]
pub struct Program {
  handle: u32,
  uniforms: Vec<ActiveSymbol>,
  attributes: Vec<ActiveSymbol>,
  state: Rc<RefCell<HeadlessState>>,
}

impl Drop for Program {
  fn drop(&mut self) {
    self.state.borrow_mut().delete_program(self.handle);
  }
}

unsafe impl Shader for Headless {
  type StageRepr = Stage;

  type ProgramRepr = Program;

  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError> {
    let interface =
      StageInterface::parse(ty, src).map_err(|log| StageError::compilation_failed(ty, log))?;

    let mut state = self.state.borrow_mut();
    let handle = state.gen_handle();
    state.live_stages.insert(handle);
    state.calls.push(Call::CompileStage { handle, ty });

    Ok(Stage {
      handle,
      ty,
      interface,
      state: self.state.clone(),
    })
  }

  fn stage_handle(stage: &Self::StageRepr) -> u32 {
    stage.handle
  }

  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    if vertex.ty != StageType::VertexShader || fragment.ty != StageType::FragmentShader {
      return Err(ProgramError::link_failed(
        "ERROR: a vertex and a fragment shader must be attached",
      ));
    }

    check_varyings(&vertex.interface, &fragment.interface)?;

    let uniforms = link_uniforms(&vertex.interface, &fragment.interface)?;
    let attributes = link_attributes(&vertex.interface);

    let mut state = self.state.borrow_mut();
    let handle = state.gen_handle();
    state.live_programs.insert(handle);
    state.calls.push(Call::LinkProgram(handle));

    Ok(Program {
      handle,
      uniforms,
      attributes,
      state: self.state.clone(),
    })
  }

  fn program_handle(program: &Self::ProgramRepr) -> u32 {
    program.handle
  }

  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol> {
    program.uniforms.clone()
  }

  unsafe fn active_attributes(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol> {
    program.attributes.clone()
  }

  unsafe fn use_program(&mut self, program: &Self::ProgramRepr) {
    let mut state = self.state.borrow_mut();
    state.current_program = Some(program.handle);
    state.calls.push(Call::UseProgram(program.handle));
  }

  unsafe fn set_uniform(
    &mut self,
    program: &Self::ProgramRepr,
    location: i32,
    update: UniformUpdate,
  ) {
    let mut state = self.state.borrow_mut();

    let current = match state.current_program {
      Some(current) => current,

      None => {
        log::warn!("uniform update at {} with no current program; ignored", location);
        return;
      }
    };

    if current != program.handle {
      log::warn!(
        "uniform update for program {} while program {} is current",
        program.handle,
        current
      );
    }

    let value = RecordedUniform::from(update);
    state.uniform_values.insert((current, location), value.clone());
    state.calls.push(Call::SetUniform {
      program: current,
      location,
      value,
    });
  }
}

unsafe impl VertexAttrib for Headless {
  unsafe fn enable_vertex_attrib(
    &mut self,
    buffer: u32,
    location: u32,
    pointer: &VertexAttribPointer,
  ) {
    let mut state = self.state.borrow_mut();

    state.bound_array_buffer = Some(buffer);
    state
      .enabled_vertex_attribs
      .insert(location, (buffer, *pointer));
    state.calls.push(Call::EnableVertexAttrib {
      buffer,
      location,
      pointer: *pointer,
    });
  }

  unsafe fn disable_vertex_attrib(&mut self, location: u32) {
    let mut state = self.state.borrow_mut();

    state.enabled_vertex_attribs.remove(&location);
    state.calls.push(Call::DisableVertexAttrib(location));
  }
}

// every varying the fragment stage reads must be written by the vertex stage, with the same type
fn check_varyings(vertex: &StageInterface, fragment: &StageInterface) -> Result<(), ProgramError> {
  for input in fragment.declarations_of(Storage::Varying) {
    match vertex.find(Storage::Varying, &input.name) {
      None => {
        return Err(ProgramError::link_failed(format!(
          "ERROR: varying '{}' is not written by the vertex shader",
          input.name
        )))
      }

      Some(output) if !same_type(output, input) => {
        return Err(ProgramError::link_failed(format!(
          "ERROR: varying '{}' has different types in the vertex and fragment shaders",
          input.name
        )))
      }

      Some(_) => (),
    }
  }

  Ok(())
}

fn link_uniforms(
  vertex: &StageInterface,
  fragment: &StageInterface,
) -> Result<Vec<ActiveSymbol>, ProgramError> {
  let mut merged: BTreeMap<&str, (&Declaration, bool)> = BTreeMap::new();

  for stage in [vertex, fragment] {
    for decl in stage.declarations_of(Storage::Uniform) {
      let used = stage.is_used(&decl.name);

      match merged.get_mut(decl.name.as_str()) {
        Some((first, _)) if !same_type(first, decl) => {
          return Err(ProgramError::link_failed(format!(
            "ERROR: uniform '{}' has different types in the vertex and fragment shaders",
            decl.name
          )));
        }

        Some((_, active)) => *active |= used,

        None => {
          merged.insert(&decl.name, (decl, used));
        }
      }
    }
  }

  let mut location = 0;
  let mut uniforms = Vec::new();

  for (decl, _) in merged.into_values().filter(|&(_, active)| active) {
    uniforms.push(symbol(decl, location));
    location += decl.elements as i32;
  }

  Ok(uniforms)
}

fn link_attributes(vertex: &StageInterface) -> Vec<ActiveSymbol> {
  let mut location = 0;
  let mut attributes = Vec::new();

  for decl in vertex
    .declarations_of(Storage::Attribute)
    .filter(|decl| vertex.is_used(&decl.name))
  {
    attributes.push(symbol(decl, location));
    location += decl.elements as i32;
  }

  attributes
}

fn same_type(a: &Declaration, b: &Declaration) -> bool {
  a.ty == b.ty && a.elements == b.elements
}

fn symbol(decl: &Declaration, location: i32) -> ActiveSymbol {
  ActiveSymbol {
    name: decl.name.clone(),
    elements: decl.elements,
    ty: decl.ty,
    location,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use prism::shader::GlslType;

  const VS: &str = "
    uniform mat4 u_mvp_matrix;
    uniform vec4 u_colors[2];
    attribute vec2 a_position;
    attribute vec4 a_color;
    varying vec4 v_color;
    void main() {
      v_color = a_color * u_colors[0];
      gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
    }
  ";

  const FS: &str = "
    uniform float u_alpha;
    uniform float u_unused;
    varying vec4 v_color;
    void main() { gl_FragColor = vec4(v_color.rgb, u_alpha); }
  ";

  fn link(backend: &mut Headless, vs: &str, fs: &str) -> Result<Program, ProgramError> {
    unsafe {
      let vs = backend.new_stage(StageType::VertexShader, vs)?;
      let fs = backend.new_stage(StageType::FragmentShader, fs)?;
      backend.new_program(&vs, &fs)
    }
  }

  #[test]
  fn uniform_locations_follow_names() {
    let mut backend = Headless::new();
    let program = link(&mut backend, VS, FS).unwrap();
    let uniforms = unsafe { backend.active_uniforms(&program) };

    let layout: Vec<_> = uniforms
      .iter()
      .map(|u| (u.name.as_str(), u.location, u.elements))
      .collect();
    assert_eq!(
      layout,
      [("u_alpha", 0, 1), ("u_colors", 1, 2), ("u_mvp_matrix", 3, 1)]
    );
    assert_eq!(uniforms[2].ty, GlslType::M44);
  }

  #[test]
  fn attribute_locations_follow_declarations() {
    let mut backend = Headless::new();
    let program = link(&mut backend, VS, FS).unwrap();
    let attributes = unsafe { backend.active_attributes(&program) };

    let layout: Vec<_> = attributes
      .iter()
      .map(|a| (a.name.as_str(), a.location))
      .collect();
    assert_eq!(layout, [("a_position", 0), ("a_color", 1)]);
  }

  #[test]
  fn missing_varying_fails_to_link() {
    let mut backend = Headless::new();
    let fs = "varying vec2 v_texcoord;\nvoid main() { gl_FragColor = vec4(v_texcoord, 0.0, 1.0); }";

    match link(&mut backend, VS, fs) {
      Err(ProgramError::LinkFailed(log)) => assert!(log.contains("v_texcoord")),
      other => panic!("unexpected link result: {:?}", other),
    }
  }

  #[test]
  fn conflicting_uniform_fails_to_link() {
    let mut backend = Headless::new();
    let fs = "uniform vec4 u_mvp_matrix;\nvoid main() { gl_FragColor = u_mvp_matrix; }";

    assert!(matches!(
      link(&mut backend, VS, fs),
      Err(ProgramError::LinkFailed(_))
    ));
  }

  #[test]
  fn released_objects() {
    let mut backend = Headless::new();

    {
      let _program = link(&mut backend, VS, FS).unwrap();
      assert_eq!(backend.live_stages(), 0);
      assert_eq!(backend.live_programs(), 1);
    }

    assert_eq!(backend.live_programs(), 0);
  }

  #[test]
  fn uniform_updates_go_to_the_current_program() {
    let mut backend = Headless::new();
    let program = link(&mut backend, VS, FS).unwrap();
    let update = UniformUpdate::Float {
      components: 1,
      count: 1,
      values: prism::shader::uniform::Values::Scalar(0.5),
    };

    unsafe { backend.set_uniform(&program, 0, update) };
    assert_eq!(backend.uniform_value(program.handle, 0), None);

    unsafe {
      backend.use_program(&program);
      backend.set_uniform(&program, 0, update);
    }

    assert_eq!(
      backend
        .uniform_value(program.handle, 0)
        .as_ref()
        .and_then(RecordedUniform::as_floats),
      Some(&[0.5][..])
    );
  }
}
