//! Shader programs.
//!
//! A [`Program`] links a vertex [`Stage`] and a fragment [`Stage`] together, introspects the
//! active uniforms and vertex attributes the backend reports, and resolves names against them.
//!
//! # Name resolution
//!
//! Names are first looked up as canonical GLSL names, then as logical names through the
//! program’s alternate-name tables. [`Program::get_uniform`] and [`Program::get_attribute`]
//! return `None` on a miss, which is what you want for optional features; the `_or_fail`
//! variants turn a miss into an error, which is what you want for required bindings.
//!
//! # Drawing
//!
//! A draw with a program goes like this:
//!
//! 1. [`Program::make_active`].
//! 2. Uniform updates with [`Program::set_uniform_value`] / [`Program::set_uniform`].
//! 3. [`Program::apply_attribute_set`] (descriptor locations must have been resolved with
//!    [`Program::configure_actives`] beforehand).
//! 4. The draw call.
//! 5. [`Program::clean_up_after_draw`].
//!
//! Steps 3 to 5 are wrapped by [`Program::with_attributes`].

use std::cell::RefCell;
use std::fmt;

use crate::backend::shader::Shader;
use crate::backend::vertex::{VertexAttrib, VertexAttribPointer};
use crate::shader::names::{ActiveSymbol, AlternateNames, SymbolKind, SymbolTable};
use crate::shader::uniform::{prepare_update, UniformValue};
use crate::shader::{ProgramError, Stage, StageType, UniformWarning, VertexAttribWarning};
use crate::texture::Texture;
use crate::vertex::{Attribute, AttributeSet};

/// Locations of frequently used uniforms and attributes, resolved after each link and after
/// each alternate name registration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Actives {
  pub mvp_matrix: Option<i32>,
  pub mv_matrix: Option<i32>,
  pub p_matrix: Option<i32>,
  pub color: Option<i32>,
  pub line_width: Option<i32>,
  pub tex_map: Option<i32>,
  pub position: Option<u32>,
  pub texcoord: Option<u32>,
  pub color_attrib: Option<u32>,
  pub normal: Option<u32>,
  pub enable_palette_lookup: Option<i32>,
  pub palette: Option<i32>,
  pub palette_width: Option<i32>,
  pub palette_map: Option<i32>,
}

/// A linked shader program.
pub struct Program<B>
where
  B: ?Sized + Shader,
{
  name: String,
  // dropped before the stages
  repr: Option<B::ProgramRepr>,
  vertex: Stage<B>,
  fragment: Stage<B>,
  uniforms: SymbolTable,
  attributes: SymbolTable,
  uniform_alternates: AlternateNames,
  attribute_alternates: AlternateNames,
  actives: Actives,
  enabled_attribs: RefCell<Vec<u32>>,
}

impl<B> Program<B>
where
  B: ?Sized + Shader,
{
  /// Compile both stages and link them.
  ///
  /// The stages are named after the program, with a `_vs` and a `_fs` suffix. Anything
  /// allocated before a failure is released.
  pub fn new(
    backend: &mut B,
    name: impl Into<String>,
    vertex_src: impl Into<String>,
    fragment_src: impl Into<String>,
  ) -> Result<Self, ProgramError> {
    let name = name.into();
    let vertex = Stage::new(
      backend,
      StageType::VertexShader,
      format!("{}_vs", name),
      vertex_src,
    )?;
    let fragment = Stage::new(
      backend,
      StageType::FragmentShader,
      format!("{}_fs", name),
      fragment_src,
    )?;

    let mut program = Program {
      repr: None,
      vertex,
      fragment,
      uniforms: SymbolTable::new(),
      attributes: SymbolTable::new(),
      uniform_alternates: AlternateNames::new(SymbolKind::Uniform),
      attribute_alternates: AlternateNames::new(SymbolKind::Attribute),
      actives: Actives::default(),
      enabled_attribs: RefCell::new(Vec::new()),
      name,
    };

    program.link(backend)?;
    Ok(program)
  }

  /// Recompile both stages from new sources and link again.
  ///
  /// Every previously queried location is invalidated. On failure, the program is left
  /// unlinked; alternate names are kept either way. Attribute locations enabled before the
  /// relink stay recorded, and the next [`Program::clean_up_after_draw`] disables them.
  pub fn relink(
    &mut self,
    backend: &mut B,
    vertex_src: impl Into<String>,
    fragment_src: impl Into<String>,
  ) -> Result<(), ProgramError> {
    self.unlink();

    self.vertex.compile(backend, vertex_src)?;
    self.fragment.compile(backend, fragment_src)?;
    self.link(backend)
  }

  fn unlink(&mut self) {
    self.repr = None;
    self.uniforms.clear();
    self.attributes.clear();
    self.actives = Actives::default();
  }

  fn link(&mut self, backend: &mut B) -> Result<(), ProgramError> {
    self.unlink();

    let repr = unsafe { backend.new_program(self.vertex.repr()?, self.fragment.repr()?) }
      .map_err(|e| {
        log::error!("cannot link program {}: {}", self.name, e);
        e
      })?;

    let uniforms = query_uniforms(backend, &repr);
    let attributes = query_attributes(backend, &repr).map_err(|e| {
      log::error!("program {} rejected: {}", self.name, e);
      ProgramError::from(e)
    })?;

    log::debug!(
      "linked program {} ({} active uniforms, {} active attributes)",
      self.name,
      uniforms.len(),
      attributes.len()
    );

    self.repr = Some(repr);
    self.uniforms = uniforms;
    self.attributes = attributes;
    self.refresh_actives();

    Ok(())
  }

  fn refresh_actives(&mut self) {
    self.actives = Actives {
      mvp_matrix: self.get_uniform("mvp_matrix"),
      mv_matrix: self.get_uniform("mv_matrix"),
      p_matrix: self.get_uniform("p_matrix"),
      color: self.get_uniform("color"),
      line_width: self.get_uniform("line_width"),
      tex_map: self.get_uniform("tex_map"),
      position: self.get_attribute("position"),
      texcoord: self.get_attribute("texcoord"),
      color_attrib: self.get_attribute("color"),
      normal: self.get_attribute("normal"),
      enable_palette_lookup: self.get_uniform("enable_palette_lookup"),
      palette: self.get_uniform("palette"),
      palette_width: self.get_uniform("palette_width"),
      palette_map: self.get_uniform("palette_map"),
    };
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Whether the program holds a linked handle.
  pub fn is_linked(&self) -> bool {
    self.repr.is_some()
  }

  /// Linked handle; `0` if the program is unlinked.
  pub fn handle(&self) -> u32 {
    self.repr.as_ref().map_or(0, B::program_handle)
  }

  pub fn vertex_stage(&self) -> &Stage<B> {
    &self.vertex
  }

  pub fn fragment_stage(&self) -> &Stage<B> {
    &self.fragment
  }

  /// Active uniforms, in no particular order.
  pub fn uniforms(&self) -> impl Iterator<Item = &ActiveSymbol> {
    self.uniforms.iter()
  }

  /// Active vertex attributes, in no particular order.
  pub fn attributes(&self) -> impl Iterator<Item = &ActiveSymbol> {
    self.attributes.iter()
  }

  /// Record of the uniform a canonical or logical name resolves to.
  pub fn uniform_record(&self, name: &str) -> Option<&ActiveSymbol> {
    self.uniform_alternates.resolve(&self.uniforms, name)
  }

  /// Record of the attribute a canonical or logical name resolves to.
  pub fn attribute_record(&self, name: &str) -> Option<&ActiveSymbol> {
    self.attribute_alternates.resolve(&self.attributes, name)
  }

  pub fn uniform_alternates(&self) -> &AlternateNames {
    &self.uniform_alternates
  }

  pub fn attribute_alternates(&self) -> &AlternateNames {
    &self.attribute_alternates
  }

  pub fn actives(&self) -> &Actives {
    &self.actives
  }

  /// Location of a uniform.
  pub fn get_uniform(&self, name: &str) -> Option<i32> {
    self.uniform_record(name).map(|record| record.location)
  }

  /// Location of a vertex attribute.
  pub fn get_attribute(&self, name: &str) -> Option<u32> {
    self
      .attribute_record(name)
      .and_then(|record| u32::try_from(record.location).ok())
  }

  /// Location of a uniform that must be active.
  pub fn get_uniform_or_fail(&self, name: &str) -> Result<i32, UniformWarning> {
    self.get_uniform(name).ok_or_else(|| {
      log::error!("uniform {} not found in program {}", name, self.name);
      UniformWarning::inactive(name)
    })
  }

  /// Location of a vertex attribute that must be active.
  pub fn get_attribute_or_fail(&self, name: &str) -> Result<u32, VertexAttribWarning> {
    self.get_attribute(name).ok_or_else(|| {
      log::error!("attribute {} not found in program {}", name, self.name);
      VertexAttribWarning::inactive(name)
    })
  }

  /// Make `logical` an alternate name for the uniform named `canonical`.
  pub fn set_alternate_uniform_name(
    &mut self,
    canonical: impl Into<String>,
    logical: impl Into<String>,
  ) -> Result<(), ProgramError> {
    self
      .uniform_alternates
      .insert(canonical, logical)
      .map_err(|e| {
        log::error!("program {}: {}", self.name, e);
        e
      })?;

    self.refresh_actives();
    Ok(())
  }

  /// Make `logical` an alternate name for the vertex attribute named `canonical`.
  pub fn set_alternate_attribute_name(
    &mut self,
    canonical: impl Into<String>,
    logical: impl Into<String>,
  ) -> Result<(), ProgramError> {
    self
      .attribute_alternates
      .insert(canonical, logical)
      .map_err(|e| {
        log::error!("program {}: {}", self.name, e);
        e
      })?;

    self.refresh_actives();
    Ok(())
  }

  /// Make this program the current pipeline program.
  pub fn make_active(&self, backend: &mut B) -> Result<(), ProgramError> {
    let repr = self
      .repr
      .as_ref()
      .ok_or_else(|| ProgramError::NotLinked(self.name.clone()))?;

    unsafe { backend.use_program(repr) };
    Ok(())
  }

  /// Update the uniform at `location`.
  ///
  /// How the value is sent is decided by the type reported for that uniform: the value must
  /// belong to the same family and fit its shape. The program must be current.
  pub fn set_uniform_value<'a>(
    &self,
    backend: &mut B,
    location: i32,
    value: impl Into<UniformValue<'a>>,
  ) -> Result<(), UniformWarning> {
    let (repr, record) = self
      .repr
      .as_ref()
      .zip(self.uniforms.at(location))
      .ok_or(UniformWarning::UnknownLocation(location))?;

    let update = prepare_update(record, value.into())?;
    unsafe { backend.set_uniform(repr, location, update) };

    Ok(())
  }

  /// Resolve a uniform by name and update it.
  ///
  /// A name resolving to nothing is not an error: shader variants can opt out of uniforms.
  pub fn set_uniform<'a>(
    &self,
    backend: &mut B,
    name: &str,
    value: impl Into<UniformValue<'a>>,
  ) -> Result<(), UniformWarning> {
    match self.get_uniform(name) {
      Some(location) => self.set_uniform_value(backend, location, value),

      None => {
        log::debug!("program {} has no active uniform {}; ignored", self.name, name);
        Ok(())
      }
    }
  }

  /// Resolve the location of every descriptor of a set against this program and cache it on
  /// the descriptors.
  pub fn configure_actives(&self, set: &mut AttributeSet) {
    for attribute in set.attributes_mut() {
      for desc in attribute.descs_mut() {
        let location = self.get_attribute(desc.name());

        if location.is_none() {
          log::debug!(
            "program {} has no active attribute {}",
            self.name,
            desc.name()
          );
        }

        desc.set_location(location);
      }
    }
  }

  /// Bind a texture, and set the uniforms it needs.
  ///
  /// The texture map sampler is set to unit 0. If the texture is palette-indexed, the palette
  /// sampler is set to unit 1, along with the palette selector and width. Each of these three
  /// uniforms is optional, but if any is missing, palette lookup is disabled. Palette uniforms
  /// are never touched for other textures. The palette lookup flag is written in every case.
  pub fn set_uniforms_for_texture<T>(&self, backend: &mut B, texture: &T) -> Result<(), UniformWarning>
  where
    T: ?Sized + Texture,
  {
    if let Some(tex_map) = self.actives.tex_map {
      self.set_uniform_value(backend, tex_map, 0i32)?;
    }

    texture.bind();

    let mut enable_palette = false;

    if let Some(palette) = texture.palette() {
      enable_palette = true;

      match self.actives.palette_map {
        Some(location) => self.set_uniform_value(backend, location, 1i32)?,
        None => enable_palette = false,
      }

      match self.actives.palette {
        Some(location) => self.set_uniform_value(backend, location, palette.selector())?,
        None => enable_palette = false,
      }

      match self.actives.palette_width {
        Some(location) => self.set_uniform_value(backend, location, palette.width as f32)?,
        None => enable_palette = false,
      }
    }

    if let Some(location) = self.actives.enable_palette_lookup {
      self.set_uniform_value(backend, location, enable_palette)?;
    }

    Ok(())
  }

  /// Attribute locations enabled by the last [`Program::apply_attribute`] calls and not
  /// disabled yet.
  pub fn enabled_attribs(&self) -> Vec<u32> {
    self.enabled_attribs.borrow().clone()
  }
}

impl<B> Program<B>
where
  B: ?Sized + VertexAttrib,
{
  /// Enable and describe the vertex attributes of `attribute`.
  ///
  /// Descriptors without a resolved location are skipped.
  pub fn apply_attribute(&self, backend: &mut B, attribute: &Attribute) {
    let mut enabled = self.enabled_attribs.borrow_mut();

    for desc in attribute.descs() {
      let location = match desc.location() {
        Some(location) => location,

        None => {
          log::debug!(
            "skipping unresolved attribute {} for program {}",
            desc.name(),
            self.name
          );
          continue;
        }
      };

      let pointer = VertexAttribPointer {
        elements: desc.elements(),
        format: desc.format(),
        normalise: desc.normalise(),
        stride: desc.stride(),
        offset: attribute.base_offset() + desc.offset(),
      };

      unsafe { backend.enable_vertex_attrib(attribute.buffer(), location, &pointer) };
      enabled.push(location);
    }
  }

  /// [`Program::apply_attribute`] for every attribute of a set.
  pub fn apply_attribute_set(&self, backend: &mut B, set: &AttributeSet) {
    for attribute in set.attributes() {
      self.apply_attribute(backend, attribute);
    }
  }

  /// Disable every attribute location enabled since the last clean up.
  pub fn clean_up_after_draw(&self, backend: &mut B) {
    for location in self.enabled_attribs.borrow_mut().drain(..) {
      unsafe { backend.disable_vertex_attrib(location) };
    }
  }

  /// Apply an attribute set, run `draw` and clean up.
  pub fn with_attributes<F, R>(&self, backend: &mut B, set: &AttributeSet, draw: F) -> R
  where
    F: FnOnce(&mut B) -> R,
  {
    self.apply_attribute_set(backend, set);
    let r = draw(backend);
    self.clean_up_after_draw(backend);
    r
  }
}

impl<B> fmt::Debug for Program<B>
where
  B: ?Sized + Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("Program")
      .field("name", &self.name)
      .field("handle", &self.handle())
      .field("vertex", &self.vertex)
      .field("fragment", &self.fragment)
      .field("uniforms", &self.uniforms.len())
      .field("attributes", &self.attributes.len())
      .finish()
  }
}

fn query_uniforms<B>(backend: &mut B, repr: &B::ProgramRepr) -> SymbolTable
where
  B: ?Sized + Shader,
{
  unsafe { backend.active_uniforms(repr) }
    .into_iter()
    .collect()
}

fn query_attributes<B>(
  backend: &mut B,
  repr: &B::ProgramRepr,
) -> Result<SymbolTable, VertexAttribWarning>
where
  B: ?Sized + Shader,
{
  unsafe { backend.active_attributes(repr) }
    .into_iter()
    .map(|record| {
      if record.elements == 1 {
        Ok(record)
      } else {
        Err(VertexAttribWarning::ArrayedAttribute {
          name: record.name,
          elements: record.elements,
        })
      }
    })
    .collect()
}
