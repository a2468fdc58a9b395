//! Uniform values and the uniform dispatch table.
//!
//! Setting a uniform is driven by the type introspection reported for it, not by the type used
//! at the call site. The call site provides a [`UniformValue`]; the reflected [`GlslType`] is
//! looked up in [`UNIFORM_DISPATCH`] to get a [`UniformShape`]; the value is checked against
//! that shape and turned into a [`UniformUpdate`] the backend knows how to issue.
//!
//! Supporting a new uniform type is a new entry in the table.

use std::slice;

use crate::shader::names::ActiveSymbol;
use crate::shader::types::GlslType;
use crate::shader::UniformWarning;

/// Value family of a uniform, selecting the backend entry point used to update it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
  /// Signed integers; also booleans and samplers (texture unit).
  Int,
  /// Unsigned integers.
  UInt,
  /// Floating-point scalars and vectors.
  Float,
  /// Column-major floating-point square matrices.
  Matrix,
}

/// Shape of a uniform: value family and number of components (columns for matrices).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct UniformShape {
  pub family: Family,
  pub components: usize,
}

impl UniformShape {
  pub const fn new(family: Family, components: usize) -> Self {
    UniformShape { family, components }
  }

  /// Number of scalars a single element of this shape is made of.
  pub fn scalars(&self) -> usize {
    match self.family {
      Family::Matrix => self.components * self.components,
      _ => self.components,
    }
  }
}

/// Dispatch table mapping reflected GLSL types to uniform shapes.
pub const UNIFORM_DISPATCH: &[(GlslType, UniformShape)] = &[
  // scalars
  (GlslType::Int, UniformShape::new(Family::Int, 1)),
  (GlslType::UInt, UniformShape::new(Family::UInt, 1)),
  (GlslType::Float, UniformShape::new(Family::Float, 1)),
  (GlslType::Bool, UniformShape::new(Family::Int, 1)),
  // vectors
  (GlslType::IVec2, UniformShape::new(Family::Int, 2)),
  (GlslType::IVec3, UniformShape::new(Family::Int, 3)),
  (GlslType::IVec4, UniformShape::new(Family::Int, 4)),
  (GlslType::UIVec2, UniformShape::new(Family::UInt, 2)),
  (GlslType::UIVec3, UniformShape::new(Family::UInt, 3)),
  (GlslType::UIVec4, UniformShape::new(Family::UInt, 4)),
  (GlslType::Vec2, UniformShape::new(Family::Float, 2)),
  (GlslType::Vec3, UniformShape::new(Family::Float, 3)),
  (GlslType::Vec4, UniformShape::new(Family::Float, 4)),
  (GlslType::BVec2, UniformShape::new(Family::Int, 2)),
  (GlslType::BVec3, UniformShape::new(Family::Int, 3)),
  (GlslType::BVec4, UniformShape::new(Family::Int, 4)),
  // matrices
  (GlslType::M22, UniformShape::new(Family::Matrix, 2)),
  (GlslType::M33, UniformShape::new(Family::Matrix, 3)),
  (GlslType::M44, UniformShape::new(Family::Matrix, 4)),
  // textures; the value is a texture unit
  (GlslType::ISampler2D, UniformShape::new(Family::Int, 1)),
  (GlslType::UISampler2D, UniformShape::new(Family::Int, 1)),
  (GlslType::Sampler1D, UniformShape::new(Family::Int, 1)),
  (GlslType::Sampler2D, UniformShape::new(Family::Int, 1)),
  (GlslType::Sampler3D, UniformShape::new(Family::Int, 1)),
  (GlslType::Sampler2DArray, UniformShape::new(Family::Int, 1)),
  (GlslType::Cubemap, UniformShape::new(Family::Int, 1)),
];

/// Look up the shape of a reflected type.
pub fn shape_of(ty: GlslType) -> Option<UniformShape> {
  UNIFORM_DISPATCH
    .iter()
    .find(|(t, _)| *t == ty)
    .map(|&(_, shape)| shape)
}

/// A value provided at a call site to update a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue<'a> {
  Int(i32),
  UInt(u32),
  Float(f32),
  Bool(bool),
  Ints(&'a [i32]),
  UInts(&'a [u32]),
  Floats(&'a [f32]),
}

impl From<i32> for UniformValue<'_> {
  fn from(x: i32) -> Self {
    UniformValue::Int(x)
  }
}

impl From<u32> for UniformValue<'_> {
  fn from(x: u32) -> Self {
    UniformValue::UInt(x)
  }
}

impl From<f32> for UniformValue<'_> {
  fn from(x: f32) -> Self {
    UniformValue::Float(x)
  }
}

impl From<bool> for UniformValue<'_> {
  fn from(x: bool) -> Self {
    UniformValue::Bool(x)
  }
}

impl<'a> From<&'a [i32]> for UniformValue<'a> {
  fn from(x: &'a [i32]) -> Self {
    UniformValue::Ints(x)
  }
}

impl<'a> From<&'a [u32]> for UniformValue<'a> {
  fn from(x: &'a [u32]) -> Self {
    UniformValue::UInts(x)
  }
}

impl<'a> From<&'a [f32]> for UniformValue<'a> {
  fn from(x: &'a [f32]) -> Self {
    UniformValue::Floats(x)
  }
}

impl<'a, const N: usize> From<&'a [i32; N]> for UniformValue<'a> {
  fn from(x: &'a [i32; N]) -> Self {
    UniformValue::Ints(x)
  }
}

impl<'a, const N: usize> From<&'a [u32; N]> for UniformValue<'a> {
  fn from(x: &'a [u32; N]) -> Self {
    UniformValue::UInts(x)
  }
}

impl<'a, const N: usize> From<&'a [f32; N]> for UniformValue<'a> {
  fn from(x: &'a [f32; N]) -> Self {
    UniformValue::Floats(x)
  }
}

// arrays of vectors and column-major matrices
impl<'a, const N: usize> From<&'a [[f32; N]]> for UniformValue<'a> {
  fn from(x: &'a [[f32; N]]) -> Self {
    UniformValue::Floats(x.as_flattened())
  }
}

impl<'a, const N: usize, const M: usize> From<&'a [[f32; N]; M]> for UniformValue<'a> {
  fn from(x: &'a [[f32; N]; M]) -> Self {
    UniformValue::Floats(x.as_flattened())
  }
}

/// Either a single scalar or a borrowed run of scalars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Values<'a, T> {
  Scalar(T),
  Slice(&'a [T]),
}

impl<T> Values<'_, T> {
  pub fn as_slice(&self) -> &[T] {
    match self {
      Values::Scalar(x) => slice::from_ref(x),
      Values::Slice(s) => s,
    }
  }
}

/// A uniform update as issued to a backend.
///
/// `count` is the number of array elements being updated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformUpdate<'a> {
  Int {
    components: usize,
    count: usize,
    values: Values<'a, i32>,
  },
  UInt {
    components: usize,
    count: usize,
    values: Values<'a, u32>,
  },
  Float {
    components: usize,
    count: usize,
    values: Values<'a, f32>,
  },
  Matrix {
    columns: usize,
    count: usize,
    values: Values<'a, f32>,
  },
}

/// Check a value against the reflected type of a uniform and build the backend update.
pub fn prepare_update<'a>(
  record: &ActiveSymbol,
  value: UniformValue<'a>,
) -> Result<UniformUpdate<'a>, UniformWarning> {
  let shape =
    shape_of(record.ty).ok_or_else(|| UniformWarning::unsupported_type(&record.name, record.ty))?;
  let per_element = shape.scalars();
  let max = per_element * record.elements.max(1);

  // number of array elements covered by `len` scalars
  let count_of = |len: usize| {
    if len == 0 || len % per_element != 0 || len > max {
      Err(UniformWarning::size_mismatch(&record.name, max, len))
    } else {
      Ok(len / per_element)
    }
  };

  let mismatch = || UniformWarning::type_mismatch(&record.name, record.ty);

  let update = match (shape.family, value) {
    (Family::Int, UniformValue::Int(x)) => UniformUpdate::Int {
      components: shape.components,
      count: count_of(1)?,
      values: Values::Scalar(x),
    },

    (Family::Int, UniformValue::Bool(x)) => UniformUpdate::Int {
      components: shape.components,
      count: count_of(1)?,
      values: Values::Scalar(x as i32),
    },

    (Family::Int, UniformValue::Ints(xs)) => UniformUpdate::Int {
      components: shape.components,
      count: count_of(xs.len())?,
      values: Values::Slice(xs),
    },

    (Family::UInt, UniformValue::UInt(x)) => UniformUpdate::UInt {
      components: shape.components,
      count: count_of(1)?,
      values: Values::Scalar(x),
    },

    (Family::UInt, UniformValue::UInts(xs)) => UniformUpdate::UInt {
      components: shape.components,
      count: count_of(xs.len())?,
      values: Values::Slice(xs),
    },

    (Family::Float, UniformValue::Float(x)) => UniformUpdate::Float {
      components: shape.components,
      count: count_of(1)?,
      values: Values::Scalar(x),
    },

    (Family::Float, UniformValue::Floats(xs)) => UniformUpdate::Float {
      components: shape.components,
      count: count_of(xs.len())?,
      values: Values::Slice(xs),
    },

    (Family::Matrix, UniformValue::Floats(xs)) => UniformUpdate::Matrix {
      columns: shape.components,
      count: count_of(xs.len())?,
      values: Values::Slice(xs),
    },

    _ => return Err(mismatch()),
  };

  Ok(update)
}
