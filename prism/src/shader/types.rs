//! GLSL types, as reported by program introspection.

use std::fmt;

/// Type of an active uniform or vertex attribute.
///
/// This is the type tag the backend reports when introspecting a linked program. It is the
/// single source of truth for how a uniform is updated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GlslType {
  // scalars
  /// 32-bit signed integer.
  Int,
  /// 32-bit unsigned integer.
  UInt,
  /// 32-bit floating-point number.
  Float,
  /// Boolean.
  Bool,

  // vectors
  /// 2D signed integral vector.
  IVec2,
  /// 3D signed integral vector.
  IVec3,
  /// 4D signed integral vector.
  IVec4,
  /// 2D unsigned integral vector.
  UIVec2,
  /// 3D unsigned integral vector.
  UIVec3,
  /// 4D unsigned integral vector.
  UIVec4,
  /// 2D floating-point vector.
  Vec2,
  /// 3D floating-point vector.
  Vec3,
  /// 4D floating-point vector.
  Vec4,
  /// 2D boolean vector.
  BVec2,
  /// 3D boolean vector.
  BVec3,
  /// 4D boolean vector.
  BVec4,

  // matrices
  /// 2×2 floating-point matrix.
  M22,
  /// 3×3 floating-point matrix.
  M33,
  /// 4×4 floating-point matrix.
  M44,

  // textures
  /// Signed integral 2D texture sampler.
  ISampler2D,
  /// Unsigned integral 2D texture sampler.
  UISampler2D,
  /// Floating-point 1D texture sampler.
  Sampler1D,
  /// Floating-point 2D texture sampler.
  Sampler2D,
  /// Floating-point 3D texture sampler.
  Sampler3D,
  /// Floating-point 2D array texture sampler.
  Sampler2DArray,
  /// Floating-point cubemap sampler.
  Cubemap,

  /// A type tag the engine doesn’t model. The raw backend value is kept for diagnostics.
  Unknown(u32),
}

impl GlslType {
  /// Parse a GLSL type keyword.
  pub fn from_glsl(keyword: &str) -> Option<Self> {
    let ty = match keyword {
      "int" => GlslType::Int,
      "uint" => GlslType::UInt,
      "float" => GlslType::Float,
      "bool" => GlslType::Bool,
      "ivec2" => GlslType::IVec2,
      "ivec3" => GlslType::IVec3,
      "ivec4" => GlslType::IVec4,
      "uvec2" => GlslType::UIVec2,
      "uvec3" => GlslType::UIVec3,
      "uvec4" => GlslType::UIVec4,
      "vec2" => GlslType::Vec2,
      "vec3" => GlslType::Vec3,
      "vec4" => GlslType::Vec4,
      "bvec2" => GlslType::BVec2,
      "bvec3" => GlslType::BVec3,
      "bvec4" => GlslType::BVec4,
      "mat2" => GlslType::M22,
      "mat3" => GlslType::M33,
      "mat4" => GlslType::M44,
      "isampler2D" => GlslType::ISampler2D,
      "usampler2D" => GlslType::UISampler2D,
      "sampler1D" => GlslType::Sampler1D,
      "sampler2D" => GlslType::Sampler2D,
      "sampler3D" => GlslType::Sampler3D,
      "sampler2DArray" => GlslType::Sampler2DArray,
      "samplerCube" => GlslType::Cubemap,
      _ => return None,
    };

    Some(ty)
  }

  /// Whether this is a texture sampler type.
  pub fn is_sampler(self) -> bool {
    matches!(
      self,
      GlslType::ISampler2D
        | GlslType::UISampler2D
        | GlslType::Sampler1D
        | GlslType::Sampler2D
        | GlslType::Sampler3D
        | GlslType::Sampler2DArray
        | GlslType::Cubemap
    )
  }
}

impl fmt::Display for GlslType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      GlslType::Int => f.write_str("int"),
      GlslType::UInt => f.write_str("uint"),
      GlslType::Float => f.write_str("float"),
      GlslType::Bool => f.write_str("bool"),
      GlslType::IVec2 => f.write_str("ivec2"),
      GlslType::IVec3 => f.write_str("ivec3"),
      GlslType::IVec4 => f.write_str("ivec4"),
      GlslType::UIVec2 => f.write_str("uvec2"),
      GlslType::UIVec3 => f.write_str("uvec3"),
      GlslType::UIVec4 => f.write_str("uvec4"),
      GlslType::Vec2 => f.write_str("vec2"),
      GlslType::Vec3 => f.write_str("vec3"),
      GlslType::Vec4 => f.write_str("vec4"),
      GlslType::BVec2 => f.write_str("bvec2"),
      GlslType::BVec3 => f.write_str("bvec3"),
      GlslType::BVec4 => f.write_str("bvec4"),
      GlslType::M22 => f.write_str("mat2"),
      GlslType::M33 => f.write_str("mat3"),
      GlslType::M44 => f.write_str("mat4"),
      GlslType::ISampler2D => f.write_str("isampler2D"),
      GlslType::UISampler2D => f.write_str("usampler2D"),
      GlslType::Sampler1D => f.write_str("sampler1D"),
      GlslType::Sampler2D => f.write_str("sampler2D"),
      GlslType::Sampler3D => f.write_str("sampler3D"),
      GlslType::Sampler2DArray => f.write_str("sampler2DArray"),
      GlslType::Cubemap => f.write_str("samplerCube"),
      GlslType::Unknown(raw) => write!(f, "unknown type 0x{:x}", raw),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keywords_round_trip_through_display() {
    for keyword in ["float", "vec4", "mat3", "bvec2", "uvec3", "sampler2D", "samplerCube"] {
      let ty = GlslType::from_glsl(keyword).unwrap();
      assert_eq!(ty.to_string(), keyword);
    }
  }

  #[test]
  fn unknown_keyword() {
    assert_eq!(GlslType::from_glsl("dmat4"), None);
    assert_eq!(GlslType::from_glsl("u_color"), None);
  }

  #[test]
  fn samplers() {
    assert!(GlslType::Sampler2D.is_sampler());
    assert!(GlslType::Cubemap.is_sampler());
    assert!(!GlslType::Int.is_sampler());
    assert!(!GlslType::M44.is_sampler());
  }
}
