//! Attribute descriptor sets.
//!
//! Geometry producers own their vertex buffers and describe the binary layout of the data in
//! them with [`AttributeDesc`]s. A program never reads vertex memory: it resolves each
//! descriptor’s logical name to one of its attribute locations (see
//! [`Program::configure_actives`]) and issues the calls describing the layout right before a
//! draw.
//!
//! [`Program::configure_actives`]: crate::shader::Program::configure_actives

use std::fmt;

/// Numeric format of the components of a vertex attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttrFormat {
  /// Booleans, stored as bytes.
  Bool,
  HalfFloat,
  Float,
  Double,
  Fixed,
  Short,
  UnsignedShort,
  Byte,
  UnsignedByte,
  Int,
  UnsignedInt,
  Int2_10_10_10Rev,
  UnsignedInt2_10_10_10Rev,
  UnsignedInt10f11f11fRev,
}

impl AttrFormat {
  /// Size in bytes of one component; packed formats report the size of the whole packed word.
  pub fn size(self) -> usize {
    match self {
      AttrFormat::Bool | AttrFormat::Byte | AttrFormat::UnsignedByte => 1,
      AttrFormat::HalfFloat | AttrFormat::Short | AttrFormat::UnsignedShort => 2,
      AttrFormat::Float
      | AttrFormat::Fixed
      | AttrFormat::Int
      | AttrFormat::UnsignedInt
      | AttrFormat::Int2_10_10_10Rev
      | AttrFormat::UnsignedInt2_10_10_10Rev
      | AttrFormat::UnsignedInt10f11f11fRev => 4,
      AttrFormat::Double => 8,
    }
  }
}

/// Conventional vertex attribute semantics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttrType {
  Position,
  Color,
  Texture,
  Normal,
}

impl AttrType {
  /// Logical name programs know this semantics by.
  pub fn logical_name(self) -> &'static str {
    match self {
      AttrType::Position => "position",
      AttrType::Color => "color",
      AttrType::Texture => "texcoord",
      AttrType::Normal => "normal",
    }
  }
}

impl fmt::Display for AttrType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.write_str(self.logical_name())
  }
}

/// Layout of a single vertex attribute inside an [`Attribute`]’s buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDesc {
  name: String,
  elements: usize,
  format: AttrFormat,
  normalise: bool,
  stride: usize,
  offset: usize,
  location: Option<u32>,
}

impl AttributeDesc {
  /// Describe an attribute with a conventional semantics.
  pub fn new(
    ty: AttrType,
    elements: usize,
    format: AttrFormat,
    normalise: bool,
    stride: usize,
    offset: usize,
  ) -> Self {
    Self::named(ty.logical_name(), elements, format, normalise, stride, offset)
  }

  /// Describe an attribute known by an arbitrary logical name.
  pub fn named(
    name: impl Into<String>,
    elements: usize,
    format: AttrFormat,
    normalise: bool,
    stride: usize,
    offset: usize,
  ) -> Self {
    AttributeDesc {
      name: name.into(),
      elements,
      format,
      normalise,
      stride,
      offset,
      location: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn elements(&self) -> usize {
    self.elements
  }

  pub fn format(&self) -> AttrFormat {
    self.format
  }

  pub fn normalise(&self) -> bool {
    self.normalise
  }

  pub fn stride(&self) -> usize {
    self.stride
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  /// Location resolved by the last configuration against a program; `None` if the program has
  /// no such active attribute or if the descriptor was never configured.
  pub fn location(&self) -> Option<u32> {
    self.location
  }

  pub(crate) fn set_location(&mut self, location: Option<u32>) {
    self.location = location;
  }
}

/// A vertex buffer, with the layouts of the attributes it holds.
///
/// The buffer is not owned: it’s the handle of a buffer living in a geometry producer.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
  buffer: u32,
  base_offset: usize,
  descs: Vec<AttributeDesc>,
}

impl Attribute {
  pub fn new(buffer: u32) -> Self {
    Self::with_base_offset(buffer, 0)
  }

  /// Attribute whose data starts `base_offset` bytes into the buffer. Descriptor offsets are
  /// relative to it.
  pub fn with_base_offset(buffer: u32, base_offset: usize) -> Self {
    Attribute {
      buffer,
      base_offset,
      descs: Vec::new(),
    }
  }

  pub fn add_desc(&mut self, desc: AttributeDesc) -> &mut Self {
    self.descs.push(desc);
    self
  }

  pub fn buffer(&self) -> u32 {
    self.buffer
  }

  pub fn base_offset(&self) -> usize {
    self.base_offset
  }

  pub fn descs(&self) -> &[AttributeDesc] {
    &self.descs
  }

  pub fn descs_mut(&mut self) -> &mut [AttributeDesc] {
    &mut self.descs
  }
}

/// All the attributes a piece of geometry is drawn with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSet {
  attributes: Vec<Attribute>,
}

impl AttributeSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_attribute(&mut self, attribute: Attribute) -> &mut Self {
    self.attributes.push(attribute);
    self
  }

  pub fn attributes(&self) -> &[Attribute] {
    &self.attributes
  }

  pub fn attributes_mut(&mut self) -> &mut [Attribute] {
    &mut self.attributes
  }

  /// Iterate over every descriptor of every attribute.
  pub fn descs(&self) -> impl Iterator<Item = &AttributeDesc> {
    self.attributes.iter().flat_map(|a| a.descs.iter())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn conventional_logical_names() {
    assert_eq!(AttrType::Position.logical_name(), "position");
    assert_eq!(AttrType::Texture.logical_name(), "texcoord");
    assert_eq!(AttrType::Color.to_string(), "color");
    assert_eq!(
      AttributeDesc::new(AttrType::Normal, 3, AttrFormat::Float, false, 0, 0).name(),
      "normal"
    );
  }

  #[test]
  fn format_sizes() {
    assert_eq!(AttrFormat::Bool.size(), 1);
    assert_eq!(AttrFormat::HalfFloat.size(), 2);
    assert_eq!(AttrFormat::UnsignedInt10f11f11fRev.size(), 4);
    assert_eq!(AttrFormat::Double.size(), 8);
  }

  #[test]
  fn descriptors_start_unresolved() {
    let desc = AttributeDesc::named("a_weight", 1, AttrFormat::Float, false, 0, 0);
    assert_eq!(desc.location(), None);
  }

  #[test]
  fn set_iterates_every_descriptor() {
    let stride = 4 * AttrFormat::Float.size();

    let mut interleaved = Attribute::new(1);
    interleaved
      .add_desc(AttributeDesc::new(
        AttrType::Position,
        2,
        AttrFormat::Float,
        false,
        stride,
        0,
      ))
      .add_desc(AttributeDesc::new(
        AttrType::Texture,
        2,
        AttrFormat::Float,
        false,
        stride,
        8,
      ));

    let mut colors = Attribute::with_base_offset(2, 64);
    colors.add_desc(AttributeDesc::new(
      AttrType::Color,
      4,
      AttrFormat::UnsignedByte,
      true,
      0,
      0,
    ));

    let mut set = AttributeSet::new();
    set.add_attribute(interleaved).add_attribute(colors);

    let names: Vec<_> = set.descs().map(AttributeDesc::name).collect();
    assert_eq!(names, ["position", "texcoord", "color"]);
    assert_eq!(set.attributes()[1].base_offset(), 64);
  }
}
