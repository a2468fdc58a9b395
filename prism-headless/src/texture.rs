use prism::texture::{PaletteInfo, Texture};
use std::cell::Cell;

/// A texture without storage, counting how many times it gets bound.
#[derive(Debug, Default)]
pub struct HeadlessTexture {
  palette: Option<PaletteInfo>,
  binds: Cell<usize>,
}

impl HeadlessTexture {
  /// A texture holding colors.
  pub fn new() -> Self {
    Self::default()
  }

  /// A texture holding indices into a palette.
  pub fn palettized(palette: PaletteInfo) -> Self {
    HeadlessTexture {
      palette: Some(palette),
      binds: Cell::new(0),
    }
  }

  pub fn bind_count(&self) -> usize {
    self.binds.get()
  }
}

impl Texture for HeadlessTexture {
  fn bind(&self) {
    self.binds.set(self.binds.get() + 1);
  }

  fn palette(&self) -> Option<PaletteInfo> {
    self.palette
  }
}
