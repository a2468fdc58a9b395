//! Texture protocol.
//!
//! Textures are loaded and owned elsewhere; programs only need to bind them and to know whether
//! they hold palette indices.

/// Palette a palette-indexed texture looks its colors up in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PaletteInfo {
  /// Row of the palette surface holding this texture’s colors.
  pub index: u32,
  /// Width of the palette surface, in texels.
  pub width: u32,
  /// Height of the palette surface, i.e. the number of palettes it holds.
  pub height: u32,
}

impl PaletteInfo {
  /// Normalised coordinate selecting the palette row: `index / (height - 1)`.
  ///
  /// A surface with a single row always selects `0`.
  pub fn selector(&self) -> f32 {
    if self.height <= 1 {
      0.
    } else {
      self.index as f32 / (self.height - 1) as f32
    }
  }
}

/// A texture that can be used with a program.
pub trait Texture {
  /// Bind the texture (and its palette, if any) to the texture units the program samples.
  fn bind(&self);

  /// Palette information if the texture is palette-indexed.
  fn palette(&self) -> Option<PaletteInfo>;
}

impl<T> Texture for &T
where
  T: ?Sized + Texture,
{
  fn bind(&self) {
    (**self).bind()
  }

  fn palette(&self) -> Option<PaletteInfo> {
    (**self).palette()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selector() {
    let palette = PaletteInfo {
      index: 2,
      width: 256,
      height: 5,
    };
    assert_eq!(palette.selector(), 0.5);

    let single = PaletteInfo {
      index: 0,
      width: 256,
      height: 1,
    };
    assert_eq!(single.selector(), 0.);
  }
}
