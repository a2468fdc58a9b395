//! Shader backend.

use crate::shader::{ActiveSymbol, ProgramError, StageError, StageType, UniformUpdate};

/// Shader stages and programs.
///
/// Dropping a [`Shader::StageRepr`] or a [`Shader::ProgramRepr`] must release the underlying
/// GPU object.
pub unsafe trait Shader {
  type StageRepr;

  type ProgramRepr;

  /// Compile a stage. On failure, nothing must be left allocated and the error carries the
  /// compiler log.
  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError>;

  /// Non-zero handle of a compiled stage.
  fn stage_handle(stage: &Self::StageRepr) -> u32;

  /// Attach both stages and link them. On failure, the error carries the linker log.
  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError>;

  /// Non-zero handle of a linked program.
  fn program_handle(program: &Self::ProgramRepr) -> u32;

  /// Every uniform the linked program reports as active.
  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol>;

  /// Every vertex attribute the linked program reports as active.
  unsafe fn active_attributes(&mut self, program: &Self::ProgramRepr) -> Vec<ActiveSymbol>;

  /// Make the program the current pipeline program.
  unsafe fn use_program(&mut self, program: &Self::ProgramRepr);

  /// Update the uniform living at `location` in `program`, which must be current.
  unsafe fn set_uniform(
    &mut self,
    program: &Self::ProgramRepr,
    location: i32,
    update: UniformUpdate,
  );
}
