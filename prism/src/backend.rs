//! Backend interfacing.
//!
//! Almost everything declared in this module and its submodules is `unsafe`. An end-user is not
//! supposed to implement any of this. Library authors might use some traits from here, required
//! by generic code, but no one should ever call anything from here directly: go through the
//! safe types in [`crate::shader`] instead.

pub mod shader;
pub mod vertex;
