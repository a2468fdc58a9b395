//! # Shader program management for a real-time renderer
//!
//! prism is the layer of a rendering engine that owns GPU shader programs. It compiles shader
//! stages, links them into programs, introspects what the driver reports as _active_ symbols
//! and builds a lookup layer on top of that so that the rest of the engine can talk about
//! uniforms and vertex attributes with stable _logical names_ (`"color"`, `"mvp_matrix"`,
//! `"position"`…) instead of the raw GLSL symbol names each shader variant happens to use.
//!
//! It also drives the per-draw protocol: making a program current, pushing uniform values
//! (dispatched on the type reported by introspection, never on the call-site type) and wiring
//! vertex attribute layouts described by geometry producers.
//!
//! # What’s included?
//!
//! - **Stages and programs**: [`Stage`](shader::Stage) owns one compiled GPU stage,
//!   [`Program`](shader::program::Program) owns a linked vertex / fragment pair together with
//!   its introspected uniform and attribute tables and its alternate-name tables.
//! - **Name resolution**: exact canonical names first, alternate (logical) names second. Misses
//!   are reported as `None` by tolerant lookups and as typed errors by strict lookups.
//! - **Uniform dispatch**: a data-driven table maps every supported GLSL type to the shape of
//!   the backend call that updates it.
//! - **Attribute descriptor sets**: the binary layout of vertex data, resolved against a
//!   program at configuration time and enabled / disabled around each draw.
//! - **The shader registry**: a named collection of programs, with a built-in set populated
//!   lazily on first access and user programs registered from data descriptors.
//!
//! # Backends
//!
//! This crate is backend-agnostic. A backend implements the traits in [`backend`]:
//!
//! - `prism-gl` implements them on top of OpenGL 3.3.
//! - `prism-headless` simulates compilation, linking and introspection without a GPU, which
//!   is what the test-suite and data validation tools run against.
//!
//! # On threads
//!
//! Graphics drivers are not safe to drive from several threads. Backends and programs are
//! `!Send` and `!Sync`, so everything in here runs on the thread owning the rendering context.

pub mod backend;
pub mod context;
pub mod registry;
pub mod shader;
pub mod texture;
pub mod vertex;
