mod common;

use common::{init_logger, take_warnings, FS, TEXTURED_FS, TEXTURED_VS, VS};
use prism::context::{GraphicsContext as _, RenderContext};
use prism::registry::{RegistryError, ShaderDescriptor, ShaderRegistry};
use prism::shader::builtin::{self, BUILTINS};
use prism::shader::{ProgramError, StageError};
use prism_headless::Headless;
use std::rc::Rc;

#[test]
fn builtins_are_lazy() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::<Headless>::new();

  assert!(registry.is_empty());
  assert!(!registry.builtins_ready());
  assert_eq!(backend.live_programs(), 0);

  registry.get(&mut backend, "circle").unwrap();

  assert!(registry.builtins_ready());
  assert_eq!(registry.len(), BUILTINS.len());
  assert_eq!(
    registry.names(),
    [
      "attr_color_shader",
      "circle",
      "complex",
      "default",
      "point_shader",
      "simple",
      "vtc_shader"
    ]
  );
}

#[test]
fn lookups_share_programs() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();

  let a = registry.get(&mut backend, "simple").unwrap();
  let b = registry.get(&mut backend, "simple").unwrap();

  assert!(Rc::ptr_eq(&a, &b));
  assert_eq!(backend.live_programs(), BUILTINS.len());
}

#[test]
fn unknown_shader() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();

  match registry.get(&mut backend, "fancy") {
    Err(RegistryError::UnknownShader(name)) => assert_eq!(name, "fancy"),
    other => panic!("unexpected lookup result: {:?}", other),
  }
}

#[test]
fn existing_program_wins_over_descriptor() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();
  let default = registry.default_program(&mut backend).unwrap();

  take_warnings();

  let desc = ShaderDescriptor::new(builtin::DEFAULT, VS, FS).with_uniform("color", "u_tint");
  let program = registry.get_or_create(&mut backend, &desc).unwrap();

  assert_eq!(
    take_warnings(),
    ["shader default already exists; ignoring conflicting descriptor"]
  );
  assert!(Rc::ptr_eq(&default, &program));
  assert_eq!(
    program.vertex_stage().source(),
    builtin::find(builtin::DEFAULT).unwrap().vertex
  );
  assert_eq!(program.uniform_alternates().canonical("color"), Some("u_color"));
  assert_eq!(backend.live_programs(), BUILTINS.len());
}

#[test]
fn descriptors_create_programs_once() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();

  let fs = "
    uniform vec4 u_tint;
    void main() { gl_FragColor = u_tint; }";
  let desc = ShaderDescriptor::new("tinted", VS, fs)
    .with_uniform("color", "u_tint")
    .with_uniform("mvp_matrix", "u_mvp_matrix")
    .with_attribute("position", "a_position");

  let program = registry.get_or_create(&mut backend, &desc).unwrap();

  assert!(registry.contains("tinted"));
  assert_eq!(registry.len(), BUILTINS.len() + 1);
  assert_eq!(program.get_uniform("color"), program.get_uniform("u_tint"));
  assert!(program.actives().color.is_some());
  assert_eq!(program.actives().position, Some(0));

  take_warnings();

  let again = registry.get_or_create(&mut backend, &desc).unwrap();
  assert!(Rc::ptr_eq(&program, &again));
  assert!(take_warnings().is_empty());
  assert_eq!(backend.live_programs(), BUILTINS.len() + 1);
}

#[test]
fn broken_descriptor() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();
  let desc = ShaderDescriptor::new("broken", VS, "void main() {");

  match registry.get_or_create(&mut backend, &desc) {
    Err(RegistryError::Program {
      name,
      error: ProgramError::StageError(StageError::CompilationFailed(..)),
    }) => assert_eq!(name, "broken"),
    other => panic!("unexpected result: {:?}", other),
  }

  assert!(!registry.contains("broken"));
}

#[test]
fn two_logical_names_for_one_uniform() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();

  let desc = ShaderDescriptor::new("aliased", VS, FS)
    .with_uniform("color", "u_color")
    .with_uniform("tint", "u_color");

  let program = registry.get_or_create(&mut backend, &desc).unwrap();
  assert_eq!(program.get_uniform("tint"), program.get_uniform("color"));
}

#[test]
fn load_descriptor_documents() {
  init_logger();

  let document = serde_json::json!({
    "instances": [
      {
        "name": "flat",
        "vertex": VS,
        "fragment": FS,
        "uniforms": { "color": "u_color", "mvp_matrix": "u_mvp_matrix" }
      },
      {
        "name": "sprite",
        "vertex": TEXTURED_VS,
        "fragment": TEXTURED_FS,
        "uniforms": { "tex_map": "u_tex_map" },
        "attributes": { "position": "a_position", "texcoord": "a_texcoord" }
      },
      {
        "name": "simple",
        "vertex": VS,
        "fragment": FS
      }
    ]
  });

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();
  let programs = registry
    .load_descriptors(&mut backend, &document.to_string())
    .unwrap();

  let names: Vec<_> = programs.iter().map(|program| program.name()).collect();
  assert_eq!(names, ["flat", "sprite", "simple"]);

  assert!(programs[0].actives().color.is_some());
  assert_eq!(programs[1].actives().texcoord, Some(1));
  assert!(Rc::ptr_eq(
    &programs[2],
    &registry.get(&mut backend, "simple").unwrap()
  ));
  assert_eq!(registry.len(), BUILTINS.len() + 2);
}

#[test]
fn load_single_descriptor_document() {
  init_logger();

  let document = serde_json::json!({
    "name": "flat",
    "vertex": VS,
    "fragment": FS
  });

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();
  let programs = registry
    .load_descriptors(&mut backend, &document.to_string())
    .unwrap();

  assert_eq!(programs.len(), 1);
  assert!(registry.contains("flat"));
}

#[test]
fn malformed_documents() {
  init_logger();

  let mut backend = Headless::new();
  let mut registry = ShaderRegistry::new();

  assert!(matches!(
    registry.load_descriptors(&mut backend, "{ \"name\": \"flat\" }"),
    Err(RegistryError::Descriptor(_))
  ));
  assert!(matches!(
    registry.load_descriptors(&mut backend, "[]"),
    Err(RegistryError::Descriptor(_))
  ));
}

#[test]
fn register_replaces() {
  init_logger();

  let mut ctx = RenderContext::new(Headless::new());

  let first = ctx.register_shader("flat", VS, FS).unwrap();
  take_warnings();

  let second = ctx.register_shader("flat", TEXTURED_VS, TEXTURED_FS).unwrap();

  assert_eq!(take_warnings(), ["overwriting shader flat"]);
  assert!(!Rc::ptr_eq(&first, &second));
  assert!(Rc::ptr_eq(&ctx.shader("flat").unwrap(), &second));
  assert_eq!(ctx.registry().len(), BUILTINS.len() + 1);
}

#[test]
fn context_releases_programs() {
  init_logger();

  let backend = Headless::new();
  let probe = backend.clone();
  let mut ctx = RenderContext::new(backend);

  {
    let default = ctx.default_shader().unwrap();
    let circle = ctx.shader("circle").unwrap();

    default.make_active(ctx.backend()).unwrap();
    assert_eq!(probe.current_program(), Some(default.handle()));
    assert!(circle.is_linked());
  }

  let sprite = ShaderDescriptor::new("sprite", TEXTURED_VS, TEXTURED_FS);
  ctx.shader_from_descriptor(&sprite).unwrap();
  assert_eq!(probe.live_programs(), BUILTINS.len() + 1);

  let backend = ctx.into_backend();
  assert_eq!(backend.live_programs(), 0);
  assert_eq!(backend.live_stages(), 0);
}
