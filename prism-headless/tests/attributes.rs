mod common;

use common::{init_logger, TEXTURED_FS, TEXTURED_VS};
use prism::backend::vertex::VertexAttribPointer;
use prism::shader::Program;
use prism::vertex::{AttrFormat, AttrType, Attribute, AttributeDesc, AttributeSet};
use prism_headless::{Call, Headless};

// interleaved position and texture coordinates
fn sprite_vertices(buffer: u32, base_offset: usize) -> AttributeSet {
  let mut attribute = Attribute::with_base_offset(buffer, base_offset);
  attribute
    .add_desc(AttributeDesc::new(
      AttrType::Position,
      2,
      AttrFormat::Float,
      false,
      16,
      0,
    ))
    .add_desc(AttributeDesc::new(
      AttrType::Texture,
      2,
      AttrFormat::Float,
      false,
      16,
      8,
    ));

  let mut set = AttributeSet::new();
  set.add_attribute(attribute);
  set
}

fn sprite_program(backend: &mut Headless) -> Program<Headless> {
  let mut program = Program::new(backend, "sprite", TEXTURED_VS, TEXTURED_FS).unwrap();
  program
    .set_alternate_attribute_name("a_position", "position")
    .unwrap();
  program
    .set_alternate_attribute_name("a_texcoord", "texcoord")
    .unwrap();
  program
}

#[test]
fn apply_then_clean_up() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  program.configure_actives(&mut set);
  let locations: Vec<_> = set.descs().map(AttributeDesc::location).collect();
  assert_eq!(locations, [Some(0), Some(1)]);

  program.make_active(&mut backend).unwrap();
  program.apply_attribute_set(&mut backend, &set);

  assert_eq!(backend.enabled_vertex_attribs(), [0, 1]);
  assert_eq!(program.enabled_attribs(), [0, 1]);
  assert_eq!(backend.bound_array_buffer(), Some(3));
  assert_eq!(
    backend.vertex_attrib_pointer(1),
    Some((
      3,
      VertexAttribPointer {
        elements: 2,
        format: AttrFormat::Float,
        normalise: false,
        stride: 16,
        offset: 8,
      }
    ))
  );

  program.clean_up_after_draw(&mut backend);

  assert!(backend.enabled_vertex_attribs().is_empty());
  assert!(program.enabled_attribs().is_empty());
}

#[test]
fn clean_up_without_apply_does_nothing() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);

  backend.clear_calls();
  program.clean_up_after_draw(&mut backend);

  assert!(backend.calls().is_empty());
}

#[test]
fn clean_up_twice_disables_once() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  program.configure_actives(&mut set);
  program.apply_attribute_set(&mut backend, &set);
  program.clean_up_after_draw(&mut backend);

  backend.clear_calls();
  program.clean_up_after_draw(&mut backend);

  assert!(backend.calls().is_empty());
}

#[test]
fn base_offset_is_added() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(9, 64);

  program.configure_actives(&mut set);
  program.apply_attribute_set(&mut backend, &set);

  let offsets: Vec<_> = [0, 1]
    .iter()
    .filter_map(|&location| backend.vertex_attrib_pointer(location))
    .map(|(_, pointer)| pointer.offset)
    .collect();
  assert_eq!(offsets, [64, 72]);

  program.clean_up_after_draw(&mut backend);
}

#[test]
fn unresolved_descriptors_are_skipped() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  set.add_attribute({
    let mut normals = Attribute::new(4);
    normals.add_desc(AttributeDesc::new(
      AttrType::Normal,
      3,
      AttrFormat::Float,
      false,
      0,
      0,
    ));
    normals
  });

  program.configure_actives(&mut set);
  let locations: Vec<_> = set.descs().map(AttributeDesc::location).collect();
  assert_eq!(locations, [Some(0), Some(1), None]);

  program.apply_attribute_set(&mut backend, &set);
  assert_eq!(backend.enabled_vertex_attribs(), [0, 1]);

  program.clean_up_after_draw(&mut backend);
  assert!(backend.enabled_vertex_attribs().is_empty());
}

#[test]
fn descriptors_must_be_configured() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let set = sprite_vertices(3, 0);

  program.apply_attribute_set(&mut backend, &set);

  assert!(backend.enabled_vertex_attribs().is_empty());
}

#[test]
fn with_attributes_wraps_a_draw() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  program.configure_actives(&mut set);
  backend.clear_calls();

  let enabled_during_draw =
    program.with_attributes(&mut backend, &set, |backend| backend.enabled_vertex_attribs());

  assert_eq!(enabled_during_draw, [0, 1]);
  assert!(backend.enabled_vertex_attribs().is_empty());

  let calls = backend.calls();
  assert_eq!(calls.len(), 4);
  assert!(matches!(calls[0], Call::EnableVertexAttrib { location: 0, .. }));
  assert!(matches!(calls[1], Call::EnableVertexAttrib { location: 1, .. }));
  assert!(calls[2..]
    .iter()
    .all(|call| matches!(call, Call::DisableVertexAttrib(_))));
}

#[test]
fn relink_keeps_enabled_locations_for_clean_up() {
  init_logger();

  let mut backend = Headless::new();
  let mut program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  program.configure_actives(&mut set);
  program.apply_attribute_set(&mut backend, &set);

  program
    .relink(&mut backend, TEXTURED_VS, TEXTURED_FS)
    .unwrap();
  assert_eq!(program.enabled_attribs(), [0, 1]);

  program.clean_up_after_draw(&mut backend);

  assert!(backend.enabled_vertex_attribs().is_empty());
  assert!(program.enabled_attribs().is_empty());
}

#[test]
fn every_draw_binds_its_buffer() {
  init_logger();

  let mut backend = Headless::new();
  let program = sprite_program(&mut backend);
  let mut set = sprite_vertices(3, 0);

  program.configure_actives(&mut set);
  program.with_attributes(&mut backend, &set, |_| ());

  backend.bind_array_buffer(5);
  program.apply_attribute_set(&mut backend, &set);

  assert_eq!(backend.bound_array_buffer(), Some(3));
  assert_eq!(backend.vertex_attrib_pointer(0).map(|(buffer, _)| buffer), Some(3));

  program.clean_up_after_draw(&mut backend);
}
