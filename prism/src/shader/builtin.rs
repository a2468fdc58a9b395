//! Built-in shader programs.
//!
//! These are the programs every renderer can rely on. They’re compiled lazily by the
//! [`ShaderRegistry`](crate::registry::ShaderRegistry), the first time it’s accessed.

/// A built-in program definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuiltinShader {
  pub name: &'static str,
  pub vertex: &'static str,
  pub fragment: &'static str,
  /// `(logical, canonical)` uniform names.
  pub uniforms: &'static [(&'static str, &'static str)],
  /// `(logical, canonical)` attribute names.
  pub attributes: &'static [(&'static str, &'static str)],
}

/// Name of the program used when nothing more specific is asked for.
pub const DEFAULT: &str = "default";

/// Every built-in program.
pub const BUILTINS: &[BuiltinShader] = &[
  BuiltinShader {
    name: DEFAULT,
    vertex: DEFAULT_VS,
    fragment: DEFAULT_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("discard", "u_discard"),
      ("tex_map", "u_tex_map"),
      ("palette", "u_palette"),
      ("palette_width", "u_palette_width"),
      ("palette_map", "u_palette_map"),
      ("enable_palette_lookup", "u_enable_palette_lookup"),
      ("tex_map0", "u_tex_map"),
    ],
    attributes: &[("position", "a_position"), ("texcoord", "a_texcoord")],
  },
  BuiltinShader {
    name: "simple",
    vertex: SIMPLE_VS,
    fragment: SIMPLE_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("discard", "u_discard"),
      ("point_size", "u_point_size"),
    ],
    attributes: &[("position", "a_position")],
  },
  BuiltinShader {
    name: "complex",
    vertex: COMPLEX_VS,
    fragment: COMPLEX_FS,
    uniforms: &[
      ("mv_matrix", "u_mv_matrix"),
      ("p_matrix", "u_p_matrix"),
      ("color", "u_color"),
      ("discard", "u_discard"),
      ("point_size", "u_point_size"),
      ("line_width", "u_line_width"),
    ],
    attributes: &[("position", "a_position"), ("normal", "a_normal")],
  },
  BuiltinShader {
    name: "attr_color_shader",
    vertex: ATTR_COLOR_VS,
    fragment: ATTR_COLOR_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("discard", "u_discard"),
      ("point_size", "u_point_size"),
    ],
    attributes: &[("position", "a_position"), ("color", "a_color")],
  },
  BuiltinShader {
    name: "vtc_shader",
    vertex: VTC_VS,
    fragment: VTC_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("tex_map", "u_tex_map"),
      ("tex_map0", "u_tex_map"),
    ],
    attributes: &[
      ("position", "a_position"),
      ("texcoord", "a_texcoord"),
      ("color", "a_color"),
    ],
  },
  BuiltinShader {
    name: "circle",
    vertex: CIRCLE_VS,
    fragment: CIRCLE_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("discard", "u_discard"),
      ("outer_radius", "u_outer_radius"),
      ("inner_radius", "u_inner_radius"),
      ("screen_dimensions", "u_screen_dimensions"),
      ("centre", "u_centre"),
    ],
    attributes: &[("position", "a_position")],
  },
  BuiltinShader {
    name: "point_shader",
    vertex: POINT_VS,
    fragment: POINT_FS,
    uniforms: &[
      ("mvp_matrix", "u_mvp_matrix"),
      ("color", "u_color"),
      ("point_size", "u_point_size"),
    ],
    attributes: &[("position", "a_position")],
  },
];

/// Look a built-in program definition up by name.
pub fn find(name: &str) -> Option<&'static BuiltinShader> {
  BUILTINS.iter().find(|builtin| builtin.name == name)
}

const DEFAULT_VS: &str = r#"
uniform mat4 u_mvp_matrix;
attribute vec2 a_position;
attribute vec2 a_texcoord;
varying vec2 v_texcoord;

void main() {
  v_texcoord = a_texcoord;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}
"#;

const DEFAULT_FS: &str = r#"
uniform sampler2D u_tex_map;
uniform sampler2D u_palette_map;
uniform bool u_enable_palette_lookup;
uniform float u_palette;
uniform float u_palette_width;
uniform bool u_discard;
uniform vec4 u_color;
varying vec2 v_texcoord;

void main() {
  vec4 texel = texture2D(u_tex_map, v_texcoord);

  if (u_enable_palette_lookup) {
    texel = texture2D(u_palette_map, vec2(255.0 * texel.r / (u_palette_width - 0.5), u_palette));
  }

  if (u_discard && texel.a == 0.0) {
    discard;
  } else {
    gl_FragColor = texel * u_color;
  }
}
"#;

const SIMPLE_VS: &str = r#"
uniform mat4 u_mvp_matrix;
uniform float u_point_size;
attribute vec2 a_position;

void main() {
  gl_PointSize = u_point_size;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}
"#;

const SIMPLE_FS: &str = r#"
uniform bool u_discard;
uniform vec4 u_color;

void main() {
  gl_FragColor = u_color;

  if (u_discard && gl_FragColor.a == 0.0) {
    discard;
  }
}
"#;

const COMPLEX_VS: &str = r#"
uniform mat4 u_mv_matrix;
uniform mat4 u_p_matrix;
uniform float u_point_size;
uniform float u_line_width;
attribute vec2 a_position;
attribute vec2 a_normal;
varying vec2 v_normal;

void main() {
  gl_PointSize = u_point_size;
  vec4 delta = vec4(a_normal * u_line_width, 0.0, 0.0);
  vec4 pos = u_mv_matrix * vec4(a_position, 0.0, 1.0);
  gl_Position = u_p_matrix * (pos + delta);
  v_normal = a_normal;
}
"#;

const COMPLEX_FS: &str = r#"
uniform bool u_discard;
uniform vec4 u_color;
uniform float u_line_width;
uniform float u_blur;
varying vec2 v_normal;

void main() {
  float dist = length(v_normal) * u_line_width;
  float alpha = clamp((u_line_width - dist) / u_blur, 0.0, 1.0);
  gl_FragColor = vec4(u_color.rgb, alpha);

  if (u_discard && gl_FragColor.a == 0.0) {
    discard;
  }
}
"#;

const ATTR_COLOR_VS: &str = r#"
uniform mat4 u_mvp_matrix;
uniform float u_point_size;
attribute vec2 a_position;
attribute vec4 a_color;
varying vec4 v_color;

void main() {
  v_color = a_color;
  gl_PointSize = u_point_size;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}
"#;

const ATTR_COLOR_FS: &str = r#"
uniform bool u_discard;
uniform vec4 u_color;
varying vec4 v_color;

void main() {
  gl_FragColor = v_color * u_color;

  if (u_discard && gl_FragColor.a == 0.0) {
    discard;
  }
}
"#;

const VTC_VS: &str = r#"
uniform mat4 u_mvp_matrix;
attribute vec2 a_position;
attribute vec2 a_texcoord;
attribute vec4 a_color;
varying vec2 v_texcoord;
varying vec4 v_color;

void main() {
  v_color = a_color;
  v_texcoord = a_texcoord;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}
"#;

const VTC_FS: &str = r#"
uniform sampler2D u_tex_map;
uniform vec4 u_color;
varying vec2 v_texcoord;
varying vec4 v_color;

void main() {
  gl_FragColor = texture2D(u_tex_map, v_texcoord) * v_color * u_color;
}
"#;

const CIRCLE_VS: &str = r#"
uniform mat4 u_mvp_matrix;
attribute vec2 a_position;
varying vec2 v_position;

void main() {
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
  v_position = a_position;
}
"#;

// gl_FragCoord has its origin at the bottom-left corner; u_centre is in screen coordinates
const CIRCLE_FS: &str = r#"
uniform bool u_discard;
uniform vec4 u_color;
uniform float u_outer_radius;
uniform float u_inner_radius;
uniform vec2 u_centre;
uniform vec2 u_screen_dimensions;
varying vec2 v_position;

void main() {
  vec2 pos = vec2(gl_FragCoord.x, u_screen_dimensions.y - gl_FragCoord.y) - u_centre;
  float dist_squared = dot(pos, pos);
  float r_squared = u_outer_radius * u_outer_radius;
  float ir_squared = u_inner_radius * u_inner_radius;

  if (u_inner_radius > 0.0 && dist_squared < ir_squared) {
    gl_FragColor = mix(
      vec4(u_color.rgb, 0.0),
      u_color,
      smoothstep(ir_squared - u_inner_radius - 0.25, ir_squared + u_inner_radius - 0.25, dist_squared)
    );
  } else if (dist_squared < r_squared) {
    gl_FragColor = mix(
      u_color,
      vec4(u_color.rgb, 0.0),
      smoothstep(r_squared - u_outer_radius + 0.25, r_squared + u_outer_radius + 0.25, dist_squared)
    );
  } else {
    discard;
  }
}
"#;

const POINT_VS: &str = r#"
uniform mat4 u_mvp_matrix;
uniform float u_point_size;
attribute vec2 a_position;

void main() {
  gl_PointSize = u_point_size;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}
"#;

const POINT_FS: &str = r#"
uniform vec4 u_color;

void main() {
  gl_FragColor = u_color;
}
"#;

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn seven_uniquely_named_builtins() {
    let names: HashSet<_> = BUILTINS.iter().map(|b| b.name).collect();
    assert_eq!(BUILTINS.len(), 7);
    assert_eq!(names.len(), BUILTINS.len());
    assert!(find(DEFAULT).is_some());
    assert!(find("vtc_shader").is_some());
    assert!(find("fancy").is_none());
  }

  #[test]
  fn alternate_tables_target_declared_symbols() {
    for builtin in BUILTINS {
      let source = format!("{}{}", builtin.vertex, builtin.fragment);

      for (logical, canonical) in builtin.uniforms.iter().chain(builtin.attributes) {
        assert!(
          source.contains(canonical),
          "{}: {} maps to undeclared {}",
          builtin.name,
          logical,
          canonical
        );
      }
    }
  }

  #[test]
  fn logical_names_are_unique_per_table() {
    for builtin in BUILTINS {
      for table in [builtin.uniforms, builtin.attributes] {
        let logical: HashSet<_> = table.iter().map(|(l, _)| l).collect();
        assert_eq!(logical.len(), table.len(), "{}", builtin.name);
      }
    }
  }
}
