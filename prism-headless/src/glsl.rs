//! Just enough GLSL to find the interface of a stage.
//!
//! A stage is reduced to its global `uniform`, `attribute` and `varying` declarations (and their
//! `in` / `out` spellings) plus the set of identifiers its functions use. A declared symbol is
//! considered active if a function uses it, which is what drivers report in practice.

use prism::shader::{GlslType, StageType};
use std::collections::HashSet;

/// Storage qualifier of a global declaration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Storage {
  Uniform,
  Attribute,
  Varying,
}

/// A global interface declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
  pub storage: Storage,
  pub ty: GlslType,
  pub name: String,
  pub elements: usize,
}

/// The interface of a parsed stage.
#[derive(Clone, Debug)]
pub struct StageInterface {
  declarations: Vec<Declaration>,
  used: HashSet<String>,
}

impl StageInterface {
  /// Parse a stage; the error is the compiler log.
  pub fn parse(stage: StageType, src: &str) -> Result<Self, String> {
    let src = strip_preprocessor(&strip_comments(src));
    check_balance(&src)?;

    let mut declarations = Vec::new();
    let mut rest = String::new();
    let mut statement = String::new();
    let mut depth = 0usize;

    for c in src.chars() {
      match c {
        '{' => {
          if depth == 0 {
            rest.push_str(&statement);
            statement.clear();
          }

          depth += 1;
          rest.push(c);
        }

        '}' => {
          depth = depth.saturating_sub(1);
          rest.push(c);
        }

        ';' if depth == 0 => {
          parse_statement(stage, &statement, &mut declarations, &mut rest)?;
          statement.clear();
        }

        _ if depth == 0 => statement.push(c),

        _ => rest.push(c),
      }
    }

    if !statement.trim().is_empty() {
      return Err(format!(
        "ERROR: syntax error, unexpected end of input after '{}'",
        statement.trim()
      ));
    }

    let words = identifiers(&rest);

    if !words.windows(2).any(|w| w[0] == "void" && w[1] == "main") {
      return Err("ERROR: missing main function".to_owned());
    }

    Ok(StageInterface {
      declarations,
      used: words.into_iter().collect(),
    })
  }

  pub fn declarations(&self) -> &[Declaration] {
    &self.declarations
  }

  pub fn declarations_of(&self, storage: Storage) -> impl Iterator<Item = &Declaration> {
    self
      .declarations
      .iter()
      .filter(move |decl| decl.storage == storage)
  }

  pub fn find(&self, storage: Storage, name: &str) -> Option<&Declaration> {
    self
      .declarations_of(storage)
      .find(|decl| decl.name == name)
  }

  /// Whether a function of the stage refers to `name`.
  pub fn is_used(&self, name: &str) -> bool {
    self.used.contains(name)
  }
}

fn parse_statement(
  stage: StageType,
  statement: &str,
  declarations: &mut Vec<Declaration>,
  rest: &mut String,
) -> Result<(), String> {
  let tokens = tokenize(statement);
  let mut tokens = skip_layout(&tokens).iter().map(String::as_str).peekable();

  let storage = match tokens.peek().copied() {
    None => return Ok(()),
    Some("uniform") => Storage::Uniform,
    Some("varying") => Storage::Varying,

    Some("attribute") => match stage {
      StageType::VertexShader => Storage::Attribute,
      StageType::FragmentShader => {
        return Err("ERROR: 'attribute' supported in vertex shaders only".to_owned())
      }
    },

    Some("in") => match stage {
      StageType::VertexShader => Storage::Attribute,
      StageType::FragmentShader => Storage::Varying,
    },

    Some("out") if stage == StageType::VertexShader => Storage::Varying,

    // precision statements, fragment outputs, constants, prototypes…
    Some(_) => {
      rest.push_str(statement);
      rest.push(';');
      return Ok(());
    }
  };

  tokens.next();

  let ty_name = tokens
    .by_ref()
    .find(|token| !is_precision_or_interpolation(token))
    .ok_or_else(|| "ERROR: syntax error, missing type".to_owned())?;

  let mut names = Vec::new();

  loop {
    let name = tokens
      .next()
      .filter(|token| is_identifier(token))
      .ok_or_else(|| format!("ERROR: syntax error, missing name after '{}'", ty_name))?;

    let mut elements = 1;

    match tokens.next() {
      None => {
        names.push((name, elements));
        break;
      }

      Some(",") => {
        names.push((name, elements));
        continue;
      }

      Some("[") => {
        elements = tokens
          .next()
          .and_then(|size| size.parse::<usize>().ok())
          .filter(|&size| size > 0)
          .ok_or_else(|| format!("ERROR: '{}': array size must be a positive constant", name))?;

        if tokens.next() != Some("]") {
          return Err(format!("ERROR: '{}': missing ']'", name));
        }

        names.push((name, elements));

        match tokens.next() {
          None => break,
          Some(",") => continue,
          Some(token) => return Err(format!("ERROR: syntax error near '{}'", token)),
        }
      }

      Some("=") => {
        return Err(format!(
          "ERROR: '{}': initializers are not supported on interface variables",
          name
        ))
      }

      Some(token) => return Err(format!("ERROR: syntax error near '{}'", token)),
    }
  }

  let ty = GlslType::from_glsl(ty_name)
    .ok_or_else(|| format!("ERROR: '{}': unknown type '{}'", names[0].0, ty_name))?;

  for (name, elements) in names {
    if declarations.iter().any(|decl: &Declaration| decl.name == name) {
      return Err(format!("ERROR: '{}': redefinition", name));
    }

    declarations.push(Declaration {
      storage,
      ty,
      name: name.to_owned(),
      elements,
    });
  }

  Ok(())
}

fn skip_layout(tokens: &[String]) -> &[String] {
  if tokens.first().map(String::as_str) != Some("layout") {
    return tokens;
  }

  match tokens.iter().position(|token| token == ")") {
    Some(close) => &tokens[close + 1..],
    None => &tokens[tokens.len()..],
  }
}

fn is_precision_or_interpolation(token: &str) -> bool {
  matches!(
    token,
    "lowp" | "mediump" | "highp" | "flat" | "smooth" | "noperspective" | "centroid" | "invariant"
  )
}

fn is_identifier(token: &str) -> bool {
  token
    .chars()
    .next()
    .map_or(false, |c| c.is_alphabetic() || c == '_')
    && token.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn tokenize(src: &str) -> Vec<String> {
  let mut tokens = Vec::new();
  let mut current = String::new();

  for c in src.chars() {
    if c.is_alphanumeric() || c == '_' || c == '.' {
      current.push(c);
    } else {
      if !current.is_empty() {
        tokens.push(std::mem::take(&mut current));
      }

      if !c.is_whitespace() {
        tokens.push(c.to_string());
      }
    }
  }

  if !current.is_empty() {
    tokens.push(current);
  }

  tokens
}

// identifiers, in order of appearance
fn identifiers(src: &str) -> Vec<String> {
  let mut words = Vec::new();
  let mut current = String::new();

  for c in src.chars() {
    if c.is_alphanumeric() || c == '_' {
      current.push(c);
    } else if !current.is_empty() {
      words.push(std::mem::take(&mut current));
    }
  }

  if !current.is_empty() {
    words.push(current);
  }

  words.retain(|word| is_identifier(word));
  words
}

fn strip_comments(src: &str) -> String {
  let mut out = String::with_capacity(src.len());
  let mut chars = src.chars().peekable();

  while let Some(c) = chars.next() {
    match (c, chars.peek()) {
      ('/', Some('/')) => {
        for c in chars.by_ref() {
          if c == '\n' {
            out.push('\n');
            break;
          }
        }
      }

      ('/', Some('*')) => {
        chars.next();
        let mut previous = '\0';

        for c in chars.by_ref() {
          if previous == '*' && c == '/' {
            break;
          }

          previous = c;
        }

        out.push(' ');
      }

      _ => out.push(c),
    }
  }

  out
}

fn strip_preprocessor(src: &str) -> String {
  src
    .lines()
    .filter(|line| !line.trim_start().starts_with('#'))
    .collect::<Vec<_>>()
    .join("\n")
}

fn check_balance(src: &str) -> Result<(), String> {
  let mut braces = 0i64;
  let mut parens = 0i64;

  for c in src.chars() {
    match c {
      '{' => braces += 1,
      '}' => braces -= 1,
      '(' => parens += 1,
      ')' => parens -= 1,
      _ => (),
    }

    if braces < 0 {
      return Err("ERROR: syntax error, unexpected '}'".to_owned());
    }

    if parens < 0 {
      return Err("ERROR: syntax error, unexpected ')'".to_owned());
    }
  }

  if braces != 0 {
    return Err("ERROR: syntax error, unbalanced braces".to_owned());
  }

  if parens != 0 {
    return Err("ERROR: syntax error, unbalanced parentheses".to_owned());
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const VS: &str = r#"
    #version 120
    uniform mat4 u_mvp_matrix; // projection
    uniform float u_unused;
    attribute vec2 a_position;
    attribute vec2 a_texcoord;
    varying vec2 v_texcoord;

    /* entry point */
    void main() {
      v_texcoord = a_texcoord;
      gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
    }
  "#;

  #[test]
  fn declarations() {
    let stage = StageInterface::parse(StageType::VertexShader, VS).unwrap();

    let names: Vec<_> = stage
      .declarations_of(Storage::Attribute)
      .map(|decl| decl.name.as_str())
      .collect();
    assert_eq!(names, ["a_position", "a_texcoord"]);

    let mvp = stage.find(Storage::Uniform, "u_mvp_matrix").unwrap();
    assert_eq!(mvp.ty, GlslType::M44);
    assert_eq!(mvp.elements, 1);
    assert_eq!(stage.declarations().len(), 5);
  }

  #[test]
  fn usage() {
    let stage = StageInterface::parse(StageType::VertexShader, VS).unwrap();

    assert!(stage.is_used("u_mvp_matrix"));
    assert!(stage.is_used("v_texcoord"));
    assert!(!stage.is_used("u_unused"));
    // comments don’t count
    assert!(!stage.is_used("projection"));
  }

  #[test]
  fn arrays_and_lists() {
    let stage = StageInterface::parse(
      StageType::FragmentShader,
      "uniform highp vec4 u_colors[3], u_tint;\nvoid main() { gl_FragColor = u_colors[1] * u_tint; }",
    )
    .unwrap();

    assert_eq!(stage.find(Storage::Uniform, "u_colors").unwrap().elements, 3);
    assert_eq!(stage.find(Storage::Uniform, "u_tint").unwrap().ty, GlslType::Vec4);
  }

  #[test]
  fn in_and_out_qualifiers() {
    let vs = StageInterface::parse(
      StageType::VertexShader,
      "layout(location = 0) in vec3 position;\nout vec3 v_pos;\nvoid main() { v_pos = position; }",
    )
    .unwrap();
    assert!(vs.find(Storage::Attribute, "position").is_some());
    assert!(vs.find(Storage::Varying, "v_pos").is_some());

    let fs = StageInterface::parse(
      StageType::FragmentShader,
      "in vec3 v_pos;\nout vec4 frag;\nvoid main() { frag = vec4(v_pos, 1.0); }",
    )
    .unwrap();
    assert!(fs.find(Storage::Varying, "v_pos").is_some());
    assert_eq!(fs.declarations().len(), 1);
  }

  #[test]
  fn compile_errors() {
    let missing_main = StageInterface::parse(StageType::VertexShader, "uniform float x;");
    assert!(missing_main.unwrap_err().contains("main"));

    let unbalanced = StageInterface::parse(StageType::VertexShader, "void main() {");
    assert!(unbalanced.unwrap_err().contains("unbalanced"));

    let unknown = StageInterface::parse(StageType::VertexShader, "uniform vec5 u;\nvoid main() {}");
    assert!(unknown.unwrap_err().contains("unknown type"));

    let attribute_in_fs =
      StageInterface::parse(StageType::FragmentShader, "attribute vec2 a;\nvoid main() {}");
    assert!(attribute_in_fs.is_err());

    let redefinition = StageInterface::parse(
      StageType::VertexShader,
      "uniform float x;\nuniform vec2 x;\nvoid main() {}",
    );
    assert!(redefinition.unwrap_err().contains("redefinition"));
  }
}
