#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

pub const VS: &str = "
uniform mat4 u_mvp_matrix;
attribute vec2 a_position;

void main() {
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}";

pub const FS: &str = "
uniform vec4 u_color;

void main() {
  gl_FragColor = u_color;
}";

pub const TEXTURED_VS: &str = "
uniform mat4 u_mvp_matrix;
attribute vec2 a_position;
attribute vec2 a_texcoord;
varying vec2 v_texcoord;

void main() {
  v_texcoord = a_texcoord;
  gl_Position = u_mvp_matrix * vec4(a_position, 0.0, 1.0);
}";

pub const TEXTURED_FS: &str = "
uniform sampler2D u_tex_map;
varying vec2 v_texcoord;

void main() {
  gl_FragColor = texture2D(u_tex_map, v_texcoord);
}";

thread_local!(static WARNINGS: RefCell<Vec<String>> = RefCell::new(Vec::new()));

// forwards to env_logger and keeps the warnings of the current test thread
struct CapturingLogger {
  inner: env_logger::Logger,
}

impl Log for CapturingLogger {
  fn enabled(&self, _: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    if record.level() == Level::Warn {
      WARNINGS.with(|warnings| warnings.borrow_mut().push(record.args().to_string()));
    }

    if self.inner.enabled(record.metadata()) {
      self.inner.log(record);
    }
  }

  fn flush(&self) {
    self.inner.flush();
  }
}

pub fn init_logger() {
  static INIT: Once = Once::new();

  INIT.call_once(|| {
    let inner = env_logger::builder().is_test(true).build();
    let logger = Box::leak(Box::new(CapturingLogger { inner }));

    if log::set_logger(logger).is_ok() {
      log::set_max_level(LevelFilter::Trace);
    }
  });

  WARNINGS.with(|warnings| warnings.borrow_mut().clear());
}

/// Warnings logged on this thread since the last call, or since [`init_logger`].
pub fn take_warnings() -> Vec<String> {
  WARNINGS.with(|warnings| warnings.borrow_mut().drain(..).collect())
}
