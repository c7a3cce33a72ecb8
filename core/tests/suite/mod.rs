// Aggregates the ghsh-core integration tests as modules.
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use ghsh_core::Session;
use ghsh_core::config::Config;
use ghsh_core::config::ConfigOverrides;
use ghsh_core::config::ConfigToml;
use tempfile::TempDir;

mod builtins;
mod ghost_loop;
mod openai_client;
mod pipeline;

/// `Write` sink whose contents the test can read back.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub(crate) struct Harness {
    pub session: Session,
    pub out: SharedBuffer,
    pub err: SharedBuffer,
    pub dir: TempDir,
}

impl Harness {
    pub(crate) async fn run(&mut self, line: &str) -> i32 {
        self.session
            .execute_line(line, &mut std::iter::empty::<String>())
            .await
    }

    pub(crate) fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }
}

/// Session with a private history file and no preview delay.
pub(crate) fn harness_with(mut cfg: ConfigToml) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    cfg.history_file.get_or_insert_with(|| dir.path().join("history"));
    cfg.preview_window_ms.get_or_insert(0);
    let config = Config::load_from_base_config_with_overrides(
        cfg,
        ConfigOverrides::default(),
        dir.path().to_path_buf(),
    );
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let session = Session::new(config)
        .expect("session")
        .with_output(Box::new(out.clone()), Box::new(err.clone()));
    Harness {
        session,
        out,
        err,
        dir,
    }
}

pub(crate) fn harness() -> Harness {
    harness_with(ConfigToml::default())
}
