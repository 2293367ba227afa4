//! Captures log output so scenarios can assert on warnings

use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;

static BUFFER: OnceLock<Arc<Mutex<Vec<u8>>>> = OnceLock::new();

fn buffer() -> Arc<Mutex<Vec<u8>>> {
    Arc::clone(BUFFER.get_or_init(|| Arc::new(Mutex::new(Vec::new()))))
}

#[derive(Clone)]
pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route all log output of the test binary into the capture buffer
pub fn install() {
    let writer = LogWriter(buffer());
    tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();
}

pub fn captured() -> String {
    String::from_utf8_lossy(&buffer().lock().unwrap()).into_owned()
}
