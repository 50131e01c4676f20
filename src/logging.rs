use crate::error::SetupError;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Installs the global logger.
///
/// `level` is an `env_logger` filter string; `RUST_LOG` takes precedence when
/// set. Records always go to stderr; with `file` they are also appended there.
pub fn init(level: &str, file: Option<&Path>) -> Result<(), SetupError> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp_secs();

    if let Some(path) = file {
        let tee = Tee::new(open_log_file(path)?, io::stderr());
        builder.target(env_logger::Target::Pipe(Box::new(tee)));
    }

    builder
        .try_init()
        .map_err(|e| SetupError::Logging(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File, SetupError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SetupError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SetupError::Logging(format!("{}: {}", path.display(), e)))
}

/// Writes every record to a log file and a console stream
struct Tee<F, C> {
    file: F,
    console: C,
}

impl<F: Write, C: Write> Tee<F, C> {
    fn new(file: F, console: C) -> Self {
        Self { file, console }
    }
}

impl<F: Write, C: Write> Write for Tee<F, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        // a closed console must not stop file logging
        let _ = self.console.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
