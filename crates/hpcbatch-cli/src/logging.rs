use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tokio::sync::mpsc;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, MakeWriter, writer::BoxMakeWriter},
    prelude::*,
};

pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global subscriber.
///
/// Console output is routed through the UI channel when one is given so log
/// lines do not tear the progress bars; otherwise it goes straight to stderr.
pub fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<&Path>,
    ui_sender: Option<mpsc::Sender<UiEvent>>,
) -> Result<()> {
    let console_writer = match ui_sender {
        Some(sender) => BoxMakeWriter::new(UiMakeWriter { sender }),
        None => BoxMakeWriter::new(io::stderr),
    };

    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(console_layer);

    if let Some(path) = log_file {
        let file = File::create(path).map_err(CliError::Io)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true);

        subscriber
            .with(file_layer)
            .try_init()
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))?;
    } else {
        subscriber
            .try_init()
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))?;
    }

    Ok(())
}

struct UiMakeWriter {
    sender: mpsc::Sender<UiEvent>,
}

impl<'a> MakeWriter<'a> for UiMakeWriter {
    type Writer = UiWriter;

    fn make_writer(&'a self) -> Self::Writer {
        UiWriter {
            sender: self.sender.clone(),
            buffer: Vec::new(),
        }
    }
}

/// Collects one formatted event and hands it to the UI task when dropped.
pub struct UiWriter {
    sender: mpsc::Sender<UiEvent>,
    buffer: Vec<u8>,
}

impl Write for UiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for UiWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buffer)
            .trim_end_matches('\n')
            .to_string();
        // UI gone or saturated: fall back to stderr rather than lose the line.
        if self.sender.try_send(UiEvent::Log(line.clone())).is_err() {
            eprintln!("{}", line);
        }
    }
}
