pub mod aggregate;
pub mod analyze;
pub mod array;
pub mod convert;
pub mod disorder;
pub mod pipeline;
pub mod script;

use crate::ui::{CliProgressHandler, UiEvent};
use hpcbatch::engine::progress::ProgressReporter;
use tokio::sync::mpsc;

pub(crate) fn reporter(ui_sender: &mpsc::Sender<UiEvent>) -> ProgressReporter<'static> {
    let handler = CliProgressHandler::new(ui_sender.clone());
    ProgressReporter::with_callback(handler.get_callback())
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::GlobalOptions;
    use crate::ui::UiEvent;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    /// Keep the receiver alive for the duration of the test so sends do not fail.
    pub fn ui_channel() -> (mpsc::Sender<UiEvent>, mpsc::Receiver<UiEvent>) {
        mpsc::channel(1024)
    }

    pub fn options_with(config: PathBuf, dry_run: bool) -> GlobalOptions {
        GlobalOptions {
            config: Some(config),
            set_values: Vec::new(),
            dry_run,
        }
    }
}
