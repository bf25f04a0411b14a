//! Terminal console for routepick
//!
//! Reads commands line by line and forwards point activations to the
//! session; prints notices as they arrive.

use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use routepick::{
    format_catalog, parse_command, AirportCatalog, Notice, Notifier, SessionEvent, SurfaceCommand,
};

use crate::cli::ProgressManager;

/// Forward user commands to the session until `quit` or end of input
pub async fn read_commands<R>(
    input: R,
    catalog: &AirportCatalog,
    events: mpsc::Sender<SessionEvent>,
    notifier: Notifier,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(SurfaceCommand::Event(event)) => {
                if events.send(event).await.is_err() {
                    debug!("Session stopped, no longer reading commands");
                    break;
                }
            }
            Ok(SurfaceCommand::List) => notifier.info(format_catalog(catalog).trim_end()),
            Ok(SurfaceCommand::Help) => notifier.info(routepick::core::surface::HELP_TEXT),
            Ok(SurfaceCommand::Quit) => break,
            Ok(SurfaceCommand::Nothing) => {}
            Err(usage) => notifier.warn(usage),
        }
    }
    Ok(())
}

/// Print notices until every sender is gone
pub async fn print_notices(mut notices: mpsc::UnboundedReceiver<Notice>) {
    let mut progress = ProgressManager::new();
    while let Some(notice) = notices.recv().await {
        match notice {
            Notice::Info(msg) => progress.println(&format!("ℹ️  {msg}")),
            Notice::Warning(msg) => progress.println(&format!("⚠️  {msg}")),
            Notice::Error(msg) => progress.println(&format!("❌ {msg}")),
            Notice::Busy(msg) => progress.busy(&format!("🛫 {msg}")),
            Notice::Idle => progress.idle(),
        }
    }
    progress.idle();
}
