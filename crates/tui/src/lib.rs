//! # pl-tui
//!
//! Terminal User Interface for promptline.
//!
//! One screen: the pipeline list, the input form of the selected pipeline,
//! and a results pane with the final artifact, the intermediate steps, the
//! email form and the session history. The UI talks to the `pl-core`
//! runtime worker over channels using the `Op` and `Event` protocol defined
//! in `pl-protocol`.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod state;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use pl_core::runtime::Runtime;
use pl_protocol::ipc::Op;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

/// Run the interactive UI until the user quits.
///
/// The runtime worker is spawned on the current tokio runtime and stopped
/// when the UI exits. Saved results go to `save_dir`.
pub async fn run_app(runtime: Runtime, save_dir: PathBuf) -> Result<()> {
    let pipelines = runtime.config().pipelines.clone();

    let (op_tx, op_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(256);
    let worker = tokio::spawn(runtime.serve(op_rx, event_tx));

    let mut tui = Tui::init()?;
    let mut app = App::new(pipelines, save_dir, op_tx.clone(), event_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    drop(app);
    let _ = op_tx.send(Op::Shutdown).await;
    let _ = worker.await;
    info!("ui closed");

    result
}
