pub mod terminal;

use crate::{bbdown::Runner, form::FormState, form::Status};
use anyhow::Result;
use std::sync::Arc;
use terminal::TerminalApp;

/// Runs the form against the real terminal, closing it on Ctrl-C.
pub async fn run(form: FormState, runner: Arc<dyn Runner>) -> Result<Status> {
    let mut app = TerminalApp::new(form, runner);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    app.run(&mut stdout, &mut stderr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
