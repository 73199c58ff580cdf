mod config;
mod persistence;
mod session;
mod terminal;

use std::sync::Arc;

use anyhow::Context;
use chat_engine::ReqwestGenerator;
use chat_logging::chat_info;

use config::AppConfig;
use persistence::StateStore;
use session::ChatSession;
use terminal::TerminalView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    chat_logging::initialize(&config.log_destination, config.log_level);
    chat_info!(
        "starting chat: server={} state_dir={:?}",
        config.generate.base_url,
        config.state_dir
    );

    let generator =
        ReqwestGenerator::new(config.generate.clone()).context("failed to build HTTP client")?;
    let store = StateStore::new(&config.state_dir);
    let view = TerminalView::new(std::io::stdout());

    let mut session = ChatSession::new(Arc::new(generator), store, view);
    terminal::run(&mut session).await;
    Ok(())
}
