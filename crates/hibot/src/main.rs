use std::sync::Arc;

use hibot_core::{
    config::Config,
    logging,
    store::{HighlightStore, JsonStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load()?);
    logging::init("hibot")?;
    cfg.warn_missing();

    let store: Arc<dyn HighlightStore> = match &cfg.store_path {
        Some(path) => {
            tracing::info!("using subscription store at {}", path.display());
            Arc::new(JsonStore::open(path)?)
        }
        None => Arc::new(JsonStore::in_memory()),
    };

    hibot_discord::run(cfg, store).await
}
