//! `tillbook` binary: opens the local store, keeps the background sync
//! worker running and logs drain activity until ctrl-c.

use tillbook_app::{AppConfig, ShopApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tillbook_observability::init();

    let app = ShopApp::open(AppConfig::from_env()).await?;
    let worker = app.spawn_sync_worker();

    tracing::info!("tillbook running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    worker.stop().await;
    Ok(())
}
