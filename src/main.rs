mod data;
mod export;
mod server;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::server::AppContext;
use crate::state::DatasetStore;

#[derive(Parser)]
#[command(name = "visitlens")]
#[command(about = "Student website-visit analytics server", long_about = None)]
struct Cli {
    /// Address to serve on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Visit-log CSV to load at startup (uploads can replace it later).
    #[arg(long)]
    load: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = Arc::new(DatasetStore::new());
    if let Some(path) = &cli.load {
        let dataset = data::loader::load_csv_path(path)
            .with_context(|| format!("loading {}", path.display()))?;
        let rows = store.replace(dataset);
        log::info!("Preloaded {rows} rows from {}", path.display());
    }

    let app = server::router(AppContext { store });
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    log::info!("Serving on http://{}", cli.bind);
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
