use suimessenger::{config::Config, router, wallet::Keystore, AppState, Chains};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let keystore = match config.keystore.as_deref() {
        Some(path) => {
            let keystore = Keystore::load(path)?;
            info!(path, accounts = keystore.addresses().count(), "keystore loaded");
            keystore
        }
        None => {
            warn!("SUI_KEYSTORE is not set, no account can connect");
            Keystore::default()
        }
    };

    let chains = Chains::from_config(&config);
    let bind = config.bind.clone();
    let app = router(AppState::new(config, chains, keystore));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("listening on {bind}");
    axum::serve(listener, app).await?;
    Ok(())
}
