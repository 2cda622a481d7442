use anyhow::Context;
use ingest::domain::config::ApiConfig;
use ingest::kernel::config::load_config;
use ingest_logger::Logger;
use ingest_server::Server;

/// Optional path of the config file; `server.toml` in the working directory otherwise.
const CONFIG_PATH_VAR: &str = "INGEST_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(std::env::var_os(CONFIG_PATH_VAR))
        .context("Critical: Configuration is malformed")?;

    let mut logger = Logger::builder(env!("CARGO_PKG_NAME"))
        .level_name(&cfg.logging.level)?
        .json(cfg.logging.json);
    if let Some(filter) = &cfg.logging.filter {
        logger = logger.env_filter(filter);
    }
    if let Some(path) = &cfg.logging.path {
        logger = logger.file(path);
    }
    let _log = logger.init()?;

    Server::builder().config(cfg).build().await?.run().await
}
