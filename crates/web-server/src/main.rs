use std::path::Path;

// This main function is the entry point when running `cargo run -p web-server`.
// It loads `config.toml` (optional) and the environment, then serves.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(Path::new("config.toml"))?;
    let _guard = configuration::init_tracing(&config.logging)?;
    web_server::run_server(config).await
}
