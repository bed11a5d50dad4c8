use anyhow::{Context, Result};
use tracing::info;

use plugin_metrics::config::args::{Command, parse_args};
use plugin_metrics::config::{StaticConfig, get_config, init_config_from};
use plugin_metrics::system::logging::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args);

    if let Command::GenerateConfig { output } = &cli.command {
        let path = output.as_deref().unwrap_or("config.example.toml");
        if let Err(e) = StaticConfig::default().save_to_file(path) {
            eprintln!("{}", e.format_colored());
            return Err(e).with_context(|| format!("Failed to write {}", path));
        }
        println!("Sample configuration written to {}", path);
        return Ok(());
    }

    if let Err(e) = init_config_from(cli.config_path.as_deref()) {
        eprintln!("{}", e.format_colored());
        return Err(e).context("Failed to load configuration");
    }
    let config = get_config();

    // 日志 guard 必须存活到进程结束
    let _log_guard = init_logging(&config.logging)?;
    info!("plugin-metrics {} starting", env!("CARGO_PKG_VERSION"));

    run().await
}

#[cfg(feature = "server")]
async fn run() -> Result<()> {
    plugin_metrics::runtime::modes::run_server().await
}

#[cfg(not(feature = "server"))]
async fn run() -> Result<()> {
    anyhow::bail!("Built without the `server` feature; nothing to run")
}
