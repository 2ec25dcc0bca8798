use anyhow::Context;
use clap::Parser;
use petcare_admin::session::FileStorage;
use petcare_admin::transport::ReqwestTransport;
use petcare_admin::{cli, commands, config};
use petcare_common::{ApiClient, Dashboard};
use cli::{Cli, Commands};
use config::Config;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = Config::load().context("設定ファイルの読み込みに失敗しました")?;

    if let Commands::Config { set_base_url, show } = &cli.command {
        if let Some(url) = set_base_url {
            config.set_base_url(url)?;
            println!("✔ APIのURLを設定しました: {}", config.base_url);
        }

        if *show || set_base_url.is_none() {
            println!("設定:");
            println!("  API URL: {}", config.api_url());
            println!("  ストレージURL: {}", config.storage_url);
            println!("  1ページの件数: {}", config.page_size);
            println!("  タイムアウト: {}秒", config.timeout_seconds);
            println!("  設定ファイル: {}", Config::config_path()?.display());
        }
        return Ok(());
    }

    let transport = ReqwestTransport::new(&config.api_url(), config.timeout_seconds)?;
    let storage = FileStorage::open(&FileStorage::default_path()?);
    let dashboard: Dashboard = Dashboard::new(ApiClient::new(transport), Arc::new(storage));
    tracing::debug!(api = %config.api_url(), authenticated = dashboard.auth.is_authenticated(), "dashboard ready");

    match cli.command {
        Commands::Login { email } => commands::login(&dashboard, email).await?,
        Commands::Register => commands::register(&dashboard).await?,
        Commands::Logout => commands::logout(&dashboard).await?,
        Commands::Whoami => commands::whoami(&dashboard).await?,
        Commands::Clients { action } => commands::clients(&dashboard, action).await?,
        Commands::Pets { action } => commands::pets(&dashboard, &config, action).await?,
        Commands::Breeds { species, refresh } => {
            commands::breeds(&dashboard, &species, refresh).await?
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
