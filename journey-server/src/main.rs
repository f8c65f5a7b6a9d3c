use journey_server::{server, storage};
use journey_shared::auth::Role;
mod cli;

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

fn db_path() -> String {
    std::env::var("DB_PATH").unwrap_or_else(|_| "data/app.db".into())
}

async fn open_store(db_path: &str) -> storage::Store {
    // Ensure data dir exists when using default
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = std::fs::create_dir_all(parent);
    }
    match storage::Store::connect_sqlite(db_path).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, path=%db_path, "Failed to connect DB");
            std::process::exit(3);
        }
    }
}

#[tokio::main]
async fn main() {
    use clap::Parser;
    let args = cli::Cli::parse();

    // Console-only logging with env-driven level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(true)
        .init();

    if let Some(cli::Command::Promote { email, revoke }) = args.command {
        let store = open_store(&db_path()).await;
        let role = if revoke { Role::User } else { Role::Admin };
        match store.set_role_by_email(&email.trim().to_lowercase(), role).await {
            Ok(true) => tracing::info!(%email, %role, "role updated"),
            Ok(false) => {
                eprintln!("No account registered with email {email}");
                std::process::exit(2);
            }
            Err(e) => {
                tracing::error!(error=%e, "Failed to update role");
                std::process::exit(3);
            }
        }
        return;
    }

    let config = match server::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error=%e, "Failed to load config");
            std::process::exit(2);
        }
    };

    let store = open_store(&db_path()).await;

    // Seed the catalog and admin roles from config
    if let Err(e) = store.seed_catalog(&config.catalog).await {
        tracing::error!(error=%e, "Failed to seed DB");
        std::process::exit(4);
    }
    match store.promote_admins(&config.admin_emails).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(count = n, "admin roles granted from config"),
        Err(e) => {
            tracing::error!(error=%e, "Failed to apply admin emails");
            std::process::exit(4);
        }
    }

    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        tracing::error!(error=%e, dir=%config.upload_dir, "Failed to create upload dir");
        std::process::exit(2);
    }

    // Decide listen port: env PORT overrides config.listen_port, default 5151
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .or(config.listen_port)
        .unwrap_or(5151);

    let state = match server::AppState::new(config, store.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, "Invalid config");
            std::process::exit(2);
        }
    };
    let shutdown_token = state.shutdown_token();
    let shutdown_token_for_server = shutdown_token.clone();
    let purge = server::session::spawn_purge_task(store, shutdown_token.clone());

    let app = server::router(state);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error=%e, %addr, "Failed to bind listener");
            std::process::exit(5);
        }
    };

    // Graceful shutdown on SIGINT/SIGTERM with a fallback timeout for stuck connections
    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_token_for_server.cancelled_owned())
            .await
    });

    // Wait for OS signal; then trigger graceful, and if it hangs beyond timeout, force abort.
    shutdown_signal().await;
    tracing::info!("shutdown: initiating graceful stop");
    shutdown_token.cancel();
    match tokio::time::timeout(std::time::Duration::from_secs(3), &mut server_task).await {
        Ok(join_res) => match join_res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(%err, "server error"),
            Err(e) => tracing::error!(error=%e, "server task join error"),
        },
        Err(_) => {
            tracing::warn!("shutdown: forcing server abort due to timeout");
            server_task.abort();
        }
    }
    let _ = purge.await;
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) else {
            tracing::warn!("shutdown: unix signal handlers unavailable; using Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("shutdown: received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("shutdown: received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown: received Ctrl+C");
    }
}
