use tokio::net::TcpListener;

use memberdir::config::Config;
use memberdir::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memberdir=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = memberdir::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    match memberdir::db::members::count_members(&db).await {
        Ok(count) => tracing::info!("{count} member(s) in store"),
        Err(e) => tracing::warn!("failed to count members: {:?}", e),
    }

    let app = memberdir::routes::router(AppState { db });

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mmemberdir\x1b[0m \x1b[2mv{version} ({})\x1b[0m", env!("GIT_SHA"));
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2mapi\x1b[0m          /api/members");
    eprintln!();
}
