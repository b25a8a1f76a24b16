use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runway::config::Config;
use runway::db::{create_pool, init_db, queries, AppState};
use runway::handlers;
use runway::models::{AccountRole, CreateFeedback, FeedbackLabel, Signup};
use runway::outbox::spawn_outbox_worker;
use runway::payments::{StripeClient, StripeConfig};

#[derive(Parser, Debug)]
#[command(name = "runway")]
#[command(about = "Multi-tenant SaaS backend with Stripe subscription billing")]
struct Cli {
    /// Seed the database with dev data (admin, demo user, org, feedback)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn bootstrap_admin(state: &AppState, email: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_admins(&conn).expect("Failed to count admins");
    if count > 0 {
        tracing::info!("Admins already exist, skipping bootstrap");
        return;
    }

    let input = Signup {
        email: email.to_string(),
        name: "Bootstrap Admin".to_string(),
    };
    let (account, token) = queries::create_account(&conn, &input, AccountRole::SuperAdmin)
        .expect("Failed to create bootstrap admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Email: {}", account.email);
    tracing::info!("Token: {}", token);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS TOKEN - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds the database with dev data for local testing.
/// Creates: super admin, demo user, demo org, and a couple of feedback rows.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let mut conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_accounts(&conn).expect("Failed to count accounts");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let admin_input = Signup {
        email: "admin@runway.local".to_string(),
        name: "Dev Admin".to_string(),
    };
    let (_, admin_token) = queries::create_account(&conn, &admin_input, AccountRole::SuperAdmin)
        .expect("Failed to create dev admin");

    let user_input = Signup {
        email: "demo@runway.local".to_string(),
        name: "Demo User".to_string(),
    };
    let (user, user_token) = queries::create_account(&conn, &user_input, AccountRole::User)
        .expect("Failed to create demo user");

    let org = queries::create_organization_with_owner(
        &mut conn,
        "Demo Org",
        "demo@runway.local",
        &user.id,
    )
    .expect("Failed to create demo org");

    for (title, message, label) in [
        (
            "Dark mode please",
            "The dashboard is blinding at night, a dark theme would help a lot.",
            FeedbackLabel::FeatureRequest,
        ),
        (
            "Billing page slow",
            "The billing page takes several seconds to load the invoice list.",
            FeedbackLabel::Issue,
        ),
    ] {
        queries::create_feedback(
            &conn,
            &user.id,
            &CreateFeedback {
                title: title.to_string(),
                message: message.to_string(),
                label,
            },
        )
        .expect("Failed to create dev feedback");
    }

    tracing::info!("Admin token: {}", admin_token);
    tracing::info!("Demo user token: {}", user_token);
    tracing::info!("Demo org: {}", org.id);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set - webhook deliveries will be rejected");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let stripe = StripeClient::new(&StripeConfig {
        secret_key: config.stripe_secret_key.clone(),
        webhook_secret: config.stripe_webhook_secret.clone(),
        api_base: config.stripe_api_base.clone(),
    });

    let state = AppState {
        db: db_pool,
        stripe: Arc::new(stripe),
        base_url: config.base_url.clone(),
        outbox: Arc::new(tokio::sync::Notify::new()),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set RUNWAY_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Bootstrap first admin if configured (fallback for non-seed usage)
    if let Some(ref email) = config.bootstrap_admin_email {
        bootstrap_admin(&state, email);
    }

    // Start the outbox worker; it also drains events left over from a
    // previous run on its first pass.
    let _outbox_worker =
        spawn_outbox_worker(state.clone(), Duration::from_secs(config.outbox_poll_secs));

    // Build the application router
    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router())
        // Webhook endpoint (signature auth)
        .merge(handlers::webhooks::router())
        // Authenticated app surface
        .merge(handlers::account::router(state.clone()))
        .merge(handlers::feedback::router(state.clone()))
        .merge(handlers::orgs::router(state.clone()))
        .merge(handlers::billing::router(state.clone()))
        // Admin API (admin role auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Runway server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
