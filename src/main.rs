use std::str::FromStr;
use std::sync::Arc;

use cron::Schedule;
use library_lending::{
    adapters::mock::LoggingMailer,
    adapters::postgres::{PgLoanStore, PgMemberDirectory},
    api::{handlers::AppState, router::create_router},
    application::loan::ServiceDependencies,
    notify::{DEFAULT_QUEUE_CAPACITY, NotificationDispatcher, notification_channel},
    scheduler::{DEFAULT_SCAN_SCHEDULE, run_scan_loop},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_lending=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection URL
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/library".into());

    tracing::info!("Database URL: {}", database_url);

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Initialize adapters
    let loan_store = Arc::new(PgLoanStore::new(pool.clone()));
    let member_directory = Arc::new(PgMemberDirectory::new(pool.clone()));
    // The real mail transport is an external collaborator; deliveries are logged
    let mailer = Arc::new(LoggingMailer::new());

    // Notification dispatch runs out-of-band from request handling
    let (notifier, rx) = notification_channel(DEFAULT_QUEUE_CAPACITY);
    let dispatcher = NotificationDispatcher::new(rx, loan_store.clone(), mailer);
    tokio::spawn(dispatcher.run());

    // Create service dependencies
    let service_deps = ServiceDependencies {
        loan_store,
        member_directory,
        notifier,
    };

    // Overdue scan schedule (daily at 00:00 UTC unless overridden)
    let schedule_expr =
        std::env::var("OVERDUE_SCAN_SCHEDULE").unwrap_or_else(|_| DEFAULT_SCAN_SCHEDULE.into());
    let schedule = Schedule::from_str(&schedule_expr).expect("Invalid OVERDUE_SCAN_SCHEDULE");
    tracing::info!("Overdue scan schedule: {}", schedule_expr);
    tokio::spawn(run_scan_loop(service_deps.clone(), schedule));

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
