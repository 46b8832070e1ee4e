use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vendorhub::clock::{Clock, SystemClock};
use vendorhub::config::ServerConfig;
use vendorhub::db::schema::ensure_schema;
use vendorhub::mail::senders::{LogEmailSender, RelayEmailSender};
use vendorhub::mail::EmailSender;
use vendorhub::reminders::{Color, MailSettings, ReminderService, ReminderSettings};
use vendorhub::web::create_axum_router;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and run the scheduled reminder check
    Serve,
    /// Check services once and send reminder emails
    CheckReminders {
        /// Number of days ahead to check
        #[arg(long, default_value_t = 15)]
        days: u32,
    },
    /// Print how many services fall into each status color
    ColorReport,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "vendorhub.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

fn build_sender(config: &ServerConfig) -> Arc<dyn EmailSender> {
    match &config.mail_relay_url {
        Some(url) => {
            info!(relay_url = %url, "Delivering reminder emails through the HTTP relay.");
            Arc::new(RelayEmailSender::new(url.clone(), config.mail_relay_token.clone()))
        }
        None => {
            info!("No mail relay configured. Reminder emails will be written to the log.");
            Arc::new(LogEmailSender::new())
        }
    }
}

fn build_reminder_service(
    db_pool: &Arc<DatabaseConnection>,
    config: &ServerConfig,
) -> Arc<ReminderService> {
    let settings = ReminderSettings {
        mail: MailSettings {
            from_email: config.from_email.clone(),
            admin_email: config.admin_email.clone(),
        },
        horizon_days: config.reminder_days,
    };
    Arc::new(ReminderService::new(
        db_pool.clone(),
        build_sender(config),
        settings,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
    }
    info!("Shutdown signal received.");
}

async fn serve(
    db_pool: Arc<DatabaseConnection>,
    config: Arc<ServerConfig>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    ensure_schema(&db_pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reminder_service = build_reminder_service(&db_pool, &config);

    // --- Scheduled Reminder Check ---
    if config.reminder_check_interval_hours > 0 {
        let period = Duration::from_secs(config.reminder_check_interval_hours * 3600);
        tokio::spawn(reminder_service.clone().start_periodic_check(clock.clone(), period));
    } else {
        info!("Scheduled reminder check is disabled.");
    }

    // --- HTTP Server ---
    let app = create_axum_router(db_pool, reminder_service, clock, config.clone());
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "HTTP server listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped.");
    Ok(())
}

async fn check_reminders(
    db_pool: Arc<DatabaseConnection>,
    config: Arc<ServerConfig>,
    days: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let reminder_service = build_reminder_service(&db_pool, &config);
    let today = SystemClock.today();

    println!("Checking services for reminders (next {days} days)...");
    let summary = reminder_service.check_and_send_reminders(today, days).await?;
    println!();
    println!("Reminder check completed:");
    println!("  - Total services flagged: {}", summary.total_flagged);
    println!("  - Services expiring soon: {}", summary.expiring_count);
    println!("  - Services with payment due: {}", summary.payment_due_count);
    println!("  - Emails sent: {}", summary.emails_sent);
    println!("  - Emails failed: {}", summary.emails_failed);
    Ok(())
}

async fn color_report(
    db_pool: Arc<DatabaseConnection>,
    config: Arc<ServerConfig>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let reminder_service = build_reminder_service(&db_pool, &config);
    let groups = reminder_service
        .get_services_with_color_codes(SystemClock.today())
        .await?;

    println!("Services by status color (next {} days):", config.reminder_days);
    for color in Color::ALL {
        let count = groups.get(&color).map_or(0, Vec::len);
        println!("  - {}: {}", color.as_str(), count);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = Arc::new(ServerConfig::load(args.config.as_deref())?);

    init_logging(&server_config.log_dir);
    info!(version = VERSION, "Starting vendorhub.");

    // --- Database Pool Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.to_owned());
    opt.max_connections(10).sqlx_logging(false);
    let db_pool: Arc<DatabaseConnection> = match Database::connect(opt).await {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(error = %e, "Failed to create database connection.");
            return Err(e.into());
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db_pool, server_config).await,
        Command::CheckReminders { days } => check_reminders(db_pool, server_config, days).await,
        Command::ColorReport => color_report(db_pool, server_config).await,
    }
}
