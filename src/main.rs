use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use finance_tracker::data::memory::InMemoryEntryRepository;
use finance_tracker::data::mongo::{MongoEntryRepository, MongoUserRepository};
use finance_tracker::data::user_repository::InMemoryUserRepository;
use finance_tracker::domain::entry::EntryKind;
use finance_tracker::domain::repository::{EntryRepository, UserRepository};
use finance_tracker::infrastructure::config::{Settings, StorageBackend};
use finance_tracker::infrastructure::database;
use finance_tracker::infrastructure::logging::init_logging;
use finance_tracker::presentation::handlers::AppState;
use finance_tracker::presentation::middleware::RequestTracing;
use finance_tracker::presentation::routes::{self, ROUTES};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};

type Repositories = (
    Arc<dyn UserRepository>,
    Arc<dyn EntryRepository>,
    Arc<dyn EntryRepository>,
);

async fn build_repositories(settings: &Settings) -> io::Result<Repositories> {
    match settings.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryEntryRepository::new()),
                Arc::new(InMemoryEntryRepository::new()),
            ))
        }
        StorageBackend::Mongo => {
            let uri = settings
                .database_url
                .as_deref()
                .ok_or_else(|| io::Error::other("DB_URL must be set"))?;
            info!(database = %settings.database_name, "Connecting to MongoDB");
            let db = database::connect(uri, &settings.database_name)
                .await
                .map_err(io::Error::other)?;

            let users = MongoUserRepository::new(&db);
            if let Err(e) = users.ensure_indexes().await {
                error!(error = %e, "Failed to create user indexes");
            }
            Ok((
                Arc::new(users),
                Arc::new(MongoEntryRepository::new(&db, EntryKind::Income)),
                Arc::new(MongoEntryRepository::new(&db, EntryKind::Expense)),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_logging();
    info!("Logging initialized");

    let settings = Settings::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        io::Error::other(e)
    })?;
    info!(storage = ?settings.storage, "Configuration loaded");

    let (users, incomes, expenses) = build_repositories(&settings).await?;
    let state = web::Data::new(AppState::new(
        users,
        incomes,
        expenses,
        settings.jwt_secret.clone(),
    ));
    info!("Application state initialized");

    let server = HttpServer::new(move || {
        // Browser clients need the session cookie sent cross-origin.
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(state.clone())
            .wrap(RequestTracing)
            .wrap(cors)
            .configure(routes::configure)
    });

    let bind_addr = settings.bind_address();
    let server = server.bind(&bind_addr)?;
    info!(address = %bind_addr, routes = %ROUTES, "Server is running");
    server.run().await
}
