use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use chronos::config::{get_parsed_variable, get_parsed_variable_or, get_variable};
use chronos::db::PgDb;
use chronos::environment::{Config, Environment};
use chronos::routes;
use chronos::selector::DailySelector;
use log::{info, initialize_logger};

/// How long a selection is reused before the database is asked again.
const DEFAULT_SELECTION_TTL_SECONDS: u32 = 60 * 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_parsed_variable("CHRONOS_PORT");
    let admin_port: u16 = get_parsed_variable("CHRONOS_ADMIN_PORT");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let config = Config::new(
        get_parsed_variable_or("CHRONOS_UTC_OFFSET_MINUTES", 0),
        get_parsed_variable_or("CHRONOS_SELECTION_TTL_SECONDS", DEFAULT_SELECTION_TTL_SECONDS),
    )?;

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("CHRONOS_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from CHRONOS_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let selector = Arc::new(DailySelector::new(
        logger.clone(),
        db,
        config.utc_offset(),
        config.selection_ttl(),
    ));
    info!(logger, "Selecting events"; "utc_offset_seconds" => config.utc_offset().as_seconds(), "ttl_seconds" => config.selection_ttl().whole_seconds());

    let environment = Environment::new(logger.clone(), selector, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // a closed channel means shutdown is already under way
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::make_main_routes(environment.clone());

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone())
            .or(routes::admin::make_refresh_route(environment.clone()))
            .or(routes::admin::make_termination_route(environment.clone(), terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
