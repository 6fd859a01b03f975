#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

pub mod api;
pub mod biometric;
pub mod caster;
pub mod config;
pub mod error;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod store;

use caster::VoteCaster;
use config::{CasterFairing, ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// The full server, configured from `Rocket.toml` and the environment.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(CasterFairing)
}

/// A server around an already assembled caster. No database is opened.
pub fn rocket_for_caster(figment: Figment, caster: VoteCaster) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .manage(caster)
}

/// A client for the test database, if one is configured via `db_uri`.
#[cfg(test)]
pub(crate) async fn db_client() -> Option<mongodb::Client> {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .ok()?;
    mongodb::Client::with_uri_str(&db_uri).await.ok()
}

/// Use a random database name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    log::info!("Using database {db}");
    db
}
