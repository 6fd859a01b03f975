use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use log::{error, info, warn};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;
use sha2::Sha256;

use crate::biometric::{
    BiometricPolicy, DirectoryTemplates, FaceTemplates, FaceVerifier, HttpFaceVerifier,
    UnavailableFaceVerifier, DEFAULT_FACE_THRESHOLD,
};
use crate::caster::VoteCaster;
use crate::integrity::{DisabledNotary, HttpNotary, Notary, VoteSealer, KEY_LEN};
use crate::model::{db::eligibility::EligibilityList, mongodb::ensure_indexes_exist};
use crate::store::{seed::Seed, MemoryStore, MongoStore};

/// Where votes, voters and eligibility lists live.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    /// Process-local and lost on restart. Development and tests only.
    Memory,
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    #[serde(default = "default_face_threshold")]
    face_threshold: f64,
    #[serde(default)]
    face_service_url: Option<String>,
    #[serde(default = "default_face_template_dir")]
    face_template_dir: PathBuf,
    #[serde(default)]
    notary_url: Option<String>,
    #[serde(default = "default_notary_timeout_ms")]
    notary_timeout_ms: u64,
    #[serde(default = "default_eligibility_lists")]
    eligibility_lists: Vec<EligibilityList>,
    #[serde(default)]
    store: StoreKind,
    #[serde(default)]
    memory_seed: Option<PathBuf>,
    #[serde(default = "default_face_ttl")]
    face_ttl: u32,
    // secrets
    jwt_secret: String,
    #[serde(default)]
    vote_key: Option<String>,
}

fn default_face_threshold() -> f64 {
    DEFAULT_FACE_THRESHOLD
}

fn default_face_template_dir() -> PathBuf {
    PathBuf::from("face_templates")
}

fn default_notary_timeout_ms() -> u64 {
    3000
}

fn default_face_ttl() -> u32 {
    300
}

fn default_eligibility_lists() -> Vec<EligibilityList> {
    EligibilityList::ALL.to_vec()
}

const SEALING_KEY_LABEL: &[u8] = b"vote-sealing-key";

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Maximum face distance that still counts as a match.
    pub fn face_threshold(&self) -> f64 {
        self.face_threshold
    }

    pub fn face_service_url(&self) -> Option<&str> {
        self.face_service_url.as_deref()
    }

    /// Root directory of stored face templates.
    pub fn face_template_dir(&self) -> &PathBuf {
        &self.face_template_dir
    }

    pub fn notary_url(&self) -> Option<&str> {
        self.notary_url.as_deref()
    }

    /// How long a cast waits for the notary before giving up on it.
    pub fn notary_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.notary_timeout_ms)
    }

    /// The eligibility lists consulted, in order.
    pub fn eligibility_lists(&self) -> &[EligibilityList] {
        &self.eligibility_lists
    }

    pub fn store(&self) -> StoreKind {
        self.store
    }

    /// JSON file the in-memory store is filled from at ignite.
    pub fn memory_seed(&self) -> Option<&Path> {
        self.memory_seed.as_deref()
    }

    /// How long a face check result stays usable for casting.
    pub fn face_ttl(&self) -> Duration {
        Duration::seconds(self.face_ttl.into())
    }

    /// The AES-256 key votes are sealed with.
    ///
    /// `vote_key` must be 32 bytes of base64 if set. Otherwise a key is
    /// derived from `jwt_secret`, which ties vote confidentiality to the
    /// token secret.
    pub fn sealing_key(&self) -> Result<[u8; KEY_LEN], String> {
        if let Some(encoded) = &self.vote_key {
            let bytes = BASE64
                .decode(encoded.trim().as_bytes())
                .map_err(|e| format!("`vote_key` is not valid base64: {e}"))?;
            return <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
                format!(
                    "`vote_key` must decode to {KEY_LEN} bytes, got {}",
                    bytes.len()
                )
            });
        }

        warn!("No `vote_key` configured, deriving the vote sealing key from `jwt_secret`. Do not run production elections like this");
        let mut mac = Hmac::<Sha256>::new_from_slice(self.jwt_secret())
            .map_err(|e| format!("Cannot derive sealing key: {e}"))?;
        mac.update(SEALING_KEY_LABEL);
        let mut key = [0; KEY_LEN];
        key.copy_from_slice(&mac.finalize().into_bytes());
        Ok(key)
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if !(0.0..=1.0).contains(&config.face_threshold) {
            error!(
                "`face_threshold` must lie in [0, 1], got {}",
                config.face_threshold
            );
            return Err(rocket);
        }
        info!(
            "Loaded config: store={:?}, eligibility lists={:?}",
            config.store, config.eligibility_lists
        );

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
///
/// Does nothing unless the configured store is MongoDB.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(app_config) = rocket.state::<Config>() else {
            error!("Database fairing attached before config fairing");
            return Err(rocket);
        };
        if app_config.store() != StoreKind::Mongo {
            return Ok(rocket);
        }

        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist. The unique vote index is what
        // makes double voting impossible, so failing here is fatal.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to create database indexes: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "votecast".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    crate::database()
}

/// A fairing that wires the configured stores and external services into a
/// [`VoteCaster`] and places it into managed state.
///
/// Must be attached after [`ConfigFairing`] and [`DatabaseFairing`].
pub struct CasterFairing;

#[rocket::async_trait]
impl Fairing for CasterFairing {
    fn info(&self) -> Info {
        Info {
            name: "Vote caster",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let rocket = prepare_memory_store(rocket).await?;
        let caster = match build_caster(&rocket) {
            Ok(caster) => caster,
            Err(e) => {
                error!("Failed to configure vote caster: {e}");
                return Err(rocket);
            }
        };
        info!(
            "Vote caster ready, face threshold {}",
            caster.policy.threshold()
        );
        Ok(rocket.manage(caster))
    }
}

/// Manage a [`MemoryStore`], seeded if configured, unless one is managed already.
async fn prepare_memory_store(rocket: Rocket<Build>) -> rocket::fairing::Result {
    let Some(config) = rocket.state::<Config>() else {
        return Ok(rocket);
    };
    if config.store() != StoreKind::Memory || rocket.state::<MemoryStore>().is_some() {
        return Ok(rocket);
    }
    let seed_path = config.memory_seed().map(Path::to_path_buf);

    let store = MemoryStore::default();
    match seed_path {
        Some(path) => {
            let loaded = match Seed::read(&path).await {
                Ok(seed) => store.load_seed(seed).await,
                Err(e) => Err(e),
            };
            match loaded {
                Ok(counts) => info!("Seeded in-memory store from {}: {counts}", path.display()),
                Err(e) => {
                    error!("Failed to seed in-memory store from {}: {e}", path.display());
                    return Err(rocket);
                }
            }
        }
        None => warn!("No `memory_seed` configured, the in-memory store starts empty"),
    }
    Ok(rocket.manage(store))
}

fn build_caster(rocket: &Rocket<Build>) -> Result<VoteCaster, String> {
    let config = rocket
        .state::<Config>()
        .ok_or("caster fairing attached before config fairing")?;

    let sealer = VoteSealer::new(&config.sealing_key()?).map_err(|e| e.to_string())?;

    let template_dir = config.face_template_dir();
    if !template_dir.is_dir() {
        warn!(
            "Face template directory {} does not exist, every voter will lack a face template",
            template_dir.display()
        );
    }
    let templates: Arc<dyn FaceTemplates> = Arc::new(DirectoryTemplates::new(template_dir.clone()));

    let verifier: Arc<dyn FaceVerifier> = match config.face_service_url() {
        Some(url) => Arc::new(
            HttpFaceVerifier::new(url.to_string(), StdDuration::from_secs(10))
                .map_err(|e| format!("Cannot build face service client: {e}"))?,
        ),
        None => {
            warn!("No `face_service_url` configured, face checks are unavailable");
            Arc::new(UnavailableFaceVerifier)
        }
    };

    let notary: Arc<dyn Notary> = match config.notary_url() {
        Some(url) => Arc::new(
            HttpNotary::new(url.to_string(), config.notary_timeout())
                .map_err(|e| format!("Cannot build notary client: {e}"))?,
        ),
        None => {
            info!("No `notary_url` configured, votes will not be notarised");
            Arc::new(DisabledNotary)
        }
    };

    let lists = config.eligibility_lists();
    let caster = match config.store() {
        StoreKind::Mongo => {
            let client = rocket
                .state::<MongoClient>()
                .ok_or("MongoDB client not managed")?;
            let db = rocket
                .state::<Database>()
                .ok_or("MongoDB database not managed")?;
            let store = MongoStore::new(client.clone(), db.clone());
            VoteCaster {
                registry: Arc::new(store.clone()),
                eligibility: store.eligibility(lists),
                ledger: Arc::new(store),
                templates,
                verifier,
                policy: BiometricPolicy::new(config.face_threshold()),
                sealer,
                notary,
                notary_timeout: config.notary_timeout(),
            }
        }
        StoreKind::Memory => {
            warn!("Using the in-memory store, all votes are lost on shutdown");
            let store = rocket
                .state::<MemoryStore>()
                .cloned()
                .ok_or("in-memory store not managed")?;
            VoteCaster {
                registry: Arc::new(store.clone()),
                eligibility: store.eligibility(lists),
                ledger: Arc::new(store),
                templates,
                verifier,
                policy: BiometricPolicy::new(config.face_threshold()),
                sealer,
                notary,
                notary_timeout: config.notary_timeout(),
            }
        }
    };
    Ok(caster)
}
