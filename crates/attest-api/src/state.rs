//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Every field is a cheap handle over shared
//! stores, so cloning the state per request is free.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use attest_batch::{
    BatchConfig, BatchIssuanceEngine, FileJobStore, JobStore, JobStoreError, MemoryJobStore,
    MAX_JOB_RETENTION,
};
use attest_crypto::MemoryKeyStore;
use attest_did::{DidRegistry, DidResolver};
use attest_schema::{SchemaError, SchemaRegistry};
use attest_vc::{CredentialChecks, CredentialSigner, CredentialStore, PresentationEngine, StatusLedger};
use attest_workflow::{SubmissionVerifier, VerificationWorkflow};
use thiserror::Error;

// -- Configuration ------------------------------------------------------------

/// Server configuration, read once at startup.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Pause between batch items.
    pub batch_item_delay: Duration,
    /// Directory for persisted batch jobs. In-memory when `None`.
    pub job_store_dir: Option<PathBuf>,
    /// Completed batch jobs older than this are evicted.
    pub job_retention: Duration,
    /// Directory of credential schemas loaded at startup.
    pub schema_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("batch_item_delay", &self.batch_item_delay)
            .field("job_store_dir", &self.job_store_dir)
            .field("job_retention", &self.job_retention)
            .field("schema_dir", &self.schema_dir)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let batch = BatchConfig::default();
        Self {
            port: 8080,
            auth_token: None,
            batch_item_delay: batch.item_delay,
            job_store_dir: None,
            job_retention: batch.retention,
            schema_dir: None,
        }
    }
}

/// A configuration variable was present but unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unset variables take their
    /// defaults; set but malformed variables are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(v) => parse_var("PORT", &v)?,
            None => defaults.port,
        };
        let batch_item_delay = match non_empty("ATTEST_BATCH_ITEM_DELAY_MS") {
            Some(v) => Duration::from_millis(parse_var("ATTEST_BATCH_ITEM_DELAY_MS", &v)?),
            None => defaults.batch_item_delay,
        };
        let job_retention = match non_empty("ATTEST_JOB_RETENTION_SECS") {
            Some(v) => {
                let retention = Duration::from_secs(parse_var("ATTEST_JOB_RETENTION_SECS", &v)?);
                if retention > MAX_JOB_RETENTION {
                    return Err(ConfigError {
                        var: "ATTEST_JOB_RETENTION_SECS",
                        reason: format!("must not exceed {} seconds", MAX_JOB_RETENTION.as_secs()),
                    });
                }
                retention
            }
            None => defaults.job_retention,
        };

        Ok(Self {
            port,
            auth_token: non_empty("AUTH_TOKEN"),
            batch_item_delay,
            job_store_dir: non_empty("ATTEST_JOB_STORE_DIR").map(PathBuf::from),
            job_retention,
            schema_dir: non_empty("ATTEST_SCHEMA_DIR").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: e.to_string(),
    })
}

// -- Application State --------------------------------------------------------

/// Startup failure while assembling [`AppState`].
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to open job store: {0}")]
    JobStore(#[from] JobStoreError),

    #[error("failed to load credential schemas: {0}")]
    Schemas(#[from] SchemaError),
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dids: DidRegistry,
    pub schemas: SchemaRegistry,
    pub credentials: CredentialStore,
    pub ledger: StatusLedger,
    pub signer: CredentialSigner,
    pub presentations: PresentationEngine,
    pub checks: CredentialChecks,
    pub batches: BatchIssuanceEngine,
    pub workflow: VerificationWorkflow,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::assemble(AppConfig::default(), Arc::new(MemoryJobStore::new()))
    }

    /// Build state from `config`, opening the durable job store and
    /// loading schemas when configured.
    pub fn try_with_config(config: AppConfig) -> Result<Self, StateError> {
        let jobs: Arc<dyn JobStore> = match &config.job_store_dir {
            Some(dir) => Arc::new(FileJobStore::open(dir)?),
            None => Arc::new(MemoryJobStore::new()),
        };
        let state = Self::assemble(config, jobs);
        if let Some(dir) = &state.config.schema_dir {
            let loaded = state.schemas.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), loaded, "credential schemas loaded");
        }
        Ok(state)
    }

    fn assemble(config: AppConfig, jobs: Arc<dyn JobStore>) -> Self {
        let dids = DidRegistry::new(Arc::new(MemoryKeyStore::new()));
        let resolver: Arc<dyn DidResolver> = Arc::new(dids.clone());
        let schemas = SchemaRegistry::new();
        let credentials = CredentialStore::new();
        let ledger = StatusLedger::new();

        let signer = CredentialSigner::new(dids.key_store(), Arc::clone(&resolver));
        let presentations = PresentationEngine::new(dids.key_store(), resolver);
        let checks = CredentialChecks::new(signer.clone(), ledger.clone());
        let batches = BatchIssuanceEngine::new(
            signer.clone(),
            Arc::new(schemas.clone()),
            Arc::new(credentials.clone()),
            jobs,
            BatchConfig {
                item_delay: config.batch_item_delay,
                retention: config.job_retention,
                ..BatchConfig::default()
            },
        );
        let workflow = VerificationWorkflow::new(SubmissionVerifier::new(
            presentations.clone(),
            checks.clone(),
        ));

        Self {
            config,
            dids,
            schemas,
            credentials,
            ledger,
            signer,
            presentations,
            checks,
            batches,
            workflow,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
