//! Application state shared by every API handler.
//!
//! Collaborators are injected as trait objects so tests can assemble an
//! isolated state with in-memory stores and a mock generation client.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::opd::OpdSlipGenerator;
use crate::pipeline::drafts::DraftService;
use crate::pipeline::generation::{GenerationClient, GenerationError, OllamaClient};
use crate::registry::{InMemoryPatientRegistry, PatientRepository};
use crate::store::{InMemoryRecordStore, PersistenceError, RecordStore, SqliteRecordStore};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Record store error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Generation client error: {0}")]
    Generation(#[from] GenerationError),
}

pub struct CoreState {
    pub config: AppConfig,
    pub registry: Arc<dyn PatientRepository>,
    pub records: Arc<dyn RecordStore>,
    pub drafts: DraftService,
    pub opd: OpdSlipGenerator,
    started_at: Instant,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        registry: Arc<dyn PatientRepository>,
        records: Arc<dyn RecordStore>,
        generation: Arc<dyn GenerationClient>,
    ) -> Self {
        let drafts = DraftService::new(generation, &config.model);
        let opd = OpdSlipGenerator::new(config.department.clone(), config.token_strategy);
        seed_token_ledger(&opd, records.as_ref());
        Self {
            config,
            registry,
            records,
            drafts,
            opd,
            started_at: Instant::now(),
        }
    }

    /// Wire production collaborators from configuration.
    ///
    /// Builds a blocking HTTP client, so call it outside async tasks.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let registry = Arc::new(InMemoryPatientRegistry::with_policies(
            config.duplicate_ids,
            config.unknown_patient_notes,
        ));

        let records: Arc<dyn RecordStore> = match &config.db_path {
            Some(path) => Arc::new(SqliteRecordStore::open(path)?),
            None => {
                tracing::warn!("No database path configured, records kept in memory");
                Arc::new(InMemoryRecordStore::new())
            }
        };

        let generation = Arc::new(OllamaClient::new(
            &config.ollama_url,
            config.generation_timeout_secs,
        )?);

        tracing::info!(
            ollama_url = %config.ollama_url,
            model = %config.model,
            record_store = records.backend(),
            "Core state initialized"
        );

        Ok(Self::new(config, registry, records, generation))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Reload today's stored tokens so a restart neither restarts the sequence
/// nor reissues a token already handed out.
fn seed_token_ledger(opd: &OpdSlipGenerator, records: &dyn RecordStore) {
    let today = Utc::now().date_naive();
    let tokens = match records.opd_tokens_for_day(today) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load today's OPD tokens");
            return;
        }
    };
    match opd.seed_day(today, tokens) {
        Ok(seeded) => tracing::info!(seeded, day = %today, "OPD token ledger seeded"),
        Err(e) => tracing::warn!(error = %e, "Could not seed OPD token ledger"),
    }
}
