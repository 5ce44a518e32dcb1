//! OPD slip generation.
//!
//! A slip snapshots the patient's identity at generation time and carries a
//! queue token `OPD-YYYYMMDD-NNNNNN` stamped with the current UTC date.
//! No referential check is made against the registry: slips may be issued
//! for walk-ins that were never registered.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{random_base36, random_digits};
use crate::models::{OpdSlip, PatientSnapshot};

pub const DEFAULT_DEPARTMENT: &str = "General Medicine";

/// Number of digits in the per-day token counter.
const TOKEN_DIGITS: usize = 6;
const MAX_SEQUENCE: u32 = 999_999;
const SLIP_ID_SUFFIX_LEN: usize = 6;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OpdError {
    #[error("No free OPD token for {date} after {attempts} attempts")]
    TokensExhausted { date: String, attempts: u32 },

    #[error("OPD token state lock poisoned")]
    LockPoisoned,
}

/// How the numeric part of a token is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum TokenStrategy {
    /// Six random digits. Collisions within a day are possible.
    #[default]
    Random,
    /// Random digits, retried until unused today.
    UniqueRandom { max_attempts: u32 },
    /// Monotonic counter starting at 000001, reset each UTC day.
    Sequence,
}

impl FromStr for TokenStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "unique" | "unique_random" => Ok(Self::UniqueRandom { max_attempts: 32 }),
            "sequence" => Ok(Self::Sequence),
            other => Err(format!("unknown token strategy: {other}")),
        }
    }
}

/// Tokens issued on the current UTC day.
#[derive(Debug, Default)]
struct TokenLedger {
    day: Option<NaiveDate>,
    issued: HashSet<String>,
    sequence: u32,
}

impl TokenLedger {
    fn roll_to(&mut self, day: NaiveDate) {
        if self.day != Some(day) {
            self.day = Some(day);
            self.issued.clear();
            self.sequence = 0;
        }
    }
}

pub struct OpdSlipGenerator {
    department: String,
    strategy: TokenStrategy,
    ledger: Mutex<TokenLedger>,
}

impl OpdSlipGenerator {
    pub fn new(department: impl Into<String>, strategy: TokenStrategy) -> Self {
        Self {
            department: department.into(),
            strategy,
            ledger: Mutex::new(TokenLedger::default()),
        }
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn strategy(&self) -> TokenStrategy {
        self.strategy
    }

    /// Mark tokens already issued on `day` (e.g. read back from the record
    /// store at startup) so the ledger does not hand them out again.
    ///
    /// Tokens for other days are ignored. Returns how many were taken.
    pub fn seed_day(
        &self,
        day: NaiveDate,
        tokens: impl IntoIterator<Item = String>,
    ) -> Result<usize, OpdError> {
        let prefix = token_prefix(day);
        let mut ledger = self.ledger.lock().map_err(|_| OpdError::LockPoisoned)?;
        ledger.roll_to(day);

        let mut seeded = 0;
        for token in tokens {
            let Some(counter) = token.strip_prefix(&prefix) else {
                continue;
            };
            if let Ok(n) = counter.parse::<u32>() {
                ledger.sequence = ledger.sequence.max(n);
            }
            if ledger.issued.insert(token) {
                seeded += 1;
            }
        }
        Ok(seeded)
    }

    /// Build a slip for `patient` stamped with the current time.
    pub fn generate(
        &self,
        patient: &PatientSnapshot,
        doctor_name: Option<&str>,
    ) -> Result<OpdSlip, OpdError> {
        self.generate_at(patient, doctor_name, Utc::now())
    }

    pub fn generate_at(
        &self,
        patient: &PatientSnapshot,
        doctor_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OpdSlip, OpdError> {
        let token_number = self.next_token(now)?;
        let slip = OpdSlip {
            id: format!(
                "opdslip-{}-{}",
                now.timestamp_millis(),
                random_base36(SLIP_ID_SUFFIX_LEN)
            ),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            patient_age: patient.age,
            patient_gender: patient.gender,
            token_number,
            slip_date: now,
            department: self.department.clone(),
            doctor_name: doctor_name
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        tracing::info!(
            slip_id = %slip.id,
            patient_id = %slip.patient_id,
            token = %slip.token_number,
            "OPD slip generated"
        );
        Ok(slip)
    }

    fn next_token(&self, now: DateTime<Utc>) -> Result<String, OpdError> {
        let day = now.date_naive();
        let prefix = token_prefix(day);

        match self.strategy {
            TokenStrategy::Random => Ok(format!("{prefix}{}", random_digits(TOKEN_DIGITS))),
            TokenStrategy::UniqueRandom { max_attempts } => {
                let mut ledger = self.ledger.lock().map_err(|_| OpdError::LockPoisoned)?;
                ledger.roll_to(day);
                for _ in 0..max_attempts.max(1) {
                    let token = format!("{prefix}{}", random_digits(TOKEN_DIGITS));
                    if ledger.issued.insert(token.clone()) {
                        return Ok(token);
                    }
                }
                Err(OpdError::TokensExhausted {
                    date: day.to_string(),
                    attempts: max_attempts,
                })
            }
            TokenStrategy::Sequence => {
                let mut ledger = self.ledger.lock().map_err(|_| OpdError::LockPoisoned)?;
                ledger.roll_to(day);
                if ledger.sequence >= MAX_SEQUENCE {
                    return Err(OpdError::TokensExhausted {
                        date: day.to_string(),
                        attempts: MAX_SEQUENCE,
                    });
                }
                ledger.sequence += 1;
                Ok(format!("{prefix}{:0width$}", ledger.sequence, width = TOKEN_DIGITS))
            }
        }
    }
}

/// `OPD-YYYYMMDD-` for the given UTC day.
pub fn token_prefix(day: NaiveDate) -> String {
    format!("OPD-{}-", day.format("%Y%m%d"))
}

impl Default for OpdSlipGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_DEPARTMENT, TokenStrategy::default())
    }
}
