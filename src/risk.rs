// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Offline Risk Engine

//! Offline Risk Engine
//!
//! Every scenario id owns a pool of single-use offline tokens and a
//! cumulative spend ledger. A transaction is authorized only when:
//!
//! ```text
//! an unused, unexpired token exists   AND   cumulative + amount <= limit
//! ```
//!
//! The token scan runs first. An exhausted pool therefore reports
//! exhaustion even when the limit would also have been breached, and a
//! limit breach never consumes a token.
//!
//! Pools are created lazily on first use and live until [`RiskEngine::clear`]
//! or [`RiskEngine::remove`]; repeated runs of one scenario id draw down the
//! same budget.

use std::cell::Cell;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::prng::fnv1a_32;
use crate::scenario::Scenario;

const MS_PER_DAY: f64 = 86_400_000.0;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why an offline transaction was refused. These are business outcomes
/// counted by the simulation, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RiskRejection {
    #[error("no unused, unexpired offline token left")]
    TokensExhausted,

    #[error("cumulative offline limit reached: {cumulative} + {amount} > {limit}")]
    CumulativeLimit {
        cumulative: Decimal,
        amount: Decimal,
        limit: Decimal,
    },
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for token expiry.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { now: Cell::new(at) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Token / TokenPool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn is_spendable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Outcome counters for one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub accepted: u64,
    pub exhausted: u64,
    pub limit_breached: u64,
}

/// `now + days`, saturating at the representable range. Unvalidated configs
/// (negative, NaN or huge windows) must not panic here.
fn expiry_after(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    // `as` saturates and maps NaN to 0.
    let ms = ((days * MS_PER_DAY) as i64).max(0);
    Duration::try_milliseconds(ms)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPool {
    tokens: Vec<Token>,
    cumulative: Decimal,
    limit: Decimal,
    created_at: DateTime<Utc>,
    stats: PoolStats,
    /// Every token before this index is used.
    first_unused: usize,
}

impl TokenPool {
    /// Mint a fresh pool. Expiry jitter and token ids come from a ChaCha8
    /// stream keyed by the scenario id, never from the simulation's PRNG.
    pub fn mint(scenario_id: &str, config: &RiskConfig, now: DateTime<Utc>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(fnv1a_32(scenario_id)));
        let tokens = (0..config.pool_size)
            .map(|i| {
                let (min, max) = (config.expiry_min_days, config.expiry_max_days);
                let days = if min < max { rng.gen_range(min..max) } else { min };
                Token {
                    id: format!("TKN-{:03}-{:08x}", i, rng.gen::<u32>()),
                    used: false,
                    expires_at: expiry_after(now, days),
                }
            })
            .collect();

        Self {
            tokens,
            cumulative: Decimal::ZERO,
            limit: config.cumulative_limit,
            created_at: now,
            stats: PoolStats::default(),
            first_unused: 0,
        }
    }

    /// Run the two gates in order and, on success, consume one token.
    pub fn authorize(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<&Token, RiskRejection> {
        let amount = amount.max(Decimal::ZERO);

        let Some(offset) = self.tokens[self.first_unused..]
            .iter()
            .position(|t| t.is_spendable(now))
        else {
            self.stats.exhausted += 1;
            return Err(RiskRejection::TokensExhausted);
        };
        let index = self.first_unused + offset;

        if self.cumulative + amount > self.limit {
            self.stats.limit_breached += 1;
            return Err(RiskRejection::CumulativeLimit {
                cumulative: self.cumulative,
                amount,
                limit: self.limit,
            });
        }

        self.tokens[index].used = true;
        self.cumulative += amount;
        self.stats.accepted += 1;
        while self.first_unused < self.tokens.len() && self.tokens[self.first_unused].used {
            self.first_unused += 1;
        }
        Ok(&self.tokens[index])
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn cumulative(&self) -> Decimal {
        self.cumulative
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn used_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.used).count()
    }

    pub fn spendable_count(&self, now: DateTime<Utc>) -> usize {
        self.tokens.iter().filter(|t| t.is_spendable(now)).count()
    }
}

/// Read-only view of a pool for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub scenario_id: String,
    pub total_tokens: usize,
    pub used_tokens: usize,
    pub spendable_tokens: usize,
    pub cumulative: Decimal,
    pub limit: Decimal,
    pub stats: PoolStats,
}

// ---------------------------------------------------------------------------
// RiskEngine
// ---------------------------------------------------------------------------

/// Store of token pools keyed by scenario id.
#[derive(Debug)]
pub struct RiskEngine<C: Clock = SystemClock> {
    config: RiskConfig,
    clock: C,
    pools: HashMap<String, TokenPool>,
}

impl RiskEngine<SystemClock> {
    pub fn new(config: RiskConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for RiskEngine<SystemClock> {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl<C: Clock> RiskEngine<C> {
    pub fn with_clock(config: RiskConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            pools: HashMap::new(),
        }
    }

    /// Gate one transaction for `scenario`. Returns whether it was accepted.
    pub fn check(&mut self, scenario: &Scenario, amount: Decimal) -> bool {
        self.authorize(&scenario.id, amount).is_ok()
    }

    /// Same as [`check`](Self::check) but reports the rejection reason.
    pub fn authorize(&mut self, scenario_id: &str, amount: Decimal) -> Result<(), RiskRejection> {
        let now = self.clock.now();
        let config = &self.config;
        let pool = self.pools.entry(scenario_id.to_string()).or_insert_with(|| {
            tracing::debug!(
                scenario = scenario_id,
                tokens = config.pool_size,
                limit = %config.cumulative_limit,
                "minted offline token pool"
            );
            TokenPool::mint(scenario_id, config, now)
        });

        match pool.authorize(amount, now) {
            Ok(token) => {
                tracing::trace!(scenario = scenario_id, token = %token.id, %amount, "offline token consumed");
                Ok(())
            }
            Err(rejection) => {
                tracing::debug!(scenario = scenario_id, %rejection, "offline transaction rejected");
                Err(rejection)
            }
        }
    }

    pub fn pool(&self, scenario_id: &str) -> Option<&TokenPool> {
        self.pools.get(scenario_id)
    }

    pub fn snapshot(&self, scenario_id: &str) -> Option<PoolSnapshot> {
        let now = self.clock.now();
        self.pools.get(scenario_id).map(|pool| PoolSnapshot {
            scenario_id: scenario_id.to_string(),
            total_tokens: pool.tokens.len(),
            used_tokens: pool.used_count(),
            spendable_tokens: pool.spendable_count(now),
            cumulative: pool.cumulative,
            limit: pool.limit,
            stats: pool.stats,
        })
    }

    /// Drop one scenario's pool; the next check mints a new one.
    pub fn remove(&mut self, scenario_id: &str) -> Option<TokenPool> {
        self.pools.remove(scenario_id)
    }

    /// Drop every pool.
    pub fn clear(&mut self) {
        tracing::info!(pools = self.pools.len(), "cleared offline token pools");
        self.pools.clear();
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
