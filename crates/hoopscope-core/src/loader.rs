// StatsLoader: season key in, normalized table out, with a TTL cache in front.
//
// Lookup order for `load(season)`:
// 1. Fresh cache entry -> return it, no fetch.
// 2. Take the per-season gate, then check the cache again (another caller may
//    have filled it while we waited).
// 3. Fetch, extract the first table, normalize.
// 4. Store and return.
//
// Gates are per season, and the cache map lock is never held across a fetch,
// so a slow fetch for one season never blocks lookups or loads of another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::html::{self, ExtractError};
use crate::normalize::{self, Normalized};
use crate::season::SeasonKey;
use crate::source::{FetchError, HttpStatsSource, StatsSource};
use crate::table::PlayerStatsTable;

/// Default lifetime of a cached season table.
pub const DEFAULT_TTL_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The single failure signal of the loader: no usable table for the season.
#[derive(Debug, Error)]
#[error("no data available for season {season}: {reason}")]
pub struct DataUnavailable {
    pub season: SeasonKey,
    #[source]
    pub reason: UnavailableReason,
}

#[derive(Debug, Error)]
pub enum UnavailableReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("table contains no player rows")]
    EmptyTable,
}

// ---------------------------------------------------------------------------
// StatsLoader
// ---------------------------------------------------------------------------

type Gate = Arc<tokio::sync::Mutex<()>>;

pub struct StatsLoader {
    source: Arc<dyn StatsSource>,
    cache: TtlCache<SeasonKey, PlayerStatsTable>,
    gates: Mutex<HashMap<SeasonKey, Gate>>,
}

impl StatsLoader {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl, clock),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Loader backed by the HTTP source and the system clock.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let source = HttpStatsSource::from_config(&config.source)?;
        Ok(Self::new(
            Arc::new(source),
            config.cache.ttl(),
            Arc::new(SystemClock),
        ))
    }

    /// The table for `season`, from cache when fresh, otherwise fetched.
    ///
    /// Two calls within the TTL return the same `Arc` and fetch once. A
    /// failure leaves every existing cache entry untouched.
    pub async fn load(&self, season: SeasonKey) -> Result<Arc<PlayerStatsTable>, DataUnavailable> {
        if let Some(table) = self.cache.get(&season) {
            debug!(season = season.year(), "season table served from cache");
            return Ok(table);
        }

        let gate = self.gate(season);
        let result = {
            let _permit = gate.lock().await;
            match self.cache.get(&season) {
                Some(table) => {
                    debug!(season = season.year(), "season table filled by concurrent load");
                    Ok(table)
                }
                None => self.fetch_and_store(season).await,
            }
        };
        self.release_gate(season, gate);
        result
    }

    /// Drop any cached table for `season` and load it again.
    pub async fn refresh(&self, season: SeasonKey) -> Result<Arc<PlayerStatsTable>, DataUnavailable> {
        if self.cache.invalidate(&season) {
            info!(season = season.year(), "cached season table invalidated");
        }
        self.load(season).await
    }

    /// The cached table for `season` if fresh; never fetches.
    pub fn cached(&self, season: SeasonKey) -> Option<Arc<PlayerStatsTable>> {
        self.cache.get(&season)
    }

    pub fn cache(&self) -> &TtlCache<SeasonKey, PlayerStatsTable> {
        &self.cache
    }

    async fn fetch_and_store(
        &self,
        season: SeasonKey,
    ) -> Result<Arc<PlayerStatsTable>, DataUnavailable> {
        let unavailable = |reason: UnavailableReason| {
            warn!(season = season.year(), error = %reason, "season data unavailable");
            DataUnavailable { season, reason }
        };

        let document = self
            .source
            .fetch_season(season)
            .await
            .map_err(|e| unavailable(e.into()))?;
        let raw = html::extract_first_table(&document).map_err(|e| unavailable(e.into()))?;
        let Normalized { table, report } = normalize::normalize(season, raw);
        if table.is_empty() {
            return Err(unavailable(UnavailableReason::EmptyTable));
        }

        info!(
            season = season.year(),
            players = table.len(),
            columns = table.columns().len(),
            header_rows_removed = report.header_rows_removed,
            "season table loaded"
        );
        Ok(self.cache.insert(season, table))
    }

    fn gate(&self, season: SeasonKey) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(season).or_default())
    }

    /// Forget the gate once nobody else holds it.
    fn release_gate(&self, season: SeasonKey, gate: Gate) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours.
        let idle = Arc::strong_count(&gate) <= 2;
        if idle && gates.get(&season).is_some_and(|g| Arc::ptr_eq(g, &gate)) {
            gates.remove(&season);
        }
    }
}
