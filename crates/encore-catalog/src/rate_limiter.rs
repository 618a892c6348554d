// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{sleep, sleep_until, Duration, Instant};
use tracing::{debug, info, trace, warn};
use utoipa::ToSchema;

use crate::error::{CatalogError, Result};

/// Consecutive failures that open a provider's circuit.
pub const FAILURE_THRESHOLD: u32 = 5;
/// How long an open circuit rejects calls before closing again.
pub const RECOVERY_WINDOW: Duration = Duration::from_secs(5 * 60);
/// Minute buckets older than this many minutes are discarded.
const BUCKET_RETENTION_MINUTES: i64 = 5;
const MINUTE_MS: i64 = 60_000;

/// Call spacing and per-minute quota for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderLimits {
    pub min_interval: Duration,
    pub max_per_minute: u32,
}

impl ProviderLimits {
    /// iTunes Search API: roughly 20 calls per minute per client.
    pub const ITUNES: Self = Self::new(Duration::from_millis(250), 20);
    pub const SPOTIFY: Self = Self::new(Duration::from_millis(100), 100);

    pub const fn new(min_interval: Duration, max_per_minute: u32) -> Self {
        Self {
            min_interval,
            max_per_minute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CircuitStatus {
    Closed,
    Open,
}

/// Point-in-time view of one provider's limiter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider: String,
    pub circuit: CircuitStatus,
    pub consecutive_failures: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub seconds_since_last_failure: Option<u64>,
    /// Calls made in the current minute; `None` while a caller holds the window.
    pub calls_this_minute: Option<u32>,
}

impl ProviderHealth {
    /// Health of a provider that has not been called yet.
    pub fn idle(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            circuit: CircuitStatus::Closed,
            consecutive_failures: 0,
            total_successes: 0,
            total_failures: 0,
            seconds_since_last_failure: None,
            calls_this_minute: Some(0),
        }
    }
}

/// Wall-clock time derived from a monotonic anchor so that minute buckets
/// follow real minute boundaries while still obeying tokio's (pausable) clock.
#[derive(Debug)]
struct AnchoredClock {
    instant: Instant,
    epoch_ms: i64,
}

impl AnchoredClock {
    fn new(wall: DateTime<Utc>) -> Self {
        Self {
            instant: Instant::now(),
            epoch_ms: wall.timestamp_millis(),
        }
    }

    fn now_ms(&self, now: Instant) -> i64 {
        let elapsed = now.saturating_duration_since(self.instant).as_millis();
        self.epoch_ms + i64::try_from(elapsed).unwrap_or(i64::MAX - self.epoch_ms)
    }

    /// Current minute key and the instant the minute ends.
    fn minute(&self, now: Instant) -> (i64, Instant) {
        let now_ms = self.now_ms(now);
        let key = now_ms.div_euclid(MINUTE_MS);
        let remaining = (key + 1) * MINUTE_MS - now_ms;
        (key, now + Duration::from_millis(remaining as u64))
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    resets_at: Instant,
}

#[derive(Debug, Default)]
struct WindowState {
    last_call: Option<Instant>,
    buckets: HashMap<i64, Bucket>,
}

impl WindowState {
    /// Return the key of the bucket for the current minute, starting a fresh
    /// one if none exists or the existing one has expired.
    fn refresh(&mut self, clock: &AnchoredClock) -> i64 {
        let now = Instant::now();
        let (key, resets_at) = clock.minute(now);
        let stale = self
            .buckets
            .get(&key)
            .map_or(true, |bucket| bucket.resets_at <= now);
        if stale {
            self.buckets.insert(
                key,
                Bucket {
                    count: 0,
                    resets_at,
                },
            );
        }
        key
    }

    fn prune(&mut self, current_key: i64) {
        self.buckets
            .retain(|key, _| *key > current_key - BUCKET_RETENTION_MINUTES);
    }
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
    total_successes: u64,
    total_failures: u64,
}

#[derive(Debug, Default)]
struct ProviderSlot {
    // Held across rate-limit sleeps, serializing callers of one provider.
    window: tokio::sync::Mutex<WindowState>,
    // Only held for short read-modify-write sections.
    circuit: Mutex<CircuitState>,
}

impl ProviderSlot {
    fn circuit(&self) -> MutexGuard<'_, CircuitState> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Inner {
    clock: AnchoredClock,
    providers: Mutex<HashMap<String, Arc<ProviderSlot>>>,
}

/// Per-provider call throttle and circuit breaker.
///
/// One instance is shared by every search in the process; clones share state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Create a limiter whose notion of "now" starts at `wall`.
    pub fn anchored_at(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock: AnchoredClock::new(wall),
                providers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn slot(&self, provider: &str) -> Arc<ProviderSlot> {
        let mut providers = self
            .inner
            .providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        providers
            .entry(provider.to_string())
            .or_default()
            .clone()
    }

    fn existing_slot(&self, provider: &str) -> Option<Arc<ProviderSlot>> {
        self.inner
            .providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    /// Time left until the current one-minute bucket resets.
    pub fn window_remaining(&self) -> Duration {
        let now = Instant::now();
        let (_, resets_at) = self.inner.clock.minute(now);
        resets_at - now
    }

    /// Wait until a call to `provider` is allowed.
    ///
    /// Fails immediately with [`CatalogError::CircuitOpen`] while the
    /// provider's circuit is open; otherwise suspends for the per-minute quota
    /// and minimum spacing, then records the call.
    pub async fn wait_for_rate_limit(&self, provider: &str, limits: ProviderLimits) -> Result<()> {
        let slot = self.slot(provider);
        check_circuit(&slot, provider)?;

        let mut window = slot.window.lock().await;
        // The circuit may have opened while waiting behind another caller.
        check_circuit(&slot, provider)?;

        let clock = &self.inner.clock;
        let mut key = window.refresh(clock);
        let max_per_minute = limits.max_per_minute.max(1);

        if let Some(bucket) = window.buckets.get(&key).copied() {
            if bucket.count >= max_per_minute {
                debug!(
                    target: "rate_limiter",
                    provider,
                    max_per_minute,
                    "per-minute quota reached, waiting {:?}",
                    bucket.resets_at.saturating_duration_since(Instant::now())
                );
                sleep_until(bucket.resets_at).await;
                key = window.refresh(clock);
            }
        }

        if let Some(last) = window.last_call {
            let elapsed = last.elapsed();
            if elapsed < limits.min_interval {
                let wait = limits.min_interval - elapsed;
                trace!(target: "rate_limiter", provider, "rate limiting: waiting {:?}", wait);
                sleep(wait).await;
                key = window.refresh(clock);
            }
        }

        // Failures recorded by other callers during the sleeps above count too.
        check_circuit(&slot, provider)?;

        window.last_call = Some(Instant::now());
        if let Some(bucket) = window.buckets.get_mut(&key) {
            bucket.count += 1;
        }
        window.prune(key);

        Ok(())
    }

    /// A successful call heals the circuit by one failure.
    pub fn record_success(&self, provider: &str) {
        let slot = self.slot(provider);
        let mut circuit = slot.circuit();
        circuit.consecutive_failures = circuit.consecutive_failures.saturating_sub(1);
        circuit.total_successes += 1;
    }

    /// Count a failed call, opening the circuit at [`FAILURE_THRESHOLD`].
    pub fn record_failure(&self, provider: &str) {
        let slot = self.slot(provider);
        let mut circuit = slot.circuit();
        let now = Instant::now();
        circuit.consecutive_failures += 1;
        circuit.total_failures += 1;
        circuit.last_failure = Some(now);

        if circuit.consecutive_failures >= FAILURE_THRESHOLD && circuit.opened_at.is_none() {
            circuit.opened_at = Some(now);
            warn!(
                target: "rate_limiter",
                provider,
                failures = circuit.consecutive_failures,
                "circuit opened for {:?}",
                RECOVERY_WINDOW
            );
        }
    }

    /// Snapshot of a provider's state, or `None` if it was never called.
    pub fn snapshot(&self, provider: &str) -> Option<ProviderHealth> {
        let slot = self.existing_slot(provider)?;
        let calls_this_minute = slot.window.try_lock().ok().map(|window| {
            let now = Instant::now();
            let (key, _) = self.inner.clock.minute(now);
            window
                .buckets
                .get(&key)
                .filter(|bucket| bucket.resets_at > now)
                .map_or(0, |bucket| bucket.count)
        });

        let circuit = slot.circuit();
        let open = circuit
            .opened_at
            .is_some_and(|opened| opened.elapsed() < RECOVERY_WINDOW);

        Some(ProviderHealth {
            provider: provider.to_string(),
            circuit: if open {
                CircuitStatus::Open
            } else {
                CircuitStatus::Closed
            },
            consecutive_failures: circuit.consecutive_failures,
            total_successes: circuit.total_successes,
            total_failures: circuit.total_failures,
            seconds_since_last_failure: circuit.last_failure.map(|at| at.elapsed().as_secs()),
            calls_this_minute,
        })
    }
}

fn check_circuit(slot: &ProviderSlot, provider: &str) -> Result<()> {
    let mut circuit = slot.circuit();
    let Some(opened_at) = circuit.opened_at else {
        return Ok(());
    };

    let elapsed = opened_at.elapsed();
    if elapsed < RECOVERY_WINDOW {
        return Err(CatalogError::CircuitOpen {
            provider: provider.to_string(),
            retry_in: RECOVERY_WINDOW - elapsed,
        });
    }

    info!(target: "rate_limiter", provider, "recovery window elapsed, closing circuit");
    circuit.opened_at = None;
    circuit.consecutive_failures = 0;
    Ok(())
}
