//! The process-wide query cache.
//!
//! One entry per [`ResourceKey`], holding the last known value, freshness,
//! and in-flight status. The cache is an explicitly constructed object that
//! gets cloned (cheaply, via `Arc`) into whatever needs it; it is torn down
//! by the logout-driven [`QueryCache::clear`] or at process exit.
//!
//! Behavioral contract (see the public method docs for details):
//! - concurrent fetches for one key share a single network call;
//! - a stale value is returned immediately while a background revalidation
//!   runs (stale-while-revalidate);
//! - invalidation marks entries stale by key prefix and refetches the ones
//!   with live subscribers;
//! - a failed fetch records the error but never clears the previous value;
//! - a response for a superseded fetch generation is discarded;
//! - entries with no subscribers are evicted after an idle window.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::key::ResourceKey;

/// Per-query tuning.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  /// How long a fetched value counts as fresh.
  pub stale_time: Duration,
  /// Refetch on this interval while at least one subscriber exists.
  pub refetch_interval: Option<Duration>,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(60),
      refetch_interval: None,
    }
  }
}

impl QueryOptions {
  pub fn stale(stale_time: Duration) -> Self {
    Self {
      stale_time,
      refetch_interval: None,
    }
  }

  pub fn polled(stale_time: Duration, every: Duration) -> Self {
    Self {
      stale_time,
      refetch_interval: Some(every),
    }
  }
}

/// Read-only view of a cache entry, for rendering.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<T> {
  pub data: Option<T>,
  /// Error from the most recent failed fetch. Coexists with `data`: the UI
  /// may show stale data alongside an error indicator.
  pub error: Option<String>,
  pub is_fetching: bool,
  pub is_stale: bool,
}

impl<T> Default for CacheSnapshot<T> {
  fn default() -> Self {
    Self {
      data: None,
      error: None,
      is_fetching: false,
      is_stale: false,
    }
  }
}

type SharedFetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

struct InFlight {
  generation: u64,
  done: watch::Receiver<bool>,
}

struct Entry {
  value: Option<Value>,
  fetched_at: Option<Instant>,
  /// Forced-stale mark set by invalidation, independent of age.
  marked_stale: bool,
  error: Option<String>,
  stale_time: Duration,
  /// Bumped whenever a fetch starts or a direct write supersedes one; a
  /// completion whose generation no longer matches is discarded.
  generation: u64,
  in_flight: Option<InFlight>,
  subscribers: usize,
  /// Registered while subscribed, so invalidation can refetch without the
  /// subscriber's involvement.
  fetcher: Option<SharedFetcher>,
  polling: bool,
  last_used: Instant,
}

impl Entry {
  fn new(stale_time: Duration) -> Self {
    Self {
      value: None,
      fetched_at: None,
      marked_stale: false,
      error: None,
      stale_time,
      generation: 0,
      in_flight: None,
      subscribers: 0,
      fetcher: None,
      polling: false,
      last_used: Instant::now(),
    }
  }

  fn is_fresh(&self) -> bool {
    !self.marked_stale
      && self.value.is_some()
      && self
        .fetched_at
        .map(|t| t.elapsed() <= self.stale_time)
        .unwrap_or(false)
  }

  /// Supersede any in-flight fetch and start a new generation.
  fn begin_fetch(&mut self) -> (u64, watch::Sender<bool>) {
    self.generation += 1;
    let (tx, rx) = watch::channel(false);
    self.in_flight = Some(InFlight {
      generation: self.generation,
      done: rx,
    });
    (self.generation, tx)
  }
}

/// The cache. Clones share the same state.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<HashMap<ResourceKey, Entry>>>,
  gc_after: Duration,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(HashMap::new())),
      gc_after: Duration::from_secs(300),
    }
  }

  /// Set how long an unsubscribed entry survives before eviction.
  pub fn with_gc_after(mut self, gc_after: Duration) -> Self {
    self.gc_after = gc_after;
    self
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, Entry>> {
    // A poisoned lock only means a panic elsewhere; the map is still usable.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Fetch the value for `key`.
  ///
  /// - Fresh cached value: returned without touching the network.
  /// - Stale cached value: returned immediately; a revalidation runs in the
  ///   background (unless one is already in flight).
  /// - No value, fetch in flight: joins it and returns its result, so N
  ///   concurrent callers produce exactly one network call.
  /// - No value, nothing in flight: performs the fetch and awaits it.
  pub async fn fetch<T, F, Fut>(
    &self,
    key: &ResourceKey,
    options: QueryOptions,
    fetcher: F,
  ) -> Result<T, String>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    enum Plan {
      Hit(Value),
      HitRevalidate(Value, u64, watch::Sender<bool>),
      Join(watch::Receiver<bool>),
      Lead(u64, watch::Sender<bool>),
    }

    let plan = {
      let mut map = self.lock();
      let entry = map
        .entry(key.clone())
        .or_insert_with(|| Entry::new(options.stale_time));
      entry.stale_time = options.stale_time;
      entry.last_used = Instant::now();

      if entry.is_fresh() {
        // is_fresh requires a value.
        Plan::Hit(entry.value.clone().unwrap_or(Value::Null))
      } else if let Some(stale) = entry.value.clone() {
        if entry.in_flight.is_none() {
          let (generation, tx) = entry.begin_fetch();
          Plan::HitRevalidate(stale, generation, tx)
        } else {
          Plan::Hit(stale)
        }
      } else if let Some(in_flight) = &entry.in_flight {
        Plan::Join(in_flight.done.clone())
      } else {
        let (generation, tx) = entry.begin_fetch();
        Plan::Lead(generation, tx)
      }
    };

    match plan {
      Plan::Hit(value) => from_value(&value),
      Plan::HitRevalidate(stale, generation, tx) => {
        // Stale-while-revalidate: hand the old value back right away and
        // refresh in the background.
        let fut = wrap(fetcher());
        let cache = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
          let result = fut.await;
          cache.settle(&key, generation, result, tx);
        });
        from_value(&stale)
      }
      Plan::Join(mut done) => {
        while !*done.borrow() {
          if done.changed().await.is_err() {
            break;
          }
        }
        self.read_settled(key)
      }
      Plan::Lead(generation, tx) => {
        let result = wrap(fetcher()).await;
        self.settle(key, generation, result.clone(), tx);
        result.and_then(|v| from_value(&v))
      }
    }
  }

  /// Non-blocking view of the entry state, for rendering.
  pub fn peek<T: DeserializeOwned>(&self, key: &ResourceKey) -> CacheSnapshot<T> {
    let map = self.lock();
    match map.get(key) {
      Some(entry) => CacheSnapshot {
        data: entry.value.as_ref().and_then(|v| from_value(v).ok()),
        error: entry.error.clone(),
        is_fetching: entry.in_flight.is_some(),
        is_stale: entry.value.is_some() && !entry.is_fresh(),
      },
      None => CacheSnapshot::default(),
    }
  }

  /// Write a value directly, short-circuiting a fetch (e.g. a login
  /// response becoming the session entry). Supersedes any in-flight fetch
  /// for the key so a late response cannot overwrite it.
  pub fn set<T: Serialize>(&self, key: &ResourceKey, value: &T) {
    let value = match serde_json::to_value(value) {
      Ok(v) => v,
      Err(e) => {
        warn!(key = %key, error = %e, "failed to serialize value for cache write");
        return;
      }
    };

    let mut map = self.lock();
    let entry = map
      .entry(key.clone())
      .or_insert_with(|| Entry::new(QueryOptions::default().stale_time));
    entry.generation += 1;
    entry.in_flight = None;
    entry.value = Some(value);
    entry.fetched_at = Some(Instant::now());
    entry.marked_stale = false;
    entry.error = None;
    entry.last_used = Instant::now();
  }

  /// Mark every entry under `prefix` stale. Entries with live subscribers
  /// are refetched in the background through their registered fetcher;
  /// unsubscribed entries are only marked and will revalidate on next use.
  pub fn invalidate(&self, prefix: &ResourceKey) {
    let mut refetches = Vec::new();
    {
      let mut map = self.lock();
      for (key, entry) in map.iter_mut() {
        if !key.starts_with(prefix) {
          continue;
        }
        entry.marked_stale = true;
        if entry.subscribers > 0 {
          if let Some(fetcher) = entry.fetcher.clone() {
            let (generation, tx) = entry.begin_fetch();
            refetches.push((key.clone(), fetcher, generation, tx));
          }
        }
      }
    }

    for (key, fetcher, generation, tx) in refetches {
      debug!(key = %key, "refetching invalidated entry");
      let cache = self.clone();
      tokio::spawn(async move {
        let result = fetcher().await;
        cache.settle(&key, generation, result, tx);
      });
    }
  }

  /// Register a consumer of `key`. While at least one subscription exists
  /// the entry is exempt from GC, invalidation refetches it eagerly, and an
  /// optional refetch interval keeps polling it. Dropping the last
  /// subscription stops the polling timer and starts the idle clock.
  pub fn subscribe<T, F, Fut>(
    &self,
    key: &ResourceKey,
    options: QueryOptions,
    fetcher: F,
  ) -> Subscription
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let shared: SharedFetcher = Arc::new(move || {
      let fut = fetcher();
      Box::pin(async move { fut.await.and_then(|t| to_value(&t)) }) as BoxFuture<'static, _>
    });

    let start_poll = {
      let mut map = self.lock();
      let entry = map
        .entry(key.clone())
        .or_insert_with(|| Entry::new(options.stale_time));
      entry.stale_time = options.stale_time;
      entry.subscribers += 1;
      entry.last_used = Instant::now();
      entry.fetcher = Some(shared);

      match options.refetch_interval {
        Some(every) if !entry.polling => {
          entry.polling = true;
          Some(every)
        }
        _ => None,
      }
    };

    // A new consumer wants data; revalidate unless the entry is fresh.
    self.refresh(key);

    if let Some(every) = start_poll {
      let cache = self.clone();
      let key = key.clone();
      tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // the first tick fires immediately
        loop {
          interval.tick().await;
          if !cache.poll_tick(&key) {
            break;
          }
        }
      });
    }

    Subscription {
      cache: self.clone(),
      key: key.clone(),
    }
  }

  /// Start a background revalidation unless the entry is fresh or already
  /// fetching. Needs a registered fetcher (i.e. a live subscriber).
  pub fn refresh(&self, key: &ResourceKey) {
    let started = {
      let mut map = self.lock();
      let Some(entry) = map.get_mut(key) else {
        return;
      };
      if entry.is_fresh() || entry.in_flight.is_some() {
        None
      } else {
        entry.fetcher.clone().map(|fetcher| {
          let (generation, tx) = entry.begin_fetch();
          (fetcher, generation, tx)
        })
      }
    };

    if let Some((fetcher, generation, tx)) = started {
      let cache = self.clone();
      let key = key.clone();
      tokio::spawn(async move {
        let result = fetcher().await;
        cache.settle(&key, generation, result, tx);
      });
    }
  }

  /// Drop every entry. Used at logout: nothing cached remains valid for a
  /// different or absent identity. Polling timers notice on their next tick
  /// and stop.
  pub fn clear(&self) {
    self.lock().clear();
  }

  /// Evict entries that have had zero subscribers for longer than the GC
  /// window. Called periodically from the app tick.
  pub fn collect_garbage(&self) {
    let gc_after = self.gc_after;
    self.lock().retain(|_, entry| {
      entry.subscribers > 0 || entry.in_flight.is_some() || entry.last_used.elapsed() <= gc_after
    });
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// One interval tick for a polled key. Returns false once the timer
  /// should stop (entry gone or no subscribers left).
  fn poll_tick(&self, key: &ResourceKey) -> bool {
    let started = {
      let mut map = self.lock();
      let Some(entry) = map.get_mut(key) else {
        return false;
      };
      if entry.subscribers == 0 {
        entry.polling = false;
        return false;
      }
      if entry.in_flight.is_some() {
        None
      } else {
        entry.fetcher.clone().map(|fetcher| {
          let (generation, tx) = entry.begin_fetch();
          (fetcher, generation, tx)
        })
      }
    };

    if let Some((fetcher, generation, tx)) = started {
      let cache = self.clone();
      let key = key.clone();
      tokio::spawn(async move {
        let result = fetcher().await;
        cache.settle(&key, generation, result, tx);
      });
    }
    true
  }

  /// Record a completed fetch. A mismatched generation means the fetch was
  /// superseded (newer fetch, direct write, or purge) and its result is
  /// discarded. A failure keeps the previous value.
  fn settle(&self, key: &ResourceKey, generation: u64, result: Result<Value, String>, tx: watch::Sender<bool>) {
    {
      let mut map = self.lock();
      if let Some(entry) = map.get_mut(key) {
        let current = entry.in_flight.as_ref().map(|f| f.generation);
        if current == Some(generation) {
          entry.in_flight = None;
          match result {
            Ok(value) => {
              entry.value = Some(value);
              entry.fetched_at = Some(Instant::now());
              entry.marked_stale = false;
              entry.error = None;
            }
            Err(error) => {
              debug!(key = %key, error = %error, "fetch failed; keeping previous value");
              entry.error = Some(error);
            }
          }
        } else {
          debug!(key = %key, generation, "discarding superseded response");
        }
      }
    }
    // Wake joiners regardless; they re-read the entry.
    let _ = tx.send(true);
  }

  /// What a joiner sees after the leading fetch settles.
  fn read_settled<T: DeserializeOwned>(&self, key: &ResourceKey) -> Result<T, String> {
    let map = self.lock();
    match map.get(key) {
      Some(entry) => match &entry.value {
        Some(value) => from_value(value),
        None => Err(
          entry
            .error
            .clone()
            .unwrap_or_else(|| "request was cancelled".to_string()),
        ),
      },
      None => Err("cache entry was purged".to_string()),
    }
  }
}

fn wrap<T, Fut>(fut: Fut) -> impl Future<Output = Result<Value, String>> + Send
where
  T: Serialize + Send + 'static,
  Fut: Future<Output = Result<T, String>> + Send + 'static,
{
  async move { fut.await.and_then(|t| to_value(&t)) }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, String> {
  serde_json::to_value(value).map_err(|e| e.to_string())
}

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
  serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

/// Handle representing one consumer of a key. Dropping it decrements the
/// subscriber count; when the count reaches zero the idle clock starts and
/// any polling timer stops on its next tick.
pub struct Subscription {
  cache: QueryCache,
  key: ResourceKey,
}

impl Subscription {
  pub fn key(&self) -> &ResourceKey {
    &self.key
  }

  pub fn snapshot<T: DeserializeOwned>(&self) -> CacheSnapshot<T> {
    self.cache.peek(&self.key)
  }

  /// Ask for a revalidation (no-op while fresh or already fetching).
  pub fn refresh(&self) {
    self.cache.refresh(&self.key);
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    let mut map = self.cache.lock();
    if let Some(entry) = map.get_mut(&self.key) {
      entry.subscribers = entry.subscribers.saturating_sub(1);
      if entry.subscribers == 0 {
        entry.last_used = Instant::now();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn key(name: &str) -> ResourceKey {
    ResourceKey::root(name)
  }

  fn counting_fetcher(
    counter: &Arc<AtomicU32>,
    delay: Duration,
  ) -> impl Fn() -> BoxFuture<'static, Result<u32, String>> + Send + Sync + Clone + 'static {
    let counter = Arc::clone(counter);
    move || {
      let counter = Arc::clone(&counter);
      Box::pin(async move {
        tokio::time::sleep(delay).await;
        Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
      }) as BoxFuture<'static, _>
    }
  }

  #[tokio::test]
  async fn test_concurrent_fetches_share_one_request() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let k = key("jobs");
    let fetch = counting_fetcher(&counter, Duration::from_millis(30));

    let (a, b, c) = tokio::join!(
      cache.fetch::<u32, _, _>(&k, QueryOptions::default(), fetch.clone()),
      cache.fetch::<u32, _, _>(&k, QueryOptions::default(), fetch.clone()),
      cache.fetch::<u32, _, _>(&k, QueryOptions::default(), fetch.clone()),
    );

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(a, Ok(1));
    assert_eq!(b, Ok(1));
    assert_eq!(c, Ok(1));
  }

  #[tokio::test]
  async fn test_fresh_value_skips_network() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let k = key("skills");
    let fetch = counting_fetcher(&counter, Duration::ZERO);

    let first: Result<u32, _> = cache.fetch(&k, QueryOptions::default(), fetch.clone()).await;
    let second: Result<u32, _> = cache.fetch(&k, QueryOptions::default(), fetch.clone()).await;

    assert_eq!(first, Ok(1));
    assert_eq!(second, Ok(1));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_while_revalidate() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let k = key("jobs");
    let options = QueryOptions::stale(Duration::ZERO);
    let fetch = counting_fetcher(&counter, Duration::ZERO);

    let first: Result<u32, _> = cache.fetch(&k, options, fetch.clone()).await;
    assert_eq!(first, Ok(1));

    // Everything is instantly stale: the old value comes back immediately
    // while the refetch runs in the background.
    let second: Result<u32, _> = cache.fetch(&k, options, fetch.clone()).await;
    assert_eq!(second, Ok(1));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    let snapshot: CacheSnapshot<u32> = cache.peek(&k);
    assert_eq!(snapshot.data, Some(2));
  }

  #[tokio::test]
  async fn test_invalidate_refetches_subscribed_keys_only() {
    let cache = QueryCache::new();
    let jobs_counter = Arc::new(AtomicU32::new(0));
    let notes_counter = Arc::new(AtomicU32::new(0));
    let jobs_key = key("jobs");
    let notes_key = key("notes");

    let _jobs_sub = cache.subscribe::<u32, _, _>(
      &jobs_key,
      QueryOptions::default(),
      counting_fetcher(&jobs_counter, Duration::ZERO),
    );
    // Unsubscribed entry, populated by a plain fetch.
    let _: Result<u32, _> = cache
      .fetch(
        &notes_key,
        QueryOptions::default(),
        counting_fetcher(&notes_counter, Duration::ZERO),
      )
      .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(jobs_counter.load(Ordering::SeqCst), 1);

    cache.invalidate(&key("jobs"));
    cache.invalidate(&key("notes"));
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Subscribed key refetched eagerly; unsubscribed key only marked.
    assert_eq!(jobs_counter.load(Ordering::SeqCst), 2);
    assert_eq!(notes_counter.load(Ordering::SeqCst), 1);

    let snapshot: CacheSnapshot<u32> = cache.peek(&notes_key);
    assert!(snapshot.is_stale);

    // The mark forces the next fetch to hit the network despite the
    // staleness window.
    let _: Result<u32, _> = cache
      .fetch(
        &notes_key,
        QueryOptions::default(),
        counting_fetcher(&notes_counter, Duration::ZERO),
      )
      .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(notes_counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidate_prefix_hits_all_variants() {
    let cache = QueryCache::new();
    cache.set(&key("jobs").push("{\"search\":null}"), &1u32);
    cache.set(&key("jobs").push(7), &2u32);
    cache.set(&key("applications"), &3u32);

    cache.invalidate(&key("jobs"));

    assert!(cache.peek::<u32>(&key("jobs").push("{\"search\":null}")).is_stale);
    assert!(cache.peek::<u32>(&key("jobs").push(7)).is_stale);
    assert!(!cache.peek::<u32>(&key("applications")).is_stale);
  }

  #[tokio::test]
  async fn test_failed_refetch_keeps_previous_value() {
    let cache = QueryCache::new();
    let k = key("jobs");
    let options = QueryOptions::stale(Duration::ZERO);

    let first: Result<u32, _> = cache.fetch(&k, options, || async { Ok(7u32) }).await;
    assert_eq!(first, Ok(7));

    // Stale value returned, background revalidation fails.
    let second: Result<u32, _> = cache
      .fetch(&k, options, || async { Err("connection refused".to_string()) })
      .await;
    assert_eq!(second, Ok(7));

    tokio::time::sleep(Duration::from_millis(20)).await;
    let snapshot: CacheSnapshot<u32> = cache.peek(&k);
    assert_eq!(snapshot.data, Some(7));
    assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
  }

  #[tokio::test]
  async fn test_error_without_value_propagates_to_joiners() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let k = key("students");
    let fail = {
      let counter = Arc::clone(&counter);
      move || {
        let counter = Arc::clone(&counter);
        async move {
          counter.fetch_add(1, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(20)).await;
          Err::<u32, _>("boom".to_string())
        }
      }
    };

    let (a, b) = tokio::join!(
      cache.fetch::<u32, _, _>(&k, QueryOptions::default(), fail.clone()),
      cache.fetch::<u32, _, _>(&k, QueryOptions::default(), fail.clone()),
    );

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(a, Err("boom".to_string()));
    assert_eq!(b, Err("boom".to_string()));
  }

  #[tokio::test]
  async fn test_direct_write_supersedes_inflight_response() {
    let cache = QueryCache::new();
    let k = key("auth").push("me");

    let slow = cache.fetch::<String, _, _>(&k, QueryOptions::default(), || async {
      tokio::time::sleep(Duration::from_millis(40)).await;
      Ok("from-network".to_string())
    });

    let cache2 = cache.clone();
    let k2 = k.clone();
    let writer = async move {
      tokio::time::sleep(Duration::from_millis(10)).await;
      cache2.set(&k2, &"from-login".to_string());
    };

    let (fetched, ()) = tokio::join!(slow, writer);
    // The leading caller still gets its own response...
    assert_eq!(fetched, Ok("from-network".to_string()));

    // ...but the cache keeps the newer direct write.
    let snapshot: CacheSnapshot<String> = cache.peek(&k);
    assert_eq!(snapshot.data, Some("from-login".to_string()));
  }

  #[tokio::test]
  async fn test_clear_empties_everything() {
    let cache = QueryCache::new();
    cache.set(&key("jobs"), &1u32);
    cache.set(&key("notifications"), &2u32);
    assert_eq!(cache.len(), 2);

    cache.clear();

    assert!(cache.is_empty());
    let snapshot: CacheSnapshot<u32> = cache.peek(&key("jobs"));
    assert!(snapshot.data.is_none());
  }

  #[tokio::test]
  async fn test_gc_spares_subscribed_entries() {
    let cache = QueryCache::new().with_gc_after(Duration::ZERO);
    let counter = Arc::new(AtomicU32::new(0));

    let sub = cache.subscribe::<u32, _, _>(
      &key("notifications"),
      QueryOptions::default(),
      counting_fetcher(&counter, Duration::ZERO),
    );
    cache.set(&key("jobs"), &1u32);
    tokio::time::sleep(Duration::from_millis(20)).await;

    cache.collect_garbage();
    assert_eq!(cache.len(), 1); // jobs evicted, notifications kept

    drop(sub);
    tokio::time::sleep(Duration::from_millis(5)).await;
    cache.collect_garbage();
    assert!(cache.is_empty());
  }

  #[tokio::test]
  async fn test_polling_runs_while_subscribed_and_stops_after() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let options = QueryOptions::polled(Duration::ZERO, Duration::from_millis(20));

    let sub = cache.subscribe::<u32, _, _>(
      &key("notifications"),
      options,
      counting_fetcher(&counter, Duration::ZERO),
    );

    tokio::time::sleep(Duration::from_millis(90)).await;
    let while_subscribed = counter.load(Ordering::SeqCst);
    assert!(while_subscribed >= 3, "expected several polls, got {}", while_subscribed);

    drop(sub);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(counter.load(Ordering::SeqCst), while_subscribed);
  }
}
