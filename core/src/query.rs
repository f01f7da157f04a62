//! Keyed query cache: the data-fetch hook every list view goes through.
//!
//! # Design
//! A query is identified by an ordered tuple of strings (`QueryKey`). Pages
//! fold everything that distinguishes one view from another into the key:
//! page number, page size, sort order, and a `QueryVersion` segment that a
//! page bumps after every successful mutation. Observing the same key twice
//! in a row issues no request; observing a different key, or a key whose
//! entry was invalidated, issues exactly one (plus retries on failure).
//!
//! On top of the version counter, entries can carry a `Resource` tag.
//! `invalidate` marks every entry of a resource stale, so a mutation can
//! force a refetch of exactly the views that show that resource.
//!
//! Only the most recently observed `MAX_ENTRIES` keys are kept. A key
//! superseded by a version bump is never observed again and ages out.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Ordered cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self(segments.into_iter().map(|s| s.to_string()).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A server-side collection a cache entry was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    TodosOfUser(u64),
}

/// Monotonic counter embedded in a key to force a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryVersion(u64);

impl QueryVersion {
    pub fn new() -> Self {
        Self(1)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn bump(&mut self) {
        self.0 += 1;
    }
}

impl Default for QueryVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entries kept per cache, counted by most recent observation.
pub const MAX_ENTRIES: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Extra attempts after a failed fetch. Retries are issued immediately,
    /// one after another, with no delay in between.
    pub retry: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { retry: 3 }
    }
}

/// What a view renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// No data yet and a request is (or would be) in flight.
    pub is_loading: bool,
    /// A request is (or would be) in flight, cached data or not.
    pub is_fetching: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct Entry<T> {
    data: Option<T>,
    error: Option<String>,
    stale: bool,
    resource: Option<Resource>,
}

/// Cache of query results for one payload type.
#[derive(Debug)]
pub struct QueryClient<T> {
    entries: HashMap<QueryKey, Entry<T>>,
    /// Least recently observed first.
    recency: VecDeque<QueryKey>,
    observed: Option<QueryKey>,
    options: QueryOptions,
}

impl<T: Clone> QueryClient<T> {
    pub fn new() -> Self {
        Self::with_options(QueryOptions::default())
    }

    pub fn with_options(options: QueryOptions) -> Self {
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            observed: None,
            options,
        }
    }

    fn needs_fetch(&self, key: &QueryKey) -> bool {
        match self.entries.get(key) {
            None => true,
            Some(entry) => entry.stale || self.observed.as_ref() != Some(key),
        }
    }

    /// The state a view shows for `key` before `use_query` resolves.
    pub fn peek(&self, key: &QueryKey) -> QueryState<T> {
        let fetching = self.needs_fetch(key);
        let entry = self.entries.get(key);
        let data = entry.and_then(|e| e.data.clone());
        QueryState {
            is_loading: fetching && data.is_none(),
            is_fetching: fetching,
            data,
            error: entry.and_then(|e| e.error.clone()),
        }
    }

    /// Observe `key`, fetching through `transport` when the key changed or
    /// its entry went stale.
    pub fn use_query<F>(
        &mut self,
        key: QueryKey,
        resource: Option<Resource>,
        request: HttpRequest,
        transport: &dyn Transport,
        parse: F,
    ) -> QueryState<T>
    where
        F: Fn(HttpResponse) -> Result<T, ApiError>,
    {
        if !self.needs_fetch(&key) {
            debug!(%key, "query cache hit");
            self.touch(&key);
            return self.settled(&key);
        }

        debug!(%key, path = %request.path, "query fetch");
        self.observed = Some(key.clone());
        let mut attempt = 0;
        let outcome = loop {
            match transport.execute(request.clone()).and_then(&parse) {
                Ok(data) => break Ok(data),
                Err(e) if attempt < self.options.retry => {
                    attempt += 1;
                    debug!(%key, attempt, error = %e, "query retry");
                }
                Err(e) => break Err(e),
            }
        };

        let entry = self.entries.entry(key.clone()).or_insert(Entry {
            data: None,
            error: None,
            stale: false,
            resource,
        });
        entry.stale = false;
        if resource.is_some() {
            entry.resource = resource;
        }
        match outcome {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
            }
            Err(e) => {
                warn!(%key, error = %e, "query failed");
                entry.error = Some(e.to_string());
            }
        }
        self.touch(&key);
        self.settled(&key)
    }

    /// Move `key` to the most recent slot and drop whatever falls off the end.
    fn touch(&mut self, key: &QueryKey) {
        self.recency.retain(|k| k != key);
        self.recency.push_back(key.clone());
        while self.recency.len() > MAX_ENTRIES {
            if let Some(evicted) = self.recency.pop_front() {
                debug!(key = %evicted, "query evicted");
                self.entries.remove(&evicted);
            }
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn settled(&self, key: &QueryKey) -> QueryState<T> {
        let entry = self.entries.get(key);
        QueryState {
            is_loading: false,
            is_fetching: false,
            data: entry.and_then(|e| e.data.clone()),
            error: entry.and_then(|e| e.error.clone()),
        }
    }

    /// Mark every entry built from `resource` stale. Returns how many.
    pub fn invalidate(&mut self, resource: &Resource) -> usize {
        let mut count = 0;
        for entry in self.entries.values_mut() {
            if entry.resource.as_ref() == Some(resource) {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(?resource, count, "invalidated");
        count
    }

    pub fn observed_key(&self) -> Option<&QueryKey> {
        self.observed.as_ref()
    }
}

impl<T: Clone> Default for QueryClient<T> {
    fn default() -> Self {
        Self::new()
    }
}
