//! Response cache keyed by query identity.
//!
//! A [`QueryCache`] is an ordinary owned value: commands create one and hand
//! it to whatever needs it. Mutations never edit cached data; they mark the
//! related queries stale through [`invalidations`] and the next read
//! refetches.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, ShopError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Job,
    JobList,
    Invoice,
    Receipt,
    ReceiptList,
    PaymentList,
    TipList,
    CommissionSummary,
    AdvanceList,
    Asset,
    Expense,
    ExpenseList,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Job => "job",
            Entity::JobList => "job-list",
            Entity::Invoice => "invoice",
            Entity::Receipt => "receipt",
            Entity::ReceiptList => "receipt-list",
            Entity::PaymentList => "payment-list",
            Entity::TipList => "tip-list",
            Entity::CommissionSummary => "commission-summary",
            Entity::AdvanceList => "advance-list",
            Entity::Asset => "asset",
            Entity::Expense => "expense",
            Entity::ExpenseList => "expense-list",
        }
    }
}

/// Structured identity of one query: what is fetched and with which parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub entity: Entity,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn job(id: &str) -> Self {
        Self::new(Entity::Job).with("id", id)
    }

    pub fn invoice(id: &str) -> Self {
        Self::new(Entity::Invoice).with("id", id)
    }

    pub fn receipt(id: &str) -> Self {
        Self::new(Entity::Receipt).with("id", id)
    }

    pub fn asset(id: &str) -> Self {
        Self::new(Entity::Asset).with("id", id)
    }

    pub fn commission_summary(employee: &str) -> Self {
        Self::new(Entity::CommissionSummary).with("employee", employee)
    }

    pub fn advances(employee: &str) -> Self {
        Self::new(Entity::AdvanceList).with("employee", employee)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity.as_str())?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "{{{}}}", params.join(","))?;
        }
        Ok(())
    }
}

/// Matches every key of the same entity whose params include all of the
/// pattern's params. A pattern with no params matches the whole entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPattern {
    pub entity: Entity,
    pub params: BTreeMap<String, String>,
}

impl QueryPattern {
    pub fn entity(entity: Entity) -> Self {
        Self {
            entity,
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        self.entity == key.entity
            && self
                .params
                .iter()
                .all(|(name, value)| key.params.get(name) == Some(value))
    }
}

impl From<&QueryKey> for QueryPattern {
    fn from(key: &QueryKey) -> Self {
        Self {
            entity: key.entity,
            params: key.params.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Stored(QueryKey),
    Invalidated(QueryKey),
}

struct Entry {
    value: Value,
    stored_at: Instant,
    stale: bool,
}

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
    max_age: Option<Duration>,
    subscribers: Vec<Sender<CacheEvent>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries older than `max_age` are treated as stale.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        !entry.stale
            && self
                .max_age
                .map_or(true, |max| entry.stored_at.elapsed() <= max)
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map_or(true, |e| !self.is_fresh(e))
    }

    /// Fresh cached value for `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if !self.is_fresh(entry) {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn insert<T: Serialize>(&mut self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| ShopError::Decode(e.to_string()))?;
        self.entries.insert(
            key.clone(),
            Entry {
                value,
                stored_at: Instant::now(),
                stale: false,
            },
        );
        self.notify(CacheEvent::Stored(key));
        Ok(())
    }

    /// Cached value when fresh, otherwise `fetch` and store the result.
    pub fn get_or_fetch<T, F>(&mut self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.get(&key) {
            debug!(query = %key, "cache hit");
            return Ok(hit);
        }
        debug!(query = %key, "cache miss");
        let value = fetch()?;
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Mark every matching entry stale. Returns how many were fresh before.
    pub fn invalidate(&mut self, pattern: &QueryPattern) -> usize {
        let mut marked = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if pattern.matches(key) && !entry.stale {
                entry.stale = true;
                marked.push(key.clone());
            }
        }
        marked.sort();
        let count = marked.len();
        for key in marked {
            debug!(query = %key, "invalidated");
            self.notify(CacheEvent::Invalidated(key));
        }
        count
    }

    pub fn invalidate_all(&mut self, patterns: &[QueryPattern]) -> usize {
        patterns.iter().map(|p| self.invalidate(p)).sum()
    }

    /// Events for every store and invalidation from now on.
    pub fn subscribe(&mut self) -> Receiver<CacheEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: CacheEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Which queries each kind of write makes stale.
pub mod invalidations {
    use super::{Entity, QueryPattern};

    /// A payment changes the job's balance, the job list and its receipts.
    pub fn after_payment(job_id: &str) -> Vec<QueryPattern> {
        vec![
            QueryPattern::entity(Entity::Job).with("id", job_id),
            QueryPattern::entity(Entity::JobList),
            QueryPattern::entity(Entity::ReceiptList).with("job", job_id),
            QueryPattern::entity(Entity::PaymentList).with("job", job_id),
        ]
    }

    pub fn after_tips(job_id: &str) -> Vec<QueryPattern> {
        vec![
            QueryPattern::entity(Entity::TipList).with("job", job_id),
            QueryPattern::entity(Entity::CommissionSummary),
        ]
    }

    pub fn after_advance(employee_id: &str) -> Vec<QueryPattern> {
        vec![
            QueryPattern::entity(Entity::AdvanceList).with("employee", employee_id),
            QueryPattern::entity(Entity::CommissionSummary).with("employee", employee_id),
        ]
    }

    pub fn after_expense_action(expense_id: &str) -> Vec<QueryPattern> {
        vec![
            QueryPattern::entity(Entity::Expense).with("id", expense_id),
            QueryPattern::entity(Entity::ExpenseList),
        ]
    }

    pub fn after_job_status(job_id: &str) -> Vec<QueryPattern> {
        vec![
            QueryPattern::entity(Entity::Job).with("id", job_id),
            QueryPattern::entity(Entity::JobList),
        ]
    }
}
