use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::SettlementPlan;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct State {
    #[serde(default)]
    pub counter: Counter,
    /// Settlements whose writes have not all gone through yet.
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Counter {
    pub last_number: u32,
    pub last_year: u32,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            last_number: 0,
            last_year: Utc::now().year() as u32,
        }
    }
}

impl State {
    /// Next journal id, `SET-{year}-{seq:04}`; the sequence restarts each year.
    pub fn next_settlement_id(&mut self, now: DateTime<Utc>) -> String {
        let year = now.year() as u32;
        let seq = if self.counter.last_year == year {
            self.counter.last_number + 1
        } else {
            1
        };
        self.counter.last_number = seq;
        self.counter.last_year = year;
        format!("SET-{year}-{seq:04}")
    }

    pub fn settlement(&self, id: &str) -> Option<&SettlementRecord> {
        self.settlements.iter().find(|s| s.id == id)
    }

    /// Insert or replace a record by id.
    pub fn upsert_settlement(&mut self, record: SettlementRecord) {
        match self.settlements.iter_mut().find(|s| s.id == record.id) {
            Some(slot) => *slot = record,
            None => self.settlements.push(record),
        }
    }

    pub fn remove_settlement(&mut self, id: &str) -> Option<SettlementRecord> {
        let idx = self.settlements.iter().position(|s| s.id == id)?;
        Some(self.settlements.remove(idx))
    }
}

/// Journal entry for one settlement: the plan plus how far it got.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SettlementRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub plan: SettlementPlan,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub recorded_tips: Vec<RecordedTip>,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecordedTip {
    pub employee: String,
    pub tip_id: String,
}

impl SettlementRecord {
    pub fn new(id: String, created_at: DateTime<Utc>, plan: SettlementPlan) -> Self {
        Self {
            id,
            created_at,
            plan,
            payment_id: None,
            receipt_id: None,
            recorded_tips: Vec::new(),
            last_error: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.plan.payment.job
    }

    pub fn tip_recorded(&self, employee: &str) -> bool {
        self.recorded_tips.iter().any(|t| t.employee == employee)
    }

    pub fn is_complete(&self) -> bool {
        self.payment_id.is_some()
            && self.receipt_id.is_some()
            && self.plan.tips.iter().all(|t| self.tip_recorded(&t.employee))
    }

    /// Human description of the first step still outstanding.
    pub fn next_step(&self) -> &'static str {
        if self.payment_id.is_none() {
            "create payment"
        } else if self.receipt_id.is_none() {
            "generate receipt"
        } else if !self.is_complete() {
            "record tips"
        } else {
            "done"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn settlement_ids_restart_each_year() {
        let mut state = State {
            counter: Counter {
                last_number: 7,
                last_year: 2026,
            },
            settlements: Vec::new(),
        };
        let in_2026 = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        assert_eq!(state.next_settlement_id(in_2026), "SET-2026-0008");

        let in_2027 = Utc.with_ymd_and_hms(2027, 1, 2, 9, 0, 0).unwrap();
        assert_eq!(state.next_settlement_id(in_2027), "SET-2027-0001");
    }
}
