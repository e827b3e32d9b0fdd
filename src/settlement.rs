//! Payment, receipt and tips for one job, written as a recoverable sequence.
//!
//! The backend has no single endpoint for a settlement, so each write is
//! journalled locally as it succeeds. A crash or failure leaves a pending
//! record that `resume` completes or `abandon` compensates.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::Backend;
use crate::cache::{invalidations, QueryCache};
use crate::config::{load_state, save_state, RecordedTip, SettlementRecord};
use crate::error::{FieldErrors, Result, ShopError};
use crate::rules::SettlementPlan;

/// Where pending settlements are kept between runs.
pub trait SettlementJournal {
    /// Store a new record for `plan` under a fresh id.
    fn open(&mut self, plan: SettlementPlan, now: DateTime<Utc>) -> Result<SettlementRecord>;
    fn save(&mut self, record: &SettlementRecord) -> Result<()>;
    fn load(&self, id: &str) -> Result<Option<SettlementRecord>>;
    fn remove(&mut self, id: &str) -> Result<()>;
    fn pending(&self) -> Result<Vec<SettlementRecord>>;
}

/// Journal kept in `state.toml` inside the config directory.
pub struct FileJournal {
    cfg_dir: PathBuf,
}

impl FileJournal {
    pub fn new(cfg_dir: impl Into<PathBuf>) -> Self {
        Self {
            cfg_dir: cfg_dir.into(),
        }
    }
}

impl SettlementJournal for FileJournal {
    fn open(&mut self, plan: SettlementPlan, now: DateTime<Utc>) -> Result<SettlementRecord> {
        let mut state = load_state(&self.cfg_dir)?;
        let id = state.next_settlement_id(now);
        let record = SettlementRecord::new(id, now, plan);
        state.upsert_settlement(record.clone());
        save_state(&self.cfg_dir, &state)?;
        Ok(record)
    }

    fn save(&mut self, record: &SettlementRecord) -> Result<()> {
        let mut state = load_state(&self.cfg_dir)?;
        state.upsert_settlement(record.clone());
        save_state(&self.cfg_dir, &state)
    }

    fn load(&self, id: &str) -> Result<Option<SettlementRecord>> {
        Ok(load_state(&self.cfg_dir)?.settlement(id).cloned())
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        let mut state = load_state(&self.cfg_dir)?;
        if state.remove_settlement(id).is_some() {
            save_state(&self.cfg_dir, &state)?;
        }
        Ok(())
    }

    fn pending(&self) -> Result<Vec<SettlementRecord>> {
        Ok(load_state(&self.cfg_dir)?.settlements)
    }
}

/// What `abandon` undid and what it had to leave in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonReport {
    pub id: String,
    pub cancelled_tips: Vec<String>,
    pub deleted_payment: Option<String>,
    /// Payment kept because a receipt was issued against it.
    pub retained_payment: Option<String>,
    pub receipt: Option<String>,
}

pub struct Settler<'a, B: Backend, J: SettlementJournal> {
    backend: &'a B,
    journal: &'a mut J,
    cache: &'a mut QueryCache,
}

impl<'a, B: Backend, J: SettlementJournal> Settler<'a, B, J> {
    pub fn new(backend: &'a B, journal: &'a mut J, cache: &'a mut QueryCache) -> Self {
        Self {
            backend,
            journal,
            cache,
        }
    }

    /// Journal `plan`, then perform every write. Returns the completed record.
    pub fn run(&mut self, plan: SettlementPlan) -> Result<SettlementRecord> {
        check_plan(&plan)?;
        let record = self.journal.open(plan, Utc::now())?;
        info!(settlement = %record.id, job = record.job_id(), "settlement journalled");
        self.drive(record)
    }

    /// Perform only the writes a pending settlement is still missing.
    pub fn resume(&mut self, id: &str) -> Result<SettlementRecord> {
        let record = self
            .journal
            .load(id)?
            .ok_or_else(|| ShopError::SettlementNotFound(id.to_string()))?;
        info!(settlement = id, step = record.next_step(), "resuming settlement");
        self.drive(record)
    }

    /// Undo what a pending settlement wrote and drop it from the journal.
    pub fn abandon(&mut self, id: &str) -> Result<AbandonReport> {
        let mut record = self
            .journal
            .load(id)?
            .ok_or_else(|| ShopError::SettlementNotFound(id.to_string()))?;

        let mut report = AbandonReport {
            id: record.id.clone(),
            cancelled_tips: Vec::new(),
            deleted_payment: None,
            retained_payment: None,
            receipt: record.receipt_id.clone(),
        };

        while let Some(tip) = record.recorded_tips.first().cloned() {
            if let Err(err) = self.backend.cancel_tip(&tip.tip_id) {
                return Err(self.halt(&mut record, "cancel tip", err));
            }
            warn!(settlement = id, tip = %tip.tip_id, "tip cancelled");
            record.recorded_tips.remove(0);
            self.persist(&record, format!("cancellation of tip {}", tip.tip_id))?;
            report.cancelled_tips.push(tip.tip_id);
        }

        if let Some(payment_id) = record.payment_id.clone() {
            if record.receipt_id.is_some() {
                warn!(settlement = id, payment = %payment_id, "payment has a receipt; retained");
                report.retained_payment = Some(payment_id);
            } else {
                if let Err(err) = self.backend.delete_payment(&payment_id) {
                    return Err(self.halt(&mut record, "delete payment", err));
                }
                warn!(settlement = id, payment = %payment_id, "payment deleted");
                report.deleted_payment = Some(payment_id);
            }
        }

        self.journal.remove(id)?;
        let job = record.job_id().to_string();
        if report.deleted_payment.is_some() || !report.cancelled_tips.is_empty() {
            self.cache.invalidate_all(&invalidations::after_payment(&job));
            self.cache.invalidate_all(&invalidations::after_tips(&job));
        }
        Ok(report)
    }

    fn drive(&mut self, mut record: SettlementRecord) -> Result<SettlementRecord> {
        let payment_id = match record.payment_id.clone() {
            Some(id) => id,
            None => match self.backend.create_payment(&record.plan.payment) {
                Ok(payment) => {
                    record.payment_id = Some(payment.id.clone());
                    self.persist(&record, format!("payment {}", payment.id))?;
                    payment.id
                }
                Err(err) => return Err(self.halt(&mut record, "create payment", err)),
            },
        };

        if record.receipt_id.is_none() {
            match self.backend.generate_receipt(&payment_id) {
                Ok(receipt) => {
                    record.receipt_id = Some(receipt.id.clone());
                    self.persist(&record, format!("receipt {}", receipt.id))?;
                }
                Err(err) => return Err(self.halt(&mut record, "generate receipt", err)),
            }
        }

        let outstanding: Vec<_> = record
            .plan
            .tips
            .iter()
            .filter(|t| !record.tip_recorded(&t.employee))
            .cloned()
            .collect();
        for tip in outstanding {
            match self.backend.create_tip(&tip) {
                Ok(created) => {
                    let what = format!("tip {} for {}", created.id, tip.employee);
                    record.recorded_tips.push(RecordedTip {
                        employee: tip.employee.clone(),
                        tip_id: created.id,
                    });
                    self.persist(&record, what)?;
                }
                Err(err) => {
                    let step = format!("record tip for {}", tip.employee);
                    return Err(self.halt(&mut record, &step, err));
                }
            }
        }

        record.last_error = None;
        self.journal.remove(&record.id)?;

        let job = record.job_id().to_string();
        let mut stale = self.cache.invalidate_all(&invalidations::after_payment(&job));
        if !record.plan.tips.is_empty() {
            stale += self.cache.invalidate_all(&invalidations::after_tips(&job));
        }
        info!(settlement = %record.id, job = %job, stale, "settlement complete");
        Ok(record)
    }

    /// Journal progress after a backend write. If that fails the write is
    /// not repeated; the error names what was created so it can be reconciled.
    fn persist(&mut self, record: &SettlementRecord, created: String) -> Result<()> {
        self.journal.save(record).map_err(|err| {
            warn!(settlement = %record.id, created = %created, error = %err, "backend write not journalled");
            ShopError::SettlementUnjournalled {
                id: record.id.clone(),
                created,
                reason: err.to_string(),
            }
        })
    }

    /// Remember the failure on the record and turn it into the resumable error.
    fn halt(&mut self, record: &mut SettlementRecord, step: &str, err: ShopError) -> ShopError {
        let reason = err.to_string();
        record.last_error = Some(format!("{step}: {reason}"));
        if let Err(save_err) = self.journal.save(record) {
            warn!(settlement = %record.id, error = %save_err, "could not journal failure");
        }
        warn!(settlement = %record.id, step, error = %reason, "settlement halted");
        ShopError::SettlementIncomplete {
            id: record.id.clone(),
            step: step.to_string(),
            reason,
        }
    }
}

/// A plan that would write a non-positive amount never reaches the backend.
fn check_plan(plan: &SettlementPlan) -> Result<()> {
    let mut errors = FieldErrors::new();
    if !plan.payment.amount.is_positive() {
        errors.add("amount", "Amount must be greater than zero");
    }
    for tip in &plan.tips {
        if !tip.amount.is_positive() {
            errors.add(format!("tips.{}", tip.employee), "Tip must be greater than zero");
        }
        if tip.job != plan.payment.job {
            errors.add(format!("tips.{}", tip.employee), "Tip belongs to a different job");
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Entity, QueryKey};
    use crate::model::{
        AdvancePayment, Asset, CommissionSummary, Expense, ExpenseAction, Invoice, Job,
        JobStatus, NewAdvance, NewPayment, NewTip, Payment, PaymentMethod, PaymentStatus,
        Receipt, Tip, TipStatus,
    };
    use crate::money::Money;
    use std::cell::RefCell;
    use std::collections::HashSet;

    #[derive(Default)]
    struct MemoryJournal {
        seq: u32,
        records: Vec<SettlementRecord>,
        read_only: bool,
    }

    impl SettlementJournal for MemoryJournal {
        fn open(&mut self, plan: SettlementPlan, now: DateTime<Utc>) -> Result<SettlementRecord> {
            self.seq += 1;
            let record = SettlementRecord::new(format!("SET-TEST-{:04}", self.seq), now, plan);
            self.records.push(record.clone());
            Ok(record)
        }

        fn save(&mut self, record: &SettlementRecord) -> Result<()> {
            if self.read_only {
                return Err(ShopError::StateWrite("disk full".into()));
            }
            match self.records.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => *slot = record.clone(),
                None => self.records.push(record.clone()),
            }
            Ok(())
        }

        fn load(&self, id: &str) -> Result<Option<SettlementRecord>> {
            Ok(self.records.iter().find(|r| r.id == id).cloned())
        }

        fn remove(&mut self, id: &str) -> Result<()> {
            self.records.retain(|r| r.id != id);
            Ok(())
        }

        fn pending(&self) -> Result<Vec<SettlementRecord>> {
            Ok(self.records.clone())
        }
    }

    /// Records every write; calls named in `failing` return a server error.
    #[derive(Default)]
    struct FakeBackend {
        calls: RefCell<Vec<String>>,
        failing: RefCell<HashSet<String>>,
    }

    impl FakeBackend {
        fn fail(&self, call: &str) {
            self.failing.borrow_mut().insert(call.to_string());
        }

        fn heal(&self) {
            self.failing.borrow_mut().clear();
        }

        fn record(&self, call: String) -> Result<()> {
            let name = call.split(' ').next().unwrap_or_default().to_string();
            if self.failing.borrow().contains(&name) || self.failing.borrow().contains(&call) {
                return Err(ShopError::Server {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.calls.borrow_mut().push(call);
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Backend for FakeBackend {
        fn job(&self, _: &str) -> Result<Job> {
            unreachable!()
        }
        fn commission_summary(&self, _: &str) -> Result<Option<CommissionSummary>> {
            unreachable!()
        }
        fn advances(&self, _: &str) -> Result<Vec<AdvancePayment>> {
            unreachable!()
        }
        fn asset(&self, _: &str) -> Result<Asset> {
            unreachable!()
        }
        fn invoice(&self, _: &str) -> Result<Invoice> {
            unreachable!()
        }
        fn receipt(&self, _: &str) -> Result<Receipt> {
            unreachable!()
        }

        fn create_payment(&self, payment: &NewPayment) -> Result<Payment> {
            self.record(format!("create_payment {}", payment.amount))?;
            Ok(Payment {
                id: "p1".into(),
                job: payment.job.clone(),
                payment_method: payment.payment_method,
                amount: payment.amount,
                reference_number: payment.reference_number.clone(),
                status: PaymentStatus::Completed,
                notes: String::new(),
            })
        }

        fn delete_payment(&self, payment_id: &str) -> Result<()> {
            self.record(format!("delete_payment {payment_id}"))
        }

        fn generate_receipt(&self, payment_id: &str) -> Result<Receipt> {
            self.record(format!("generate_receipt {payment_id}"))?;
            Ok(Receipt {
                id: "r1".into(),
                receipt_number: "RCP-0001".into(),
                job: "j1".into(),
                job_number: None,
                customer_name: None,
                invoice_number: None,
                payment: payment_id.to_string(),
                amount_paid: Money::new(130, 0),
                payment_method: PaymentMethod::Cash,
                payment_reference: String::new(),
                notes: String::new(),
                issued_by_name: None,
                issued_at: None,
            })
        }

        fn create_tip(&self, tip: &NewTip) -> Result<Tip> {
            self.record(format!("create_tip {}", tip.employee))?;
            Ok(Tip {
                id: format!("t-{}", tip.employee),
                job: tip.job.clone(),
                employee: tip.employee.clone(),
                employee_name: None,
                amount: tip.amount,
                status: TipStatus::Pending,
            })
        }

        fn cancel_tip(&self, tip_id: &str) -> Result<Tip> {
            self.record(format!("cancel_tip {tip_id}"))?;
            Ok(Tip {
                id: tip_id.to_string(),
                job: "j1".into(),
                employee: String::new(),
                employee_name: None,
                amount: Money::ZERO,
                status: TipStatus::Cancelled,
            })
        }

        fn create_advance(&self, _: &NewAdvance) -> Result<AdvancePayment> {
            unreachable!()
        }
        fn expense_action(&self, _: &str, _: ExpenseAction) -> Result<Expense> {
            unreachable!()
        }
        fn update_job_status(&self, _: &str, _: JobStatus) -> Result<Job> {
            unreachable!()
        }
    }

    fn tip(employee: &str, amount: Money) -> NewTip {
        NewTip {
            job: "j1".into(),
            employee: employee.into(),
            amount,
            notes: String::new(),
        }
    }

    fn plan(amount: Money) -> SettlementPlan {
        SettlementPlan {
            payment: NewPayment {
                job: "j1".into(),
                payment_method: PaymentMethod::Cash,
                amount,
                reference_number: String::new(),
                notes: String::new(),
            },
            tips: vec![tip("e1", Money::new(15, 0)), tip("e2", Money::new(15, 0))],
        }
    }

    #[test]
    fn writes_payment_then_receipt_then_tips() {
        let backend = FakeBackend::default();
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();
        cache.insert(QueryKey::job("j1"), &"stale soon").unwrap();
        cache
            .insert(QueryKey::new(Entity::ReceiptList).with("job", "j1"), &0)
            .unwrap();

        let done = Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                "create_payment 130.00",
                "generate_receipt p1",
                "create_tip e1",
                "create_tip e2"
            ]
        );
        assert!(done.is_complete());
        assert!(journal.records.is_empty());
        assert!(cache.is_stale(&QueryKey::job("j1")));
        assert!(cache.is_stale(&QueryKey::new(Entity::ReceiptList).with("job", "j1")));
    }

    #[test]
    fn non_positive_amount_never_writes() {
        let backend = FakeBackend::default();
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        for amount in [Money::ZERO, Money::new(-5, 0)] {
            let err = Settler::new(&backend, &mut journal, &mut cache)
                .run(plan(amount))
                .unwrap_err();
            assert!(err.field_errors().unwrap().contains("amount"));
        }
        assert!(backend.calls().is_empty());
        assert!(journal.records.is_empty());
    }

    #[test]
    fn failed_tip_leaves_a_resumable_record() {
        let backend = FakeBackend::default();
        backend.fail("create_tip e2");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        let err = Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        let id = match err {
            ShopError::SettlementIncomplete { id, step, .. } => {
                assert_eq!(step, "record tip for e2");
                id
            }
            other => panic!("unexpected {other:?}"),
        };

        let pending = journal.load(&id).unwrap().unwrap();
        assert_eq!(pending.payment_id.as_deref(), Some("p1"));
        assert_eq!(pending.receipt_id.as_deref(), Some("r1"));
        assert!(pending.tip_recorded("e1"));
        assert!(pending.last_error.as_deref().unwrap().starts_with("record tip for e2"));

        backend.heal();
        let done = Settler::new(&backend, &mut journal, &mut cache)
            .resume(&id)
            .unwrap();
        assert!(done.is_complete());
        // Only the missing tip is written on resume.
        assert_eq!(
            backend.calls(),
            vec![
                "create_payment 130.00",
                "generate_receipt p1",
                "create_tip e1",
                "create_tip e2"
            ]
        );
        assert!(journal.records.is_empty());
    }

    #[test]
    fn resume_after_payment_failure_starts_over_at_payment() {
        let backend = FakeBackend::default();
        backend.fail("create_payment");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        let err = Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        assert!(matches!(err, ShopError::SettlementIncomplete { ref step, .. } if step == "create payment"));
        assert_eq!(journal.records.len(), 1);
        assert!(backend.calls().is_empty());

        backend.heal();
        let id = journal.records[0].id.clone();
        Settler::new(&backend, &mut journal, &mut cache)
            .resume(&id)
            .unwrap();
        assert_eq!(backend.calls().len(), 4);
    }

    #[test]
    fn unjournalled_payment_is_reported_not_repeated() {
        let backend = FakeBackend::default();
        let mut journal = MemoryJournal {
            read_only: true,
            ..Default::default()
        };
        let mut cache = QueryCache::new();

        let err = Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        match &err {
            ShopError::SettlementUnjournalled { created, reason, .. } => {
                assert_eq!(created, "payment p1");
                assert!(reason.contains("disk full"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("payment p1"));
        assert!(!err.is_retryable());
        assert_eq!(backend.calls(), vec!["create_payment 130.00"]);
    }

    #[test]
    fn unjournalled_tip_stops_before_the_next_write() {
        let backend = FakeBackend::default();
        backend.fail("create_tip e2");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        let id = journal.records[0].id.clone();

        backend.heal();
        journal.read_only = true;
        let err = Settler::new(&backend, &mut journal, &mut cache)
            .resume(&id)
            .unwrap_err();
        assert!(matches!(err, ShopError::SettlementUnjournalled { ref created, .. } if created == "tip t-e2 for e2"));
        assert_eq!(backend.calls().iter().filter(|c| c.starts_with("create_tip e2")).count(), 1);
    }

    #[test]
    fn abandon_before_receipt_deletes_payment() {
        let backend = FakeBackend::default();
        backend.fail("generate_receipt");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        let id = journal.records[0].id.clone();

        let report = Settler::new(&backend, &mut journal, &mut cache)
            .abandon(&id)
            .unwrap();
        assert_eq!(report.deleted_payment.as_deref(), Some("p1"));
        assert!(report.retained_payment.is_none());
        assert!(journal.records.is_empty());
        assert_eq!(backend.calls(), vec!["create_payment 130.00", "delete_payment p1"]);
    }

    #[test]
    fn abandon_after_receipt_cancels_tips_and_keeps_payment() {
        let backend = FakeBackend::default();
        backend.fail("create_tip e2");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        let id = journal.records[0].id.clone();

        let report = Settler::new(&backend, &mut journal, &mut cache)
            .abandon(&id)
            .unwrap();
        assert_eq!(report.cancelled_tips, vec!["t-e1".to_string()]);
        assert_eq!(report.retained_payment.as_deref(), Some("p1"));
        assert_eq!(report.receipt.as_deref(), Some("r1"));
        assert!(report.deleted_payment.is_none());
        assert!(backend.calls().contains(&"cancel_tip t-e1".to_string()));
        assert!(journal.records.is_empty());
    }

    #[test]
    fn failed_compensation_keeps_the_record() {
        let backend = FakeBackend::default();
        backend.fail("generate_receipt");
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();

        Settler::new(&backend, &mut journal, &mut cache)
            .run(plan(Money::new(130, 0)))
            .unwrap_err();
        let id = journal.records[0].id.clone();

        backend.fail("delete_payment");
        let err = Settler::new(&backend, &mut journal, &mut cache)
            .abandon(&id)
            .unwrap_err();
        assert!(matches!(err, ShopError::SettlementIncomplete { ref step, .. } if step == "delete payment"));
        assert_eq!(journal.records.len(), 1);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let backend = FakeBackend::default();
        let mut journal = MemoryJournal::default();
        let mut cache = QueryCache::new();
        let mut settler = Settler::new(&backend, &mut journal, &mut cache);
        assert!(matches!(settler.resume("SET-1"), Err(ShopError::SettlementNotFound(_))));
        assert!(matches!(settler.abandon("SET-1"), Err(ShopError::SettlementNotFound(_))));
    }

    #[test]
    fn file_journal_persists_progress() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut journal = FileJournal::new(dir.path());
        let mut record = journal.open(plan(Money::new(130, 0)), Utc::now()).unwrap();
        record.payment_id = Some("p1".into());
        journal.save(&record).unwrap();

        let reopened = FileJournal::new(dir.path());
        let loaded = reopened.load(&record.id).unwrap().unwrap();
        assert_eq!(loaded.payment_id.as_deref(), Some("p1"));
        assert_eq!(loaded.next_step(), "generate receipt");
        assert_eq!(reopened.pending().unwrap().len(), 1);

        journal.remove(&record.id).unwrap();
        assert!(journal.pending().unwrap().is_empty());
    }
}
