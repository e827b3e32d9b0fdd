//! Business rules applied to records fetched from the backend before a write
//! is issued. Everything here is a pure function of its inputs.

pub mod advance;
pub mod depreciation;
pub mod settlement;

pub use advance::{adjusted_payable, unrecovered_advances, AdvanceDraft};
pub use depreciation::depreciated_percentage;
pub use settlement::{
    employees_on_job, excess, plan_settlement, propose_tips, Employee, PaymentDraft,
    RemainderPolicy, SettlementPlan, TipAllocation, TipOverride,
};
