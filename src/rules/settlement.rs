//! Payment settlement: anything tendered above the job's final total is
//! proposed as tips, split evenly across the employees credited on the job.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{FieldErrors, Result, ShopError};
use crate::model::{Job, JobLine, NewPayment, NewTip, PaymentMethod};
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: String,
    pub name: String,
}

/// Employees assigned to any line, deduplicated by id in first-seen order.
pub fn employees_on_job(lines: &[JobLine]) -> Vec<Employee> {
    let mut seen = HashSet::new();
    let mut employees = Vec::new();

    for line in lines {
        for (idx, id) in line.assigned_employees.iter().enumerate() {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let name = line
                .assigned_employee_names
                .get(idx)
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .unwrap_or("Unknown");
            employees.push(Employee {
                id: id.clone(),
                name: name.to_string(),
            });
        }
    }

    employees
}

/// Amount tendered above what is due, never negative.
pub fn excess(final_total: Money, amount: Money) -> Money {
    if amount > final_total {
        amount - final_total
    } else {
        Money::ZERO
    }
}

/// Where the cents lost by an even split end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemainderPolicy {
    /// Every employee gets the same share; the leftover cents are reported.
    #[default]
    Unallocated,
    /// The first employee on the job absorbs the leftover cents.
    FirstEmployee,
    /// Leftover cents go one at a time to employees in job order.
    RoundRobin,
}

impl RemainderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemainderPolicy::Unallocated => "unallocated",
            RemainderPolicy::FirstEmployee => "first-employee",
            RemainderPolicy::RoundRobin => "round-robin",
        }
    }
}

/// Proposed tip per employee, editable before submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipAllocation {
    employees: Vec<Employee>,
    amounts: BTreeMap<String, Money>,
    excess: Money,
}

impl TipAllocation {
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn amount_for(&self, employee_id: &str) -> Option<Money> {
        self.amounts.get(employee_id).copied()
    }

    pub fn excess(&self) -> Money {
        self.excess
    }

    pub fn allocated(&self) -> Money {
        self.amounts.values().sum()
    }

    /// Excess not assigned to anyone. Negative when overrides exceed the excess.
    pub fn unallocated(&self) -> Money {
        self.excess - self.allocated()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Override one employee's tip. Zero or blank removes the entry.
    pub fn set(&mut self, employee_id: &str, amount: Option<Money>) -> Result<()> {
        let field = format!("tips.{employee_id}");
        if !self.employees.iter().any(|e| e.id == employee_id) {
            let mut errors = FieldErrors::new();
            errors.add(field, "Employee did not work on this job");
            return Err(ShopError::Validation(errors));
        }

        match amount {
            Some(value) if value.is_negative() => {
                let mut errors = FieldErrors::new();
                errors.add(field, "Tip cannot be negative");
                Err(ShopError::Validation(errors))
            }
            Some(value) if value.is_positive() => {
                self.amounts.insert(employee_id.to_string(), value);
                Ok(())
            }
            _ => {
                self.amounts.remove(employee_id);
                Ok(())
            }
        }
    }

    /// One create-tip body per employee with a strictly positive amount, in job order.
    pub fn submission(&self, job_id: &str) -> Vec<NewTip> {
        self.employees
            .iter()
            .filter_map(|e| {
                let amount = self.amounts.get(&e.id)?;
                amount.is_positive().then(|| NewTip {
                    job: job_id.to_string(),
                    employee: e.id.clone(),
                    amount: *amount,
                    notes: String::new(),
                })
            })
            .collect()
    }
}

/// Even split of the excess over `final_total` across `employees`.
///
/// Each share is the excess divided by the head count, rounded half away
/// from zero to cents. The rounding gap, which may be negative, goes where
/// `policy` says. A blank amount or no excess yields an empty proposal.
pub fn propose_tips(
    final_total: Money,
    amount: Option<Money>,
    employees: &[Employee],
    policy: RemainderPolicy,
) -> TipAllocation {
    let excess = amount.map_or(Money::ZERO, |a| excess(final_total, a));
    let mut allocation = TipAllocation {
        employees: employees.to_vec(),
        amounts: BTreeMap::new(),
        excess,
    };

    let Some(share) = excess.share(employees.len()) else {
        return allocation;
    };
    if !excess.is_positive() {
        return allocation;
    }

    let handed_out = share.checked_times(employees.len()).unwrap_or(excess);
    let mut leftover = excess - handed_out;
    let cent = if leftover.is_negative() {
        Money::from_cents(-1)
    } else {
        Money::from_cents(1)
    };

    for (idx, employee) in employees.iter().enumerate() {
        let mut tip = share;
        match policy {
            RemainderPolicy::Unallocated => {}
            RemainderPolicy::FirstEmployee if idx == 0 => {
                tip = tip + leftover;
                leftover = Money::ZERO;
            }
            RemainderPolicy::FirstEmployee => {}
            RemainderPolicy::RoundRobin if !leftover.is_zero() => {
                tip = tip + cent;
                leftover = leftover - cent;
            }
            RemainderPolicy::RoundRobin => {}
        }
        if tip.is_positive() {
            allocation.amounts.insert(employee.id.clone(), tip);
        }
    }

    allocation
}

/// Payment form as entered, before validation.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub amount: String,
    pub method: PaymentMethod,
    pub reference: String,
    pub notes: String,
}

impl PaymentDraft {
    /// The tendered amount if it parses, for live tip proposals.
    pub fn amount_value(&self) -> Option<Money> {
        Money::parse_optional("amount", &self.amount).ok().flatten()
    }

    pub fn validate(&self, job_id: &str) -> Result<NewPayment> {
        let mut errors = FieldErrors::new();
        let amount = self.check(&mut errors);
        errors.into_result()?;

        Ok(NewPayment {
            job: job_id.to_string(),
            payment_method: self.method,
            amount: amount.unwrap_or(Money::ZERO),
            reference_number: self.reference.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }

    fn check(&self, errors: &mut FieldErrors) -> Option<Money> {
        let amount = match Money::parse_optional("amount", &self.amount) {
            Ok(None) => {
                errors.add("amount", "Amount is required");
                None
            }
            Err(_) => {
                errors.add("amount", "Enter a valid amount");
                None
            }
            Ok(Some(value)) if !value.is_positive() => {
                errors.add("amount", "Amount must be greater than zero");
                None
            }
            Ok(Some(value)) => Some(value),
        };

        if self.method.requires_reference() && self.reference.trim().is_empty() {
            errors.add(
                "reference",
                format!("Reference is required for {} payments", self.method.label()),
            );
        }

        amount
    }
}

/// User override of one employee's proposed tip, written `employee=amount`.
#[derive(Debug, Clone, PartialEq)]
pub struct TipOverride {
    pub employee: String,
    pub amount: Option<Money>,
}

impl TipOverride {
    pub fn parse(input: &str) -> Result<TipOverride> {
        let (employee, amount) = input.split_once('=').ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.add("tips", format!("Expected 'employee=amount', got '{input}'"));
            ShopError::Validation(errors)
        })?;
        let employee = employee.trim().to_string();
        let amount = Money::parse_optional(&format!("tip for {employee}"), amount)?;
        Ok(TipOverride { employee, amount })
    }
}

/// Writes needed to settle a job: one payment and its tips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub payment: NewPayment,
    #[serde(default)]
    pub tips: Vec<NewTip>,
}

/// Validate the payment form and tip overrides against a job snapshot.
///
/// All field problems are reported together; nothing is sent on failure.
pub fn plan_settlement(
    job: &Job,
    draft: &PaymentDraft,
    overrides: &[TipOverride],
    policy: RemainderPolicy,
) -> Result<(SettlementPlan, TipAllocation)> {
    let employees = employees_on_job(&job.lines);
    let mut allocation = propose_tips(job.final_total, draft.amount_value(), &employees, policy);

    let mut errors = FieldErrors::new();
    let amount = draft.check(&mut errors);

    for o in overrides {
        if let Err(ShopError::Validation(fields)) = allocation.set(&o.employee, o.amount) {
            for (field, message) in fields.iter() {
                errors.add(field, message);
            }
        }
    }
    errors.into_result()?;

    let payment = NewPayment {
        job: job.id.clone(),
        payment_method: draft.method,
        amount: amount.unwrap_or(Money::ZERO),
        reference_number: draft.reference.trim().to_string(),
        notes: draft.notes.trim().to_string(),
    };
    let tips = allocation.submission(&job.id);

    Ok((SettlementPlan { payment, tips }, allocation))
}
