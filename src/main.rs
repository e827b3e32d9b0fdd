use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;

use timax::api::{Backend, HttpBackend};
use timax::cache::{invalidations, QueryCache, QueryKey};
use timax::config::{
    config_dir, ensure_initialized, load_config, load_state, resolve_output_dir, Config,
    CONFIG_TEMPLATE,
};
use timax::document;
use timax::error::{FieldErrors, Result, ShopError};
use timax::logging::init_logging;
use timax::model::{Badged, ExpenseAction, Job, JobStatus, PaymentMethod};
use timax::money::Money;
use timax::rules::{
    adjusted_payable, plan_settlement, unrecovered_advances, AdvanceDraft, PaymentDraft,
    SettlementPlan, TipAllocation, TipOverride,
};
use timax::settlement::{FileJournal, SettlementJournal, Settler};

#[derive(Parser)]
#[command(name = "timax")]
#[command(
    version,
    about = "Service shop back-office CLI: job settlement, advances and printable documents",
    long_about = None
)]
struct Cli {
    /// Path to config directory (default: platform config dir or ~/.timax)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug); TIMAX_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Show configuration and pending settlements
    Status,

    /// Show a job with its lines and balance
    Job {
        /// Job id
        id: String,
    },

    /// Move a job to another status (e.g. in-progress, qc, invoiced)
    JobStatus {
        /// Job id
        id: String,

        /// New status
        status: JobStatus,
    },

    /// Record a payment for a job, issue its receipt and split any excess as tips
    Settle {
        /// Job id
        job: String,

        /// Amount tendered
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,

        /// Payment method: cash, card, mobile-money, bank-transfer, cheque, credit
        #[arg(short, long, default_value = "cash")]
        method: PaymentMethod,

        /// Reference number (required for card, bank transfer and cheque)
        #[arg(short, long, default_value = "")]
        reference: String,

        /// Payment notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Override one employee's tip, "employee=amount" (blank or 0 removes it)
        #[arg(short, long = "tip", value_name = "EMPLOYEE=AMOUNT")]
        tips: Vec<String>,

        /// Show the plan without sending anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List settlements that did not finish
    Settlements,

    /// Finish a pending settlement
    Resume {
        /// Settlement id (e.g. SET-2026-0001)
        id: String,
    },

    /// Undo what a pending settlement wrote and forget it
    Abandon {
        /// Settlement id (e.g. SET-2026-0001)
        id: String,
    },

    /// Show an employee's commissions, advances and advance limit
    Commissions {
        /// Employee id
        employee: String,
    },

    /// Request a salary advance against payable commission
    Advance {
        /// Employee id
        employee: String,

        /// Requested amount
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,

        /// Reason for the advance
        #[arg(long, default_value = "")]
        reason: String,

        /// Payout method
        #[arg(short, long, default_value = "cash")]
        method: PaymentMethod,

        /// Payout reference (required for card, bank transfer and cheque)
        #[arg(short, long, default_value = "")]
        reference: String,
    },

    /// Approve, reject or mark an expense paid
    Expense {
        /// Expense id
        id: String,

        /// approve, reject or mark-paid
        action: ExpenseAction,
    },

    /// Show an asset's book value and depreciation
    Asset {
        /// Asset id
        id: String,
    },

    /// Generate a PDF document
    Document {
        kind: DocumentKind,

        /// Job, invoice or receipt id
        id: String,

        /// Custom output file path (default: output_dir/<number>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Build an email or WhatsApp link to send an invoice or receipt
    Share {
        kind: ShareKind,

        /// Invoice or receipt id
        id: String,

        #[arg(long, value_enum)]
        via: Channel,

        /// Email address or phone number
        #[arg(long)]
        to: String,

        /// Open the link with the system handler
        #[arg(long)]
        open: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DocumentKind {
    JobCard,
    Invoice,
    Receipt,
}

#[derive(Clone, Copy, ValueEnum)]
enum ShareKind {
    Invoice,
    Receipt,
}

#[derive(Clone, Copy, ValueEnum)]
enum Channel {
    Email,
    Whatsapp,
}

fn main() {
    if let Err(e) = run() {
        report(&e);
        std::process::exit(1);
    }
}

/// Field errors are listed one per line under the headline.
fn report(e: &ShopError) {
    match e {
        ShopError::Validation(fields) => {
            eprintln!("Error: please correct the following");
            for (field, message) in fields.iter() {
                eprintln!("  {field}: {message}");
            }
        }
        ShopError::Rejected { fields, .. } if !fields.is_empty() => {
            eprintln!("Error: {e}");
            for (field, message) in fields.iter() {
                eprintln!("  {field}: {message}");
            }
        }
        _ => eprintln!("Error: {e}"),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Job { id } => cmd_job(&cfg_dir, &id),
        Commands::JobStatus { id, status } => cmd_job_status(&cfg_dir, &id, status),
        Commands::Settle {
            job,
            amount,
            method,
            reference,
            notes,
            tips,
            dry_run,
        } => {
            let draft = PaymentDraft {
                amount,
                method,
                reference,
                notes,
            };
            cmd_settle(&cfg_dir, &job, &draft, &tips, dry_run)
        }
        Commands::Settlements => cmd_settlements(&cfg_dir),
        Commands::Resume { id } => cmd_resume(&cfg_dir, &id),
        Commands::Abandon { id } => cmd_abandon(&cfg_dir, &id),
        Commands::Commissions { employee } => cmd_commissions(&cfg_dir, &employee),
        Commands::Advance {
            employee,
            amount,
            reason,
            method,
            reference,
        } => {
            let draft = AdvanceDraft {
                employee,
                amount,
                reason,
                method,
                reference,
            };
            cmd_advance(&cfg_dir, &draft)
        }
        Commands::Expense { id, action } => cmd_expense(&cfg_dir, &id, action),
        Commands::Asset { id } => cmd_asset(&cfg_dir, &id),
        Commands::Document {
            kind,
            id,
            output,
            open,
        } => cmd_document(&cfg_dir, kind, &id, output, open),
        Commands::Share {
            kind,
            id,
            via,
            to,
            open,
        } => cmd_share(&cfg_dir, kind, &id, via, &to, open),
    }
}

/// Initialize config directory
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ShopError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized timax config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set the company and backend:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Export your API token:        export TIMAX_API_TOKEN=...");
    println!();
    println!("Then settle a job:");
    println!("  timax settle <job-id> --amount <amount> --method cash");

    Ok(())
}

/// Load config and open the backend it points at.
fn connect(cfg_dir: &Path) -> Result<(Config, HttpBackend)> {
    ensure_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let backend = HttpBackend::new(&config.api);
    Ok((config, backend))
}

fn fetch_job(backend: &HttpBackend, cache: &mut QueryCache, id: &str) -> Result<Job> {
    cache.get_or_fetch(QueryKey::job(id), || backend.job(id))
}

fn money(config: &Config, value: Money) -> String {
    format!("{}{}", config.documents.currency_symbol, value.grouped())
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Show configuration and pending settlements
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let company = config.company.resolved();
    let pending = state.settlements.len();
    // Preview only; the counter is not saved here.
    let next_id = state.next_settlement_id(Utc::now());

    println!("Timax Status");
    println!("{}", "-".repeat(50));
    println!("Config directory:    {}", cfg_dir.display());
    println!("Company:             {}", company.name);
    println!("Tagline:             {}", company.tagline);
    println!("Backend:             {}", config.api.base_url);
    println!(
        "API token:           {}",
        if config.api.resolved_token().is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    println!("Tip remainder:       {}", config.tips.remainder.as_str());
    println!(
        "Output directory:    {}",
        resolve_output_dir(&config.documents.output_dir, cfg_dir).display()
    );
    println!("Pending settlements: {pending}");
    println!("Next settlement id:  {next_id}");

    if pending > 0 {
        println!();
        println!("Run 'timax settlements' to review them.");
    }

    Ok(())
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "STAFF")]
    staff: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "DONE")]
    done: String,
}

fn print_job(config: &Config, job: &Job) {
    println!("Job {}  {}", job.reference(), job.status.badge());
    println!("{}", "-".repeat(50));
    if let Some(customer) = &job.customer_name {
        println!("Customer:    {customer}");
    }
    if let Some(vehicle) = &job.vehicle_display {
        println!("Vehicle:     {vehicle}");
    }
    if let Some(technician) = &job.technician_name {
        println!("Technician:  {technician}");
    }

    if !job.lines.is_empty() {
        let rows: Vec<LineRow> = job
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| LineRow {
                index: i + 1,
                description: line.description(),
                staff: line.assigned_employee_names.join(", "),
                quantity: line.quantity.normalize().to_string(),
                amount: money(config, line.total_amount),
                done: if line.is_completed { "yes" } else { "" }.to_string(),
            })
            .collect();
        print_table(rows);
    }

    println!("Final total: {}", money(config, job.final_total));
    println!("Paid:        {}", money(config, job.payments_total));
    println!("Balance due: {}", money(config, job.balance_due));
}

/// Show a job
fn cmd_job(cfg_dir: &Path, id: &str) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let job = fetch_job(&backend, &mut cache, id)?;
    print_job(&config, &job);
    Ok(())
}

/// Change a job's status and show the job as the backend now has it
fn cmd_job_status(cfg_dir: &Path, id: &str, status: JobStatus) -> Result<()> {
    if !status.is_requestable() {
        let mut errors = FieldErrors::new();
        errors.add("status", format!("{status} is set by the backend and cannot be requested"));
        return Err(ShopError::Validation(errors));
    }

    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let before = fetch_job(&backend, &mut cache, id)?.status;
    backend.update_job_status(id, status)?;
    cache.invalidate_all(&invalidations::after_job_status(id));

    let job = fetch_job(&backend, &mut cache, id)?;
    println!("Status: {} -> {}", before.badge(), job.status.badge());
    println!();
    print_job(&config, &job);
    Ok(())
}

#[derive(Tabled)]
struct TipRow {
    #[tabled(rename = "EMPLOYEE")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TIP")]
    tip: String,
}

fn print_plan(config: &Config, job: &Job, plan: &SettlementPlan, allocation: &TipAllocation) {
    println!(
        "Payment:     {} by {} for job {}",
        money(config, plan.payment.amount),
        plan.payment.payment_method.label(),
        job.reference()
    );
    println!("Final total: {}", money(config, job.final_total));

    if allocation.excess().is_zero() {
        println!("No excess over the final total; no tips.");
        return;
    }

    println!("Excess:      {}", money(config, allocation.excess()));
    if allocation.employees().is_empty() {
        println!("No employees are assigned to this job; the excess is not allocated.");
    } else {
        let rows: Vec<TipRow> = allocation
            .employees()
            .iter()
            .map(|e| TipRow {
                id: e.id.clone(),
                name: e.name.clone(),
                tip: allocation
                    .amount_for(&e.id)
                    .map(|m| money(config, m))
                    .unwrap_or_else(|| "-".to_string()),
            })
            .collect();
        print_table(rows);
    }
    if !allocation.unallocated().is_zero() {
        println!(
            "Unallocated: {} (not recorded as a tip)",
            money(config, allocation.unallocated())
        );
    }
}

/// Settle a job: payment, receipt, tips
fn cmd_settle(
    cfg_dir: &Path,
    job_id: &str,
    draft: &PaymentDraft,
    tips: &[String],
    dry_run: bool,
) -> Result<()> {
    // Form problems are reported before any request is made.
    draft.validate(job_id)?;
    let overrides = tips
        .iter()
        .map(|t| TipOverride::parse(t))
        .collect::<Result<Vec<_>>>()?;

    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let job = fetch_job(&backend, &mut cache, job_id)?;
    let (plan, allocation) = plan_settlement(&job, draft, &overrides, config.tips.remainder)?;

    print_plan(&config, &job, &plan, &allocation);
    if dry_run {
        println!();
        println!("Dry run: nothing was sent.");
        return Ok(());
    }

    let mut journal = FileJournal::new(cfg_dir);
    let record = Settler::new(&backend, &mut journal, &mut cache).run(plan)?;

    println!();
    println!("Settlement {} complete", record.id);
    if let Some(payment) = &record.payment_id {
        println!("  Payment:  {payment}");
    }
    if let Some(receipt) = &record.receipt_id {
        println!("  Receipt:  {receipt}  (timax document receipt {receipt})");
    }
    println!("  Tips:     {}", record.recorded_tips.len());

    match fetch_job(&backend, &mut cache, job_id) {
        Ok(job) => println!("Balance due now: {}", money(&config, job.balance_due)),
        Err(e) => warn!(job = job_id, error = %e, "could not refresh job"),
    }

    Ok(())
}

#[derive(Tabled)]
struct SettlementRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "JOB")]
    job: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "TIPS")]
    tips: String,
    #[tabled(rename = "NEXT STEP")]
    next_step: String,
    #[tabled(rename = "LAST ERROR")]
    last_error: String,
}

/// List pending settlements
fn cmd_settlements(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    let journal = FileJournal::new(cfg_dir);
    let pending = journal.pending()?;

    if pending.is_empty() {
        println!("No pending settlements.");
        return Ok(());
    }

    let rows: Vec<SettlementRow> = pending
        .iter()
        .map(|r| SettlementRow {
            id: r.id.clone(),
            created: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
            job: r.job_id().to_string(),
            amount: format!("{}", r.plan.payment.amount),
            tips: format!("{}/{}", r.recorded_tips.len(), r.plan.tips.len()),
            next_step: r.next_step().to_string(),
            last_error: r.last_error.clone().unwrap_or_default(),
        })
        .collect();
    print_table(rows);

    println!();
    println!("Use 'timax resume <id>' to finish or 'timax abandon <id>' to undo.");
    Ok(())
}

/// Finish a pending settlement
fn cmd_resume(cfg_dir: &Path, id: &str) -> Result<()> {
    let (_, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let mut journal = FileJournal::new(cfg_dir);
    let record = Settler::new(&backend, &mut journal, &mut cache).resume(id)?;
    println!("Settlement {} complete", record.id);
    Ok(())
}

/// Undo a pending settlement
fn cmd_abandon(cfg_dir: &Path, id: &str) -> Result<()> {
    let (_, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let mut journal = FileJournal::new(cfg_dir);
    let report = Settler::new(&backend, &mut journal, &mut cache).abandon(id)?;

    println!("Settlement {} abandoned", report.id);
    for tip in &report.cancelled_tips {
        println!("  Cancelled tip {tip}");
    }
    if let Some(payment) = &report.deleted_payment {
        println!("  Deleted payment {payment}");
    }
    if let Some(payment) = &report.retained_payment {
        println!(
            "  Payment {payment} was kept: receipt {} was already issued for it",
            report.receipt.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

#[derive(Tabled)]
struct AdvanceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "REQUESTED")]
    requested: String,
    #[tabled(rename = "APPROVED")]
    approved: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "REASON")]
    reason: String,
}

/// Show commissions and advance limit for an employee
fn cmd_commissions(cfg_dir: &Path, employee: &str) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let summary = cache.get_or_fetch(QueryKey::commission_summary(employee), || {
        backend.commission_summary(employee)
    })?;
    let advances = cache.get_or_fetch(QueryKey::advances(employee), || backend.advances(employee))?;

    let payable = summary.as_ref().map_or(Money::ZERO, |s| s.total_payable);
    let unrecovered = unrecovered_advances(&advances);

    match &summary {
        Some(s) => {
            let name = if s.employee_name.is_empty() {
                employee
            } else {
                s.employee_name.as_str()
            };
            println!("Commissions for {name}");
            println!("{}", "-".repeat(50));
            println!("Available:   {} ({})", money(&config, s.total_available), s.count_available);
            println!("Payable:     {} ({})", money(&config, s.total_payable), s.count_payable);
            println!("Paid:        {} ({})", money(&config, s.total_paid), s.count_paid);
        }
        None => {
            println!("No commissions recorded for {employee}");
            println!("{}", "-".repeat(50));
        }
    }
    println!("Unrecovered advances: {}", money(&config, unrecovered));
    println!(
        "Advance limit:        {}",
        money(&config, adjusted_payable(payable, unrecovered))
    );

    if !advances.is_empty() {
        println!();
        let rows: Vec<AdvanceRow> = advances
            .iter()
            .map(|a| AdvanceRow {
                id: a.id.clone(),
                requested: money(&config, a.requested_amount),
                approved: money(&config, a.approved_amount),
                status: a.status.badge().to_string(),
                reason: a.reason.clone(),
            })
            .collect();
        print_table(rows);
    }

    Ok(())
}

/// Request an advance for an employee
fn cmd_advance(cfg_dir: &Path, draft: &AdvanceDraft) -> Result<()> {
    // Problems that do not depend on the limit are reported before any request.
    draft.validate(Money::from_decimal(Decimal::MAX))?;

    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let employee = draft.employee.as_str();
    let summary = cache.get_or_fetch(QueryKey::commission_summary(employee), || {
        backend.commission_summary(employee)
    })?;
    let advances = cache.get_or_fetch(QueryKey::advances(employee), || backend.advances(employee))?;

    let payable = summary.map_or(Money::ZERO, |s| s.total_payable);
    let limit = adjusted_payable(payable, unrecovered_advances(&advances));
    let request = draft.validate(limit)?;

    let created = backend.create_advance(&request)?;
    cache.invalidate_all(&invalidations::after_advance(employee));

    println!(
        "Advance {} for {} requested: {}",
        created.id,
        created.employee_name.as_deref().unwrap_or(employee),
        created.status.badge()
    );
    println!("Amount: {}", money(&config, created.requested_amount));

    let summary = cache.get_or_fetch(QueryKey::commission_summary(employee), || {
        backend.commission_summary(employee)
    })?;
    let advances = cache.get_or_fetch(QueryKey::advances(employee), || backend.advances(employee))?;
    let payable = summary.map_or(Money::ZERO, |s| s.total_payable);
    println!(
        "Advance limit now: {}",
        money(&config, adjusted_payable(payable, unrecovered_advances(&advances)))
    );
    Ok(())
}

/// Apply an expense workflow action
fn cmd_expense(cfg_dir: &Path, id: &str, action: ExpenseAction) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let expense = backend.expense_action(id, action)?;

    let label = if expense.expense_number.is_empty() {
        expense.id.as_str()
    } else {
        expense.expense_number.as_str()
    };
    println!(
        "Expense {label} ({}) is now {}",
        money(&config, expense.amount),
        expense.status.badge()
    );
    Ok(())
}

/// Show an asset
fn cmd_asset(cfg_dir: &Path, id: &str) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let mut cache = QueryCache::new();
    let asset = cache.get_or_fetch(QueryKey::asset(id), || backend.asset(id))?;

    println!("{} {}", asset.asset_number, asset.name);
    println!("{}", "-".repeat(50));
    if let Some(date) = asset.purchase_date {
        println!("Purchased:          {}", date.format("%Y-%m-%d"));
    }
    println!("Purchase cost:      {}", money(&config, asset.purchase_cost));
    println!(
        "Accumulated dep.:   {}",
        money(&config, asset.accumulated_depreciation)
    );
    println!("Book value:         {}", money(&config, asset.current_book_value));
    println!("Depreciated:        {}%", asset.depreciated_percentage());
    Ok(())
}

/// Generate a PDF document
fn cmd_document(
    cfg_dir: &Path,
    kind: DocumentKind,
    id: &str,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let output_dir = resolve_output_dir(&config.documents.output_dir, cfg_dir);
    let target = |number: &str| {
        output
            .clone()
            .unwrap_or_else(|| output_dir.join(format!("{number}.pdf")))
    };

    let pdf_path = match kind {
        DocumentKind::JobCard => {
            let job = backend.job(id)?;
            let doc = document::job_card(&config.company, &job, &config.documents);
            let path = target(&doc.number);
            prepare_parent(&path)?;
            document::generate_job_card_pdf(&doc, &path)?;
            path
        }
        DocumentKind::Invoice => {
            let invoice = backend.invoice(id)?;
            let job = match backend.job(&invoice.job) {
                Ok(job) => Some(job),
                Err(e) => {
                    warn!(job = %invoice.job, error = %e, "invoice printed without line items");
                    None
                }
            };
            let doc = document::invoice(&config.company, &invoice, job.as_ref(), &config.documents);
            let path = target(&doc.number);
            prepare_parent(&path)?;
            document::generate_invoice_pdf(&doc, &path)?;
            path
        }
        DocumentKind::Receipt => {
            let receipt = backend.receipt(id)?;
            let doc = document::receipt(&config.company, &receipt, &config.documents);
            let path = target(&doc.number);
            prepare_parent(&path)?;
            document::generate_receipt_pdf(&doc, &path)?;
            path
        }
    };

    println!("Generated: {}", pdf_path.display());
    if open {
        open_path(&pdf_path)?;
    }
    Ok(())
}

fn prepare_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Build a share link for an invoice or receipt
fn cmd_share(
    cfg_dir: &Path,
    kind: ShareKind,
    id: &str,
    via: Channel,
    to: &str,
    open: bool,
) -> Result<()> {
    let (config, backend) = connect(cfg_dir)?;
    let (subject, body) = match kind {
        ShareKind::Invoice => {
            let invoice = backend.invoice(id)?;
            document::invoice_message(&config.company, &invoice, &config.documents)
        }
        ShareKind::Receipt => {
            let receipt = backend.receipt(id)?;
            document::receipt_message(&config.company, &receipt, &config.documents)
        }
    };

    let url = match via {
        Channel::Email => document::email_intent(to, &subject, &body)?,
        Channel::Whatsapp => document::whatsapp_intent(
            to,
            config.documents.phone_country_code.as_deref(),
            &format!("{subject}\n\n{body}"),
        )?,
    };

    println!("{url}");
    if open {
        open_path(&url)?;
    }
    Ok(())
}

/// Open a file or URL with the system default handler
fn open_path(target: impl AsRef<OsStr>) -> Result<()> {
    let target = target.as_ref();

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(target).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(target).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args([OsStr::new("/C"), OsStr::new("start"), OsStr::new("")])
            .arg(target)
            .spawn()?;
    }

    Ok(())
}
