use serde::Serialize;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::{InvoiceDoc, JobCardDoc, ReceiptDoc};
use crate::error::{Result, ShopError};

/// Page setup, watermark and header shared by every document.
/// `DATA_JSON_PATH` is replaced with the data file name before compiling.
const PRELUDE: &str = r##"#let data = json("DATA_JSON_PATH")

#let watermark = if data.at("watermark", default: none) != none {
  place(center + horizon, rotate(-35deg, text(
    size: 96pt,
    weight: "bold",
    fill: rgb(data.watermark.color).transparentize(82%),
  )[#data.watermark.text]))
}

#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2cm, right: 2cm),
  background: watermark,
)

#set text(font: "Helvetica", size: 10pt)

#let company-header(title, rows) = grid(
  columns: (1fr, 1fr),
  align: (left, right),
  [
    #text(size: 18pt, weight: "bold")[#data.company.name]
    #v(0.2em)
    #text(size: 9pt, style: "italic", fill: gray)[#data.company.tagline]
    #v(0.3em)
    #if data.company.address != none [#data.company.address \ ]
    #if data.company.phone != none [#data.company.phone \ ]
    #if data.company.email != none [#data.company.email]
  ],
  [
    #text(size: 22pt, weight: "bold")[#title]
    #v(0.5em)
    #table(
      columns: (auto, auto),
      stroke: none,
      align: (right, left),
      inset: 2pt,
      ..rows.flatten()
    )
  ]
)

#let rule() = {
  v(0.8em)
  line(length: 100%, stroke: 0.5pt + gray)
  v(0.8em)
}

#let billed-to(label, customer) = [
  #text(weight: "bold", size: 11pt)[#label]
  #v(0.3em)
  #text(weight: "bold")[#customer.name]
  #if customer.phone != none [\ #customer.phone]
  #if customer.vehicle != none [\ #customer.vehicle]
]

#let line-items(lines, staff: false) = table(
  columns: if staff { (auto, 1fr, auto, auto, auto, auto) } else { (auto, 1fr, auto, auto, auto) },
  align: if staff { (center, left, left, right, right, right) } else { (center, left, right, right, right) },
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else { (bottom: 0.5pt + gray) },
  inset: 7pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },
  ..if staff {
    ([*\#*], [*Description*], [*Staff*], [*Qty*], [*Unit price*], [*Amount*])
  } else {
    ([*\#*], [*Description*], [*Qty*], [*Unit price*], [*Amount*])
  },
  ..lines.enumerate().map(((i, item)) => {
    let desc = if staff and item.done { [#item.description #sym.checkmark] } else { item.description }
    if staff {
      (str(i + 1), desc, item.staff, item.quantity, item.unit_price, item.amount)
    } else {
      (str(i + 1), desc, item.quantity, item.unit_price, item.amount)
    }
  }).flatten()
)

#let summary(rows) = align(right)[
  #table(
    columns: (auto, auto),
    stroke: none,
    align: (right, right),
    inset: 5pt,
    ..rows.map(r => if r.emphasis {
      ([*#r.label:*], [*#r.value*])
    } else {
      ([#r.label:], [#r.value])
    }).flatten()
  )
]
"##;

const JOB_CARD_BODY: &str = r##"
#company-header("JOB CARD", (
  ([*Job \#:*], [#data.number]),
  ([*Date:*], [#data.date]),
  ([*Status:*], text(fill: rgb(data.status_color), weight: "bold")[#data.status]),
))

#rule()

#grid(
  columns: (1fr, 1fr),
  billed-to("Customer:", data.customer),
  [
    #if data.technician != none [
      #text(weight: "bold", size: 11pt)[Technician:]
      #v(0.3em)
      #data.technician
    ]
  ],
)

#v(1.2em)
#line-items(data.lines, staff: true)
#v(1em)
#summary(data.summary)

#if data.notes != none [
  #v(1em)
  #text(weight: "bold")[Notes:] #data.notes
]

#v(3em)
#grid(
  columns: (1fr, 1fr),
  gutter: 2cm,
  [#line(length: 100%, stroke: 0.5pt) Customer signature],
  [#line(length: 100%, stroke: 0.5pt) Technician signature],
)
"##;

const INVOICE_BODY: &str = r##"
#company-header("INVOICE", (
  ([*Invoice \#:*], [#data.number]),
  ..if data.job_number != none { (([*Job \#:*], [#data.job_number]),) } else { () },
  ([*Issued:*], [#data.issue_date]),
  ([*Due:*], [#data.due_date]),
  ([*Status:*], [#data.status]),
))

#rule()

#billed-to("Bill To:", data.customer)

#v(1.2em)
#if data.lines.len() > 0 [
  #line-items(data.lines)
  #v(1em)
]
#summary(data.summary)

#if data.notes != none [
  #v(1em)
  #text(weight: "bold")[Notes:] #data.notes
]

#if data.terms != none [
  #v(1em)
  #text(weight: "bold")[Terms:] #data.terms
]
"##;

const RECEIPT_BODY: &str = r##"
#company-header("RECEIPT", (
  ([*Receipt \#:*], [#data.number]),
  ([*Date:*], [#data.issued_at]),
  ..if data.job_number != none { (([*Job \#:*], [#data.job_number]),) } else { () },
  ..if data.invoice_number != none { (([*Invoice \#:*], [#data.invoice_number]),) } else { () },
))

#rule()

#text(weight: "bold", size: 11pt)[Received from:]
#v(0.3em)
#text(weight: "bold")[#data.customer]

#v(1.5em)

#table(
  columns: (auto, 1fr),
  stroke: none,
  inset: 6pt,
  [*Amount received:*], text(size: 14pt, weight: "bold")[#data.amount],
  [*Payment method:*], [#data.method],
  ..if data.reference != none { ([*Reference:*], [#data.reference]) } else { () },
  ..if data.issued_by != none { ([*Issued by:*], [#data.issued_by]) } else { () },
)

#if data.notes != none [
  #v(1em)
  #text(weight: "bold")[Notes:] #data.notes
]

#v(2em)
#align(center)[#text(size: 9pt, fill: gray)[Thank you for your business.]]
"##;

pub fn generate_job_card_pdf(doc: &JobCardDoc, output_path: &Path) -> Result<()> {
    compile("job-card", JOB_CARD_BODY, doc, output_path)
}

pub fn generate_invoice_pdf(doc: &InvoiceDoc, output_path: &Path) -> Result<()> {
    compile("invoice", INVOICE_BODY, doc, output_path)
}

pub fn generate_receipt_pdf(doc: &ReceiptDoc, output_path: &Path) -> Result<()> {
    compile("receipt", RECEIPT_BODY, doc, output_path)
}

fn template(name: &str, body: &str) -> String {
    let data_file = format!("{name}.json");
    format!("{}{}", PRELUDE.replace("DATA_JSON_PATH", &data_file), body)
}

/// Compile `body` against `data` with the Typst CLI.
fn compile<T: Serialize>(name: &str, body: &str, data: &T, output_path: &Path) -> Result<()> {
    if Command::new("typst").arg("--version").output().is_err() {
        return Err(ShopError::TypstNotFound);
    }

    let temp_dir = std::env::temp_dir().join("timax");
    std::fs::create_dir_all(&temp_dir)?;

    let json_data =
        serde_json::to_string(data).map_err(|e| ShopError::PdfGeneration(e.to_string()))?;
    let json_path = temp_dir.join(format!("{name}.json"));
    std::fs::write(&json_path, json_data)?;

    let template_path = temp_dir.join(format!("{name}.typ"));
    std::fs::write(&template_path, template(name, body))?;

    debug!(template = %template_path.display(), output = %output_path.display(), "compiling document");
    let output = Command::new("typst")
        .arg("compile")
        .arg("--root")
        .arg(&temp_dir)
        .arg(&template_path)
        .arg(output_path)
        .output()?;

    let _ = std::fs::remove_file(&template_path);
    let _ = std::fs::remove_file(&json_path);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ShopError::PdfGeneration(stderr.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_read_their_own_data_file() {
        let source = template("receipt", RECEIPT_BODY);
        assert!(source.starts_with("#let data = json(\"receipt.json\")"));
        assert!(!source.contains("DATA_JSON_PATH"));
        assert!(source.contains("paper: \"a4\""));
    }
}
