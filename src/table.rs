use prettytable::{row, Row, Table};

use billbook_core::{Bill, BillSummary};

/// A record that can be listed as one table row.
pub trait TableRow {
    fn header() -> Row;
    fn row(&self) -> Row;
}

impl TableRow for Bill {
    fn header() -> Row {
        row!["Id", "Invoice", "Customer", "City", "Service Date", "Items", "Total", "Status"]
    }

    fn row(&self) -> Row {
        row![
            self.meta.id,
            self.meta.invoice_number,
            self.customer,
            self.city,
            self.service_date,
            self.items.len(),
            self.total,
            self.meta.status
        ]
    }
}

impl TableRow for BillSummary {
    fn header() -> Row {
        row!["Id", "Invoice", "Customer", "City", "Reference", "Status"]
    }

    fn row(&self) -> Row {
        row![
            self.meta.id,
            self.meta.invoice_number,
            self.customer,
            self.city,
            self.invoice_reference,
            self.meta.status
        ]
    }
}

pub fn render<R: TableRow>(records: &[R]) -> String {
    let mut table = Table::new();
    table.add_row(R::header());
    table.add_empty_row();
    for record in records {
        table.add_row(record.row());
    }
    format!("\n{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbook_core::{BillSummaryDraft, PaymentStatus, RecordMeta, StoredRecord};
    use time::macros::datetime;

    #[test]
    fn test_render_summaries() {
        let summary = BillSummary::from_draft(
            BillSummaryDraft {
                customer: "Acme Corp".into(),
                city: "Pune".into(),
                invoice_reference: "PO-7781".into(),
                ..Default::default()
            },
            RecordMeta {
                id: "1700000000000".into(),
                invoice_number: "INV-2023-001".into(),
                status: PaymentStatus::Overdue,
                created_at: datetime!(2023-11-14 22:13:20 UTC),
                updated_at: None,
            },
        );

        let out = render(&[summary]);
        for expected in ["Invoice", "INV-2023-001", "Acme Corp", "PO-7781", "Overdue"] {
            assert!(out.contains(expected), "missing {} in {}", expected, out);
        }
    }

    #[test]
    fn test_render_empty() {
        let out = render::<Bill>(&[]);
        assert!(out.contains("Service Date"));
    }
}
