use serde::{Deserialize, Serialize};

use super::{PaymentStatus, RecordMeta};
use crate::record::{DuplicateCheck, StoredRecord};

/// The reduced bill shape kept in the `saved_bills02` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tax_number: String,
    #[serde(default)]
    pub invoice_reference: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BillSummaryDraft {
    pub customer: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub tax_number: String,
    pub invoice_reference: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummaryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

impl StoredRecord for BillSummary {
    type Draft = BillSummaryDraft;

    const DEFAULT_SLOT: &'static str = "saved_bills02";

    fn from_draft(draft: BillSummaryDraft, meta: RecordMeta) -> Self {
        BillSummary {
            meta,
            customer: draft.customer,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            tax_number: draft.tax_number,
            invoice_reference: draft.invoice_reference,
        }
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Rejects a new summary when customer, address and city match an existing
/// one ignoring case, and the invoice reference matches exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameCustomerAndReference;

impl DuplicateCheck<BillSummary> for SameCustomerAndReference {
    fn is_duplicate(&self, draft: &BillSummaryDraft, existing: &BillSummary) -> bool {
        eq_ignore_case(&draft.customer, &existing.customer)
            && eq_ignore_case(&draft.address, &existing.address)
            && eq_ignore_case(&draft.city, &existing.city)
            && draft.invoice_reference == existing.invoice_reference
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn existing() -> BillSummary {
        BillSummary::from_draft(
            BillSummaryDraft {
                customer: "Acme Corp".into(),
                address: "12 Harbour Road".into(),
                city: "Pune".into(),
                state: "Maharashtra".into(),
                tax_number: "27AAACA1234A1Z5".into(),
                invoice_reference: "PO-7781".into(),
            },
            RecordMeta {
                id: "1700000000000".into(),
                invoice_number: "INV-2023-001".into(),
                status: PaymentStatus::Pending,
                created_at: datetime!(2023-11-14 22:13:20 UTC),
                updated_at: None,
            },
        )
    }

    fn draft() -> BillSummaryDraft {
        BillSummaryDraft {
            customer: "ACME CORP".into(),
            address: "12 harbour road".into(),
            city: "PUNE".into(),
            state: "Somewhere else".into(),
            tax_number: "different".into(),
            invoice_reference: "PO-7781".into(),
        }
    }

    #[test]
    fn test_duplicate_ignores_case_and_other_fields() {
        assert!(SameCustomerAndReference.is_duplicate(&draft(), &existing()));
    }

    #[test]
    fn test_invoice_reference_is_case_sensitive() {
        let mut d = draft();
        d.invoice_reference = "po-7781".into();
        assert!(!SameCustomerAndReference.is_duplicate(&d, &existing()));
    }

    #[test]
    fn test_any_differing_key_field_is_not_duplicate() {
        let edits: [fn(&mut BillSummaryDraft); 4] = [
            |d| d.customer = "Acme Corporation".into(),
            |d| d.address = "14 Harbour Road".into(),
            |d| d.city = "Mumbai".into(),
            |d| d.invoice_reference = "PO-7782".into(),
        ];
        for edit in edits {
            let mut d = draft();
            edit(&mut d);
            assert!(!SameCustomerAndReference.is_duplicate(&d, &existing()));
        }
    }
}
