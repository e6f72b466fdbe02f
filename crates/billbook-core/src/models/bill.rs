use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PaymentStatus, RecordMeta};
use crate::record::StoredRecord;

/// A full bill with line items and totals, kept in the `saved_bills` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub bill_type: String,
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
    #[serde(default)]
    pub service_date: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    pub serial_no: u32,
    pub name: String,
    pub classification_code: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Percent, e.g. `18` for 18%.
    pub tax_rate: Decimal,
    pub tax_components: Vec<TaxComponent>,
    pub line_total: Decimal,
    pub quantity_unit: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxComponent {
    pub label: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

impl LineItem {
    pub fn taxable_value(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    pub fn tax_value(&self) -> Decimal {
        (self.taxable_value() * self.tax_rate / Decimal::ONE_HUNDRED).round_dp(2)
    }

    pub fn computed_total(&self) -> Decimal {
        (self.taxable_value() + self.tax_value()).round_dp(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BillTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl BillTotals {
    pub fn from_items(items: &[LineItem]) -> Self {
        let subtotal: Decimal = items.iter().map(|i| i.taxable_value()).sum();
        let tax_amount: Decimal = items.iter().map(|i| i.tax_value()).sum();
        let subtotal = subtotal.round_dp(2);
        BillTotals {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

/// Caller-supplied fields for a new bill.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BillDraft {
    pub bill_type: String,
    pub customer: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub tax_number: String,
    pub invoice_reference: String,
    pub service_date: String,
    pub items: Vec<LineItem>,
    pub notes: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl BillDraft {
    /// Fills every line total and the bill totals from the line items.
    pub fn apply_computed_totals(&mut self) {
        for item in self.items.iter_mut() {
            item.line_total = item.computed_total();
        }
        let totals = BillTotals::from_items(&self.items);
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;
    }
}

/// Partial update for a bill. Only the fields that are set are merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_type: Option<String>,
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
    pub service_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

impl StoredRecord for Bill {
    type Draft = BillDraft;

    const DEFAULT_SLOT: &'static str = "saved_bills";

    fn from_draft(draft: BillDraft, meta: RecordMeta) -> Self {
        Bill {
            meta,
            bill_type: draft.bill_type,
            customer: draft.customer,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            tax_number: draft.tax_number,
            invoice_reference: draft.invoice_reference,
            service_date: draft.service_date,
            items: draft.items,
            notes: draft.notes,
            subtotal: draft.subtotal,
            tax_amount: draft.tax_amount,
            total: draft.total,
        }
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
