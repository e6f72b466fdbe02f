use std::sync::Arc;

use billbook::config::StoresConfig;
use billbook::{BillDraft, BillSummaryDraft, Billbook, LineItem, PaymentStatus, SlotBackend, StoredRecord};
use billbook_memory::MemorySlots;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_decimal_macros::dec;

fn setup() -> Billbook {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
    Billbook::new(backend, &StoresConfig::default())
}

fn draft(i: usize) -> BillDraft {
    let mut draft = BillDraft {
        customer: format!("Customer {}", i),
        city: "Pune".into(),
        invoice_reference: format!("PO-{}", i),
        items: (1..=5)
            .map(|n| LineItem {
                serial_no: n,
                name: format!("Item {}", n),
                quantity: dec!(3),
                unit_price: dec!(199.99),
                tax_rate: dec!(18),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    draft.apply_computed_totals();
    draft
}

// A few hundred records is the size these stores are expected to hold.
fn seed_data(book: &Billbook) {
    for i in 0..300 {
        book.bills.save(draft(i)).unwrap();
        book.summaries
            .save(BillSummaryDraft {
                customer: format!("Customer {}", i),
                address: "1 Main St".into(),
                city: "Pune".into(),
                invoice_reference: format!("PO-{}", i),
                ..Default::default()
            })
            .unwrap();
    }
}

fn bench_save(c: &mut Criterion) {
    c.bench_function("bill_save_into_300", |b| {
        b.iter_batched(
            || {
                let book = setup();
                seed_data(&book);
                book
            },
            |book| book.bills.save(black_box(draft(300))).unwrap(),
            BatchSize::LargeInput,
        )
    });

    let book = setup();
    seed_data(&book);
    let next = BillSummaryDraft {
        customer: "Customer 0".into(),
        address: "1 Main St".into(),
        city: "Pune".into(),
        invoice_reference: "PO-0".into(),
        ..Default::default()
    };
    c.bench_function("summary_duplicate_rejection", |b| {
        b.iter(|| book.summaries.save(black_box(next.clone())).unwrap_err())
    });
}

fn bench_reads(c: &mut Criterion) {
    let book = setup();
    seed_data(&book);
    let last = book.bills.get_all().unwrap().pop().unwrap();

    c.bench_function("bill_get_all_300", |b| b.iter(|| book.bills.get_all().unwrap()));
    c.bench_function("bill_get_by_id_last", |b| {
        b.iter(|| book.bills.get_by_id(black_box(last.id())).unwrap())
    });
}

fn bench_status_update(c: &mut Criterion) {
    let book = setup();
    seed_data(&book);
    let first = book.bills.get_all().unwrap().remove(0);

    c.bench_function("bill_update_status", |b| {
        b.iter(|| book.bills.update_status(black_box(first.id()), PaymentStatus::Paid).unwrap())
    });
}

criterion_group!(benches, bench_save, bench_reads, bench_status_update);
criterion_main!(benches);
