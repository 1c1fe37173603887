use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateOrder, Money, Order, OrderItem, OrderStatus, PaymentMethod, ShippingAddress,
    TransitionTable, compute_total, validate_create_order,
};

fn full_request() -> CreateOrder {
    let items = (0..100u32)
        .map(|n| OrderItem::new(format!("SKU-{n:03}"), "Benchmark Widget", 1 + n % 100, Money::from_cents(199)))
        .collect();
    CreateOrder::new(
        "bench-user",
        items,
        ShippingAddress::new("1 Bench Way"),
        PaymentMethod::CreditCard,
    )
}

fn bench_validate(c: &mut Criterion) {
    let cmd = full_request();

    c.bench_function("domain/validate_100_items", |b| {
        b.iter(|| validate_create_order(&cmd).unwrap());
    });
}

fn bench_compute_total(c: &mut Criterion) {
    let cmd = full_request();

    c.bench_function("domain/compute_total_100_items", |b| {
        b.iter(|| compute_total(&cmd.items));
    });
}

fn bench_place_and_transition(c: &mut Criterion) {
    let table = TransitionTable::standard();

    c.bench_function("domain/place_then_complete", |b| {
        b.iter(|| {
            let cmd = full_request();
            let total = compute_total(&cmd.items);
            let mut order = Order::place(cmd, total, Utc::now());
            order
                .transition_to(OrderStatus::Processing, table, Utc::now())
                .unwrap();
            order
                .transition_to(OrderStatus::Completed, table, Utc::now())
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_validate,
    bench_compute_total,
    bench_place_and_transition
);
criterion_main!(benches);
