//! Integration tests for order orchestration over the in-memory store and
//! directory.

use std::sync::LazyLock;
use std::time::Duration;

use common::OrderId;
use domain::{
    CreateOrder, ListOrders, Money, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress, ShippingStatus, TransitionTable, UpdateOrderStatus,
};
use orchestrator::{
    ErrorKind, InMemoryUserDirectory, OrderDetails, OrderOrchestrator, ServiceError, User,
};
use order_store::{InMemoryOrderStore, OrderStore};

type TestOrchestrator = OrderOrchestrator<InMemoryOrderStore, InMemoryUserDirectory>;

struct TestHarness {
    orchestrator: TestOrchestrator,
    store: InMemoryOrderStore,
    directory: InMemoryUserDirectory,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let directory = InMemoryUserDirectory::with_users([
            User::new("U1", "Alice", "alice@example.com"),
            User::new("U2", "Bob", "bob@example.com"),
        ]);
        let orchestrator = OrderOrchestrator::new(store.clone(), directory.clone());

        Self {
            orchestrator,
            store,
            directory,
        }
    }

    async fn create(&self, user: &str) -> OrderDetails {
        self.orchestrator
            .create_order(order_request(user))
            .await
            .unwrap()
    }

    async fn transition(&self, order_id: OrderId, status: OrderStatus) -> Result<OrderDetails, ServiceError> {
        self.orchestrator
            .update_order_status(UpdateOrderStatus::new(order_id, status))
            .await
    }
}

fn order_request(user: &str) -> CreateOrder {
    CreateOrder::new(
        user,
        vec![OrderItem::new("sku-1", "Widget", 2, Money::from_cents(1000))],
        ShippingAddress::new("1 Main St")
            .with_city("Springfield")
            .with_country("US"),
        PaymentMethod::CreditCard,
    )
}

#[tokio::test]
async fn test_create_order_happy_path() {
    let h = TestHarness::new();

    let details = h.create("U1").await;
    let order = &details.order;

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.total_amount(), Money::from_cents(2000));
    assert_eq!(order.total_amount().to_string(), "$20.00");
    assert_eq!(order.item_count(), 1);
    assert_eq!(order.items()[0].product_id.as_str(), "sku-1");
    assert_eq!(order.payment().status, PaymentStatus::Pending);
    assert_eq!(order.payment().method, PaymentMethod::CreditCard);
    assert!(order.payment().processed_at.is_none());
    assert_eq!(order.shipping().status, ShippingStatus::Pending);
    assert!(order.shipping().tracking_number.is_none());
    assert_eq!(details.user.display_name, "Alice");
    assert_eq!(h.store.order_count().await, 1);
}

#[tokio::test]
async fn test_total_is_exact_sum_of_items() {
    let h = TestHarness::new();
    let items = vec![
        OrderItem::new("sku-1", "A", 3, Money::from_cents(333)),
        OrderItem::new("sku-2", "B", 100, Money::from_cents(1)),
        OrderItem::new("sku-3", "C", 7, Money::from_cents(1999)),
    ];
    let cmd = CreateOrder::new(
        "U1",
        items,
        ShippingAddress::new("1 Main St"),
        PaymentMethod::BankTransfer,
    );

    let details = h.orchestrator.create_order(cmd).await.unwrap();
    assert_eq!(details.order.total_amount().cents(), 999 + 100 + 13993);
}

#[tokio::test]
async fn test_unknown_user_commits_nothing() {
    let h = TestHarness::new();

    let err = h
        .orchestrator
        .create_order(order_request("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ServiceError::UserNotFound(_)));
    assert_eq!(h.store.order_count().await, 0);

    let (orders, token) = h
        .orchestrator
        .list_orders(ListOrders::for_user("ghost", 10))
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert!(token.is_none());
}

#[tokio::test]
async fn test_directory_outage_is_server_error_and_commits_nothing() {
    let h = TestHarness::new();
    h.directory.set_unavailable(true).await;

    let err = h
        .orchestrator
        .create_order(order_request("U1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_validation_failure_skips_directory() {
    let h = TestHarness::new();
    let mut cmd = order_request("U1");
    cmd.items[0].quantity = 0;

    let err = h.orchestrator.create_order(cmd).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.directory.call_count(), 0);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_oversized_price_rejected_before_any_io() {
    let h = TestHarness::new();
    let mut cmd = order_request("U1");
    cmd.items[0].quantity = 100;
    cmd.items[0].unit_price = Money::from_cents(i64::MAX / 50);

    let err = h.orchestrator.create_order(cmd).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.directory.call_count(), 0);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_largest_valid_order_has_exact_total() {
    let h = TestHarness::new();
    let items = (0..domain::MAX_ITEMS)
        .map(|n| {
            OrderItem::new(
                format!("sku-{n}"),
                "Yacht",
                domain::MAX_QUANTITY,
                Money::from_cents(domain::MAX_UNIT_PRICE_CENTS),
            )
        })
        .collect();
    let cmd = CreateOrder::new(
        "U1",
        items,
        ShippingAddress::new("1 Main St"),
        PaymentMethod::BankTransfer,
    );

    let details = h.orchestrator.create_order(cmd).await.unwrap();
    let expected =
        domain::MAX_ITEMS as i64 * i64::from(domain::MAX_QUANTITY) * domain::MAX_UNIT_PRICE_CENTS;
    assert_eq!(details.order.total_amount().cents(), expected);
}

#[tokio::test]
async fn test_storage_failure_mid_create_rolls_back() {
    let h = TestHarness::new();
    let items = (1..=5)
        .map(|n| OrderItem::new(format!("sku-{n}"), "Widget", 1, Money::from_cents(100)))
        .collect();
    let cmd = CreateOrder::new(
        "U1",
        items,
        ShippingAddress::new("1 Main St"),
        PaymentMethod::DigitalWallet,
    );

    // Header and two items land, the third item fails
    h.store.fail_after_writes(3).await;
    let err = h.orchestrator.create_order(cmd).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.item_count().await, 0);
}

#[tokio::test]
async fn test_get_round_trips_created_order() {
    let h = TestHarness::new();
    let created = h.create("U1").await;

    let fetched = h.orchestrator.get_order(created.order.id()).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_get_is_idempotent() {
    let h = TestHarness::new();
    let created = h.create("U1").await;

    let first = h.orchestrator.get_order(created.order.id()).await.unwrap();
    let second = h.orchestrator.get_order(created.order.id()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_unknown_order() {
    let h = TestHarness::new();
    let err = h.orchestrator.get_order(OrderId::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_get_reports_corruption_distinctly() {
    let h = TestHarness::new();
    let created = h.create("U1").await;
    h.store.remove_shipping_record(created.order.id()).await;

    let err = h.orchestrator.get_order(created.order.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
}

#[tokio::test]
async fn test_get_with_directory_down_is_unavailable() {
    let h = TestHarness::new();
    let created = h.create("U1").await;
    h.directory.set_unavailable(true).await;

    let err = h.orchestrator.get_order(created.order.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
}

#[tokio::test]
async fn test_pending_transitions() {
    let h = TestHarness::new();

    for target in [OrderStatus::Processing, OrderStatus::Cancelled] {
        let order_id = h.create("U1").await.order.id();
        let details = h.transition(order_id, target).await.unwrap();
        assert_eq!(details.order.status(), target);
    }

    for target in [OrderStatus::Completed, OrderStatus::Failed] {
        let order_id = h.create("U1").await.order.id();
        let err = h.transition(order_id, target).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let stored = h.store.get(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
    }
}

#[tokio::test]
async fn test_terminal_states_reject_every_transition() {
    let h = TestHarness::new();

    let completed = h.create("U1").await.order.id();
    h.transition(completed, OrderStatus::Processing).await.unwrap();
    h.transition(completed, OrderStatus::Completed).await.unwrap();

    let failed = h.create("U1").await.order.id();
    h.transition(failed, OrderStatus::Processing).await.unwrap();
    h.transition(failed, OrderStatus::Failed).await.unwrap();

    let cancelled = h.create("U1").await.order.id();
    h.transition(cancelled, OrderStatus::Cancelled).await.unwrap();

    for order_id in [completed, failed, cancelled] {
        for target in OrderStatus::ALL {
            let err = h.transition(order_id, target).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conflict, "{target} should be rejected");
        }
    }
}

#[tokio::test]
async fn test_full_lifecycle_then_illegal_move() {
    let h = TestHarness::new();
    let order_id = h.create("U1").await.order.id();

    h.transition(order_id, OrderStatus::Processing).await.unwrap();
    let done = h.transition(order_id, OrderStatus::Completed).await.unwrap();
    assert_eq!(done.order.status(), OrderStatus::Completed);
    assert_eq!(done.user.display_name, "Alice");

    let err = h
        .transition(order_id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let current = h.orchestrator.get_order(order_id).await.unwrap();
    assert_eq!(current.order.status(), OrderStatus::Completed);
}

#[tokio::test]
async fn test_transition_unknown_order() {
    let h = TestHarness::new();
    let err = h
        .transition(OrderId::new(), OrderStatus::Processing)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_transition_fetches_fresh_user_snapshot() {
    let h = TestHarness::new();
    let order_id = h.create("U1").await.order.id();

    h.directory
        .insert(User::new("U1", "Alice Smith", "alice@example.com"))
        .await;

    let details = h.transition(order_id, OrderStatus::Processing).await.unwrap();
    assert_eq!(details.user.display_name, "Alice Smith");
}

#[tokio::test]
async fn test_custom_transition_table() {
    static LENIENT: LazyLock<TransitionTable> = LazyLock::new(|| {
        TransitionTable::from_pairs([
            (OrderStatus::Pending, OrderStatus::Completed),
            (OrderStatus::Completed, OrderStatus::Pending),
        ])
    });

    let store = InMemoryOrderStore::new();
    let directory = InMemoryUserDirectory::with_users([User::new("U1", "Alice", "a@example.com")]);
    let orchestrator = OrderOrchestrator::new(store, directory).with_transitions(&LENIENT);

    let order_id = orchestrator
        .create_order(order_request("U1"))
        .await
        .unwrap()
        .order
        .id();

    let err = orchestrator
        .update_order_status(UpdateOrderStatus::new(order_id, OrderStatus::Processing))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    orchestrator
        .update_order_status(UpdateOrderStatus::new(order_id, OrderStatus::Completed))
        .await
        .unwrap();
    orchestrator
        .update_order_status(UpdateOrderStatus::new(order_id, OrderStatus::Pending))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_first_page_of_three() {
    let h = TestHarness::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(h.create("U1").await.order.id());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let (orders, token) = h
        .orchestrator
        .list_orders(ListOrders::for_user("U1", 1))
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), ids[2]);
    assert!(token.is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_list_walks_every_page() {
    let h = TestHarness::new();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(h.create("U1").await.order.id());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    h.create("U2").await;
    ids.reverse();

    let mut seen = Vec::new();
    let mut token = String::new();
    loop {
        let (orders, next) = h
            .orchestrator
            .list_orders(ListOrders::for_user("U1", 2).with_page_token(token.clone()))
            .await
            .unwrap();
        seen.extend(orders.iter().map(|o| o.id()));
        match next {
            Some(next) => token = next,
            None => break,
        }
    }

    assert_eq!(seen, ids);
}

#[tokio::test]
async fn test_list_status_filter() {
    let h = TestHarness::new();
    let pending = h.create("U1").await.order.id();
    let cancelled = h.create("U1").await.order.id();
    h.transition(cancelled, OrderStatus::Cancelled).await.unwrap();

    let (orders, _) = h
        .orchestrator
        .list_orders(ListOrders::for_user("U1", 10).with_status(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), pending);

    let (all, _) = h
        .orchestrator
        .list_orders(ListOrders::for_user("U1", 10))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_list_rejects_bad_arguments() {
    let h = TestHarness::new();

    for size in [0, 101] {
        let err = h
            .orchestrator
            .list_orders(ListOrders::for_user("U1", size))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let err = h
        .orchestrator
        .list_orders(ListOrders::for_user("U1", 10).with_page_token("not-a-token"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
