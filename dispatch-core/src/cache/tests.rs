use super::*;
use dispatch_client::mock::MockTransport;
use shared::{Contact, Location, OrderType, Priority};

fn order(id: EntityId, notes: &str, barcode: &str) -> Order {
    Order {
        id,
        order_type: OrderType::Delivery,
        priority: Priority::Medium,
        active: true,
        notes: notes.to_string(),
        barcode: barcode.to_string(),
        location_id: 1,
        contact_id: 1,
        driver_id: 1,
        date: None,
        duration: None,
        loads: vec![],
        time_windows: vec![],
        color: None,
    }
}

fn expanded(id: EntityId, active: bool) -> ExpandedOrder {
    ExpandedOrder {
        order: Order {
            active,
            ..order(id, "", "")
        },
        contact: Some(Contact {
            id: 1,
            name: "Ada".into(),
            email: String::new(),
            phone: String::new(),
        }),
        location: Some(Location {
            id: 1,
            location_name: "Depot".into(),
            address_line1: String::new(),
            city: String::new(),
            zip_code: None,
            latitude: 52.0,
            longitude: 5.1,
        }),
        driver: None,
    }
}

fn cache_with(transport: Arc<MockTransport>) -> QueryCache {
    QueryCache::new(transport)
}

#[tokio::test]
async fn query_fetches_once_then_serves_from_cache() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(1, "", "")]).unwrap(),
    );
    let cache = cache_with(transport.clone());

    let first = cache.query(Endpoint::Orders).await.unwrap();
    let second = cache.query(Endpoint::Orders).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn item_tag_invalidation_forces_a_refetch() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(5, "", "")]).unwrap(),
    );
    let cache = cache_with(transport.clone());
    cache.query(Endpoint::Orders).await.unwrap();

    let to_refetch = cache.invalidate(&[Tag::Item(EntityKind::Order, 5)]);
    // No subscribers: nothing to refetch eagerly, but the slot is stale
    assert!(to_refetch.is_empty());

    cache.query(Endpoint::Orders).await.unwrap();
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn list_tag_invalidation_hits_every_order_slot() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(1, "", "")]).unwrap(),
    );
    transport.stub(
        "GET",
        "/orders?_expand=contact&_expand=location&_expand=driver",
        serde_json::to_value(vec![expanded(1, true)]).unwrap(),
    );
    let cache = cache_with(transport.clone());
    cache.query(Endpoint::Orders).await.unwrap();
    cache.query(Endpoint::ExpandedOrders).await.unwrap();

    cache.subscribe(Endpoint::ExpandedOrders);
    let mut to_refetch = cache.invalidate(&[Tag::List(EntityKind::Order)]);
    to_refetch.sort_by_key(|endpoint| format!("{endpoint:?}"));
    // Only the subscribed slot is reported for eager refetch
    assert_eq!(to_refetch, vec![Endpoint::ExpandedOrders]);

    // Both slots are stale regardless
    cache.query(Endpoint::Orders).await.unwrap();
    cache.query(Endpoint::ExpandedOrders).await.unwrap();
    let gets = transport.requests();
    assert_eq!(gets.len(), 4);
}

#[tokio::test]
async fn unrelated_tags_leave_slots_fresh() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(1, "", "")]).unwrap(),
    );
    let cache = cache_with(transport.clone());
    cache.query(Endpoint::Orders).await.unwrap();

    cache.invalidate(&[Tag::Item(EntityKind::Order, 42)]);
    cache.invalidate(&[Tag::List(EntityKind::User)]);

    cache.query(Endpoint::Orders).await.unwrap();
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn patch_swaps_data_and_restore_brings_back_the_exact_snapshot() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders?_expand=contact&_expand=location&_expand=driver",
        serde_json::to_value(vec![expanded(5, false)]).unwrap(),
    );
    let cache = cache_with(transport);
    let before = cache.query(Endpoint::ExpandedOrders).await.unwrap();

    let snapshot = cache
        .patch(Endpoint::ExpandedOrders, |data| {
            if let CachedData::ExpandedOrders(rows) = data {
                rows[0].order.active = true;
            }
        })
        .expect("slot is populated");
    assert!(Arc::ptr_eq(&snapshot, &before));

    let patched = cache.peek(Endpoint::ExpandedOrders).unwrap();
    assert!(patched.as_expanded_orders().unwrap()[0].order.active);

    cache.restore(Endpoint::ExpandedOrders, snapshot);
    let restored = cache.peek(Endpoint::ExpandedOrders).unwrap();
    assert!(Arc::ptr_eq(&restored, &before));
}

#[tokio::test]
async fn patch_on_an_empty_slot_is_a_silent_no_op() {
    let transport = Arc::new(MockTransport::new());
    let cache = cache_with(transport);
    let snapshot = cache.patch(Endpoint::Orders, |_| panic!("must not run"));
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn failed_refetch_keeps_the_stale_data() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(3, "keep me", "")]).unwrap(),
    );
    let cache = cache_with(transport.clone());
    cache.query(Endpoint::Orders).await.unwrap();

    transport.fail("GET", "/orders");
    cache.invalidate(&[Tag::Item(EntityKind::Order, 3)]);
    cache.refetch(&[Endpoint::Orders]).await;

    let kept = cache.peek(Endpoint::Orders).unwrap();
    assert_eq!(
        kept.as_orders().unwrap().get(3).map(|o| o.notes.as_str()),
        Some("keep me")
    );
}

#[tokio::test]
async fn cache_writes_are_broadcast() {
    let transport = Arc::new(MockTransport::new());
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(1, "", "")]).unwrap(),
    );
    let cache = cache_with(transport);
    let mut events = cache.subscribe_events();

    cache.query(Endpoint::Orders).await.unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::Updated(Endpoint::Orders)
    );

    cache.invalidate(&[Tag::List(EntityKind::Order)]);
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::Invalidated(Endpoint::Orders)
    );
}
