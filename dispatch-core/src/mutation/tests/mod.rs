use super::*;
use dispatch_client::mock::MockTransport;
use shared::{ExpandedOrder, OrderType, Priority};

mod test_create;

fn order(id: EntityId, active: bool, notes: &str) -> Order {
    Order {
        id,
        order_type: OrderType::Delivery,
        priority: Priority::Medium,
        active,
        notes: notes.to_string(),
        barcode: format!("PKG-{id:04}"),
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
        order: order(id, active, ""),
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

fn sample_user(id: EntityId, active: bool) -> User {
    User {
        id,
        name: "Grace".into(),
        active,
        latitude: None,
        longitude: None,
    }
}

fn sample_form() -> NewOrderForm {
    NewOrderForm {
        contact: NewContact {
            name: "Ada".into(),
            email: None,
            phone: Some("0600000000".into()),
        },
        location: NewLocation {
            location_name: "Depot".into(),
            address_line1: None,
            city: None,
            zip_code: None,
            latitude: 52.0,
            longitude: 5.1,
        },
        driver_id: 2,
        order_type: OrderType::Delivery,
        priority: Priority::Medium,
        notes: "Ring twice".into(),
        barcode: "PKG-0042".into(),
        date: None,
        duration: None,
        loads: vec![],
        time_windows: vec![],
    }
}

/// Mock transport, cache and manager wired the way `DashboardState` does it
fn create_test_manager() -> (Arc<MockTransport>, Arc<QueryCache>, MutationManager) {
    let transport = Arc::new(MockTransport::new());
    let cache = Arc::new(QueryCache::new(transport.clone()));
    let manager = MutationManager::new(cache.clone(), transport.clone());
    (transport, cache, manager)
}

const EXPANDED_PATH: &str = "/orders?_expand=contact&_expand=location&_expand=driver";
