//! End-to-end walk through the dashboard core against a scripted store.
//!
//! Run with: cargo run --example dashboard

use dispatch_client::mock::MockTransport;
use dispatch_core::{
    DashboardConfig, DashboardState, FitOptions, LngLat, LngLatBounds, MapSurface, MapSyncBridge,
    MarkerHandle, MarkerSpec, OrderSearchSelector, order_markers,
};
use std::sync::Arc;

const EXPANDED_PATH: &str = "/orders?_expand=contact&_expand=location&_expand=driver";

/// Prints what a real map widget would render
#[derive(Default)]
struct ConsoleSurface {
    next_handle: MarkerHandle,
}

impl MapSurface for ConsoleSurface {
    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerHandle {
        self.next_handle += 1;
        println!(
            "  [map] add marker #{} at ({:.2}, {:.2}) \"{}\"",
            marker.id, marker.position.lng, marker.position.lat, marker.label
        );
        self.next_handle
    }

    fn set_marker_position(&mut self, handle: MarkerHandle, position: LngLat) {
        println!(
            "  [map] move marker {handle} to ({:.2}, {:.2})",
            position.lng, position.lat
        );
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        println!("  [map] remove marker {handle}");
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, options: FitOptions) {
        println!(
            "  [map] fit [[{:.2}, {:.2}], [{:.2}, {:.2}]] padding={} maxZoom={}",
            bounds.sw.lng, bounds.sw.lat, bounds.ne.lng, bounds.ne.lat, options.padding,
            options.max_zoom
        );
    }

    fn pan_to(&mut self, center: LngLat, duration_ms: u64) {
        println!(
            "  [map] pan to ({:.2}, {:.2}) over {duration_ms}ms",
            center.lng, center.lat
        );
    }
}

fn expanded_fixture(order1_active: bool) -> serde_json::Value {
    serde_json::json!([
        {
            "id": 2, "orderType": "Delivery", "priority": "High", "active": true,
            "notes": "Fragile glassware", "barcode": "PKG-0002",
            "locationId": 1, "contactId": 1, "driverId": 1,
            "contact": { "id": 1, "name": "Ada Lovelace", "email": "", "phone": "" },
            "location": {
                "id": 1, "locationName": "Depot", "addressLine1": "Dam 1",
                "city": "Amsterdam", "latitude": 52.37, "longitude": 4.89
            }
        },
        {
            "id": 1, "orderType": "Pickup", "priority": "Low", "active": order1_active,
            "notes": "Call on arrival", "barcode": "PKG-0001",
            "locationId": 2, "contactId": 2, "driverId": 1,
            "contact": { "id": 2, "name": "Grace Hopper", "email": "", "phone": "" },
            "location": {
                "id": 2, "locationName": "Harbor", "addressLine1": "Kade 9",
                "city": "Rotterdam", "latitude": 51.92, "longitude": 4.48
            }
        }
    ])
}

fn seed(transport: &MockTransport) {
    transport.stub(
        "GET",
        "/orders",
        serde_json::json!([
            {
                "id": 2, "orderType": "Delivery", "priority": "High", "active": true,
                "notes": "Fragile glassware", "barcode": "PKG-0002",
                "locationId": 1, "contactId": 1, "driverId": 1
            },
            {
                "id": 1, "orderType": "Pickup", "priority": "Low", "active": false,
                "notes": "Call on arrival", "barcode": "PKG-0001",
                "locationId": 2, "contactId": 2, "driverId": 1
            }
        ]),
    );
    transport.stub("GET", EXPANDED_PATH, expanded_fixture(false));
    transport.stub(
        "PATCH",
        "/orders/1",
        serde_json::json!({
            "id": 1, "orderType": "Pickup", "priority": "Low", "active": true,
            "notes": "Call on arrival", "barcode": "PKG-0001",
            "locationId": 2, "contactId": 2, "driverId": 1
        }),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let transport = Arc::new(MockTransport::new());
    seed(&transport);

    let state = DashboardState::initialize(
        DashboardConfig::with_overrides("mock://resource-store"),
        transport.clone(),
    );

    // Search over the normalized orders slot
    let orders = state.orders().await?;
    let search = OrderSearchSelector::new();
    println!("all ids:        {:?}", search.select(&orders, ""));
    println!("\"fragile\" hits: {:?}", search.select(&orders, "fragile"));

    // Sync the active orders onto the map
    let expanded = state.expanded_orders().await?;
    let mut bridge = MapSyncBridge::new(ConsoleSurface::default());
    println!("first sync:");
    bridge.sync(&order_markers(&expanded));

    // Toggle order 1 active; the expanded cache updates optimistically.
    // A real store would serve the new state on the refetch; the scripted
    // one has to be told about it.
    state.mutations().change_active(1, false).await?;
    transport.stub("GET", EXPANDED_PATH, expanded_fixture(true));

    let expanded = state.expanded_orders().await?;
    println!("after toggling order 1:");
    bridge.sync(&order_markers(&expanded));

    Ok(())
}
