//! Derived selectors
//!
//! Pure projections over cached data plus memoizing wrappers. A wrapper
//! recomputes only when the input `Arc` identity or the argument changes;
//! outputs are `Arc`-shared, so an unchanged projection stays
//! pointer-identical and consumers can skip re-rendering. Projections are
//! deliberately minimal-shape (id lists, not full objects) so a change to an
//! unrelated field of some other entity never ripples into them.

use crate::cache::CachedData;
use parking_lot::Mutex;
use shared::{EntityId, ExpandedOrder, Priority};
use std::sync::Arc;

// ============================================================================
// Pure projections
// ============================================================================

/// Ids of orders whose notes or barcode contain `term`, case-insensitively.
/// An empty term returns the full canonical id list.
pub fn search_order_ids(data: &CachedData, term: &str) -> Vec<EntityId> {
    let Some(store) = data.as_orders() else {
        return Vec::new();
    };
    if term.is_empty() {
        return store.ids().to_vec();
    }
    let needle = term.to_lowercase();
    store
        .iter()
        .filter(|order| {
            order.notes.to_lowercase().contains(&needle)
                || order.barcode.to_lowercase().contains(&needle)
        })
        .map(|order| order.id)
        .collect()
}

/// Ids of orders with high priority
pub fn high_priority_order_ids(data: &CachedData) -> Vec<EntityId> {
    let Some(store) = data.as_orders() else {
        return Vec::new();
    };
    store
        .iter()
        .filter(|order| order.priority == Priority::High)
        .map(|order| order.id)
        .collect()
}

/// Ids of orders assigned to `driver_id`
pub fn order_ids_by_driver(data: &CachedData, driver_id: EntityId) -> Vec<EntityId> {
    let Some(store) = data.as_orders() else {
        return Vec::new();
    };
    store
        .iter()
        .filter(|order| order.driver_id == driver_id)
        .map(|order| order.id)
        .collect()
}

/// Ids of users whose name contains `term`, case-insensitively
pub fn search_user_ids(data: &CachedData, term: &str) -> Vec<EntityId> {
    let Some(store) = data.as_users() else {
        return Vec::new();
    };
    if term.is_empty() {
        return store.ids().to_vec();
    }
    let needle = term.to_lowercase();
    store
        .iter()
        .filter(|user| user.name.to_lowercase().contains(&needle))
        .map(|user| user.id)
        .collect()
}

// ============================================================================
// Memoization
// ============================================================================

/// Last (input, argument, output) triple of one selector
struct MemoCell<A, O> {
    last: Mutex<Option<(Arc<CachedData>, A, O)>>,
}

impl<A: PartialEq + Clone, O: Clone> MemoCell<A, O> {
    fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    fn select(
        &self,
        input: &Arc<CachedData>,
        arg: A,
        compute: impl FnOnce(&CachedData, &A) -> O,
    ) -> O {
        let mut last = self.last.lock();
        if let Some((cached_input, cached_arg, output)) = &*last {
            if Arc::ptr_eq(cached_input, input) && *cached_arg == arg {
                return output.clone();
            }
        }
        let output = compute(input, &arg);
        *last = Some((input.clone(), arg, output.clone()));
        output
    }
}

/// Memoized search filter over the normalized orders slot
pub struct OrderSearchSelector {
    memo: MemoCell<String, Arc<[EntityId]>>,
}

impl OrderSearchSelector {
    pub fn new() -> Self {
        Self {
            memo: MemoCell::new(),
        }
    }

    pub fn select(&self, orders: &Arc<CachedData>, term: &str) -> Arc<[EntityId]> {
        self.memo.select(orders, term.to_string(), |data, term| {
            search_order_ids(data, term).into()
        })
    }
}

impl Default for OrderSearchSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoized high-priority subset
pub struct HighPrioritySelector {
    memo: MemoCell<(), Arc<[EntityId]>>,
}

impl HighPrioritySelector {
    pub fn new() -> Self {
        Self {
            memo: MemoCell::new(),
        }
    }

    pub fn select(&self, orders: &Arc<CachedData>) -> Arc<[EntityId]> {
        self.memo
            .select(orders, (), |data, _| high_priority_order_ids(data).into())
    }
}

impl Default for HighPrioritySelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoized orders-by-driver subset
pub struct DriverOrdersSelector {
    memo: MemoCell<EntityId, Arc<[EntityId]>>,
}

impl DriverOrdersSelector {
    pub fn new() -> Self {
        Self {
            memo: MemoCell::new(),
        }
    }

    pub fn select(&self, orders: &Arc<CachedData>, driver_id: EntityId) -> Arc<[EntityId]> {
        self.memo.select(orders, driver_id, |data, &driver_id| {
            order_ids_by_driver(data, driver_id).into()
        })
    }
}

impl Default for DriverOrdersSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoized user search filter (legacy variant)
pub struct UserSearchSelector {
    memo: MemoCell<String, Arc<[EntityId]>>,
}

impl UserSearchSelector {
    pub fn new() -> Self {
        Self {
            memo: MemoCell::new(),
        }
    }

    pub fn select(&self, users: &Arc<CachedData>, term: &str) -> Arc<[EntityId]> {
        self.memo.select(users, term.to_string(), |data, term| {
            search_user_ids(data, term).into()
        })
    }
}

impl Default for UserSearchSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Expanded-orders passthrough, defaulting to an empty sequence while the
/// slot has not loaded yet
pub struct ExpandedOrdersSelector {
    empty: Arc<[ExpandedOrder]>,
    memo: Mutex<Option<(Arc<CachedData>, Arc<[ExpandedOrder]>)>>,
}

impl ExpandedOrdersSelector {
    pub fn new() -> Self {
        Self {
            empty: Arc::from(Vec::new()),
            memo: Mutex::new(None),
        }
    }

    pub fn select(&self, expanded: Option<&Arc<CachedData>>) -> Arc<[ExpandedOrder]> {
        let Some(input) = expanded else {
            return self.empty.clone();
        };
        let mut memo = self.memo.lock();
        if let Some((cached_input, output)) = &*memo {
            if Arc::ptr_eq(cached_input, input) {
                return output.clone();
            }
        }
        let output: Arc<[ExpandedOrder]> = match input.as_expanded_orders() {
            Some(rows) => rows.to_vec().into(),
            None => self.empty.clone(),
        };
        *memo = Some((input.clone(), output.clone()));
        output
    }
}

impl Default for ExpandedOrdersSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;
    use shared::{Order, OrderType};

    fn order(id: EntityId, notes: &str, barcode: &str, priority: Priority) -> Order {
        Order {
            id,
            order_type: OrderType::Delivery,
            priority,
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

    fn orders_data() -> Arc<CachedData> {
        Arc::new(CachedData::Orders(EntityStore::from_rows(vec![
            order(1, "fragile glassware", "PKG-0001", Priority::Low),
            order(2, "call on arrival", "GLS-0002", Priority::High),
            order(3, "", "PKG-0003", Priority::High),
        ])))
    }

    #[test]
    fn empty_term_returns_the_full_canonical_id_list() {
        let data = orders_data();
        assert_eq!(search_order_ids(&data, ""), vec![3, 2, 1]);
    }

    #[test]
    fn search_matches_notes_and_barcode_case_insensitively() {
        let data = orders_data();
        // "gls" hits order 2 via barcode, "GLASS" hits order 1 via notes
        assert_eq!(search_order_ids(&data, "gls"), vec![2]);
        assert_eq!(search_order_ids(&data, "GLASS"), vec![1]);
        assert_eq!(search_order_ids(&data, "PKG"), vec![3, 1]);
        assert!(search_order_ids(&data, "no such thing").is_empty());
    }

    #[test]
    fn high_priority_subset_keeps_canonical_order() {
        let data = orders_data();
        assert_eq!(high_priority_order_ids(&data), vec![3, 2]);
    }

    #[test]
    fn driver_filter_matches_on_the_foreign_key() {
        let mut rows = vec![
            order(1, "", "", Priority::Low),
            order(2, "", "", Priority::Low),
        ];
        rows[0].driver_id = 9;
        let data = Arc::new(CachedData::Orders(EntityStore::from_rows(rows)));
        assert_eq!(order_ids_by_driver(&data, 9), vec![1]);
        assert!(order_ids_by_driver(&data, 8).is_empty());
    }

    #[test]
    fn memoized_output_is_pointer_stable_for_the_same_input() {
        let selector = OrderSearchSelector::new();
        let data = orders_data();

        let first = selector.select(&data, "pkg");
        let second = selector.select(&data, "pkg");
        assert!(Arc::ptr_eq(&first, &second));

        // A different argument recomputes
        let other = selector.select(&data, "gls");
        assert_eq!(other.as_ref(), &[2]);

        // A new input Arc recomputes even with equal contents
        let cloned = Arc::new((*data).clone());
        let recomputed = selector.select(&cloned, "gls");
        assert_eq!(recomputed.as_ref(), other.as_ref());
    }

    #[test]
    fn expanded_passthrough_defaults_to_empty() {
        let selector = ExpandedOrdersSelector::new();
        let rows = selector.select(None);
        assert!(rows.is_empty());
        // The empty default is pointer-stable too
        let again = selector.select(None);
        assert!(Arc::ptr_eq(&rows, &again));
    }
}
