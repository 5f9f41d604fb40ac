//! Map sync bridge
//!
//! Reconciles the active, coordinate-bearing entities against the rendered
//! markers and frames the camera. The map surface is an injected handle
//! owned by whoever mounts the widget; nothing here reads module-level
//! state. Click and hover events flow back to the owner keyed by the
//! marker's entity id.

use shared::{Driver, EntityId, ExpandedOrder};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Geometry
// ============================================================================

/// Longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Axis-aligned box in longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLatBounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

/// Region shown when nothing is on the map
pub const DEFAULT_BOUNDS: LngLatBounds = LngLatBounds {
    sw: LngLat::new(44.0, 25.0),
    ne: LngLat::new(63.5, 39.8),
};

/// Half-size of the box framed around a single point, in degrees
pub const SINGLE_POINT_OFFSET: f64 = 0.01;

/// ±0.01° box centered on one point
pub fn point_bounds(center: LngLat) -> LngLatBounds {
    LngLatBounds {
        sw: LngLat::new(center.lng - SINGLE_POINT_OFFSET, center.lat - SINGLE_POINT_OFFSET),
        ne: LngLat::new(center.lng + SINGLE_POINT_OFFSET, center.lat + SINGLE_POINT_OFFSET),
    }
}

/// Smallest box containing all points. A single point gets the fixed-offset
/// box, the empty set the default region.
pub fn calc_bounds(points: &[LngLat]) -> LngLatBounds {
    match points {
        [] => DEFAULT_BOUNDS,
        [point] => point_bounds(*point),
        [first, rest @ ..] => {
            let mut sw = *first;
            let mut ne = *first;
            for point in rest {
                sw.lng = sw.lng.min(point.lng);
                sw.lat = sw.lat.min(point.lat);
                ne.lng = ne.lng.max(point.lng);
                ne.lat = ne.lat.max(point.lat);
            }
            LngLatBounds { sw, ne }
        }
    }
}

// ============================================================================
// Surface contract
// ============================================================================

/// Camera animation options for a bounds fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Margin in pixels kept around the framed box
    pub padding: u32,
    pub max_zoom: f64,
    pub duration_ms: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: 50,
            max_zoom: 14.0,
            duration_ms: 1000,
        }
    }
}

impl FitOptions {
    /// Tighter framing used while a single order is selected
    pub const fn detail() -> Self {
        Self {
            padding: 200,
            max_zoom: 15.0,
            duration_ms: 1000,
        }
    }
}

/// Default raster tile template
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Raster tile source descriptor handed to the map widget
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    pub tile_url: String,
    pub tile_size: u32,
    pub source_max_zoom: u8,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_size: 256,
            source_max_zoom: 19,
        }
    }
}

/// Opaque marker handle assigned by the surface
pub type MarkerHandle = u64;

/// What the widget needs to render one marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: EntityId,
    pub position: LngLat,
    /// Pin color
    pub color: Option<String>,
    /// Popup text (the contact name for orders)
    pub label: String,
}

/// Rendering surface contract, injected into the bridge
pub trait MapSurface {
    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerHandle;
    fn set_marker_position(&mut self, handle: MarkerHandle, position: LngLat);
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn fit_bounds(&mut self, bounds: LngLatBounds, options: FitOptions);
    fn pan_to(&mut self, center: LngLat, duration_ms: u64);
}

// ============================================================================
// Spec builders
// ============================================================================

/// Marker specs for the active, coordinate-bearing orders
pub fn order_markers(orders: &[ExpandedOrder]) -> Vec<MarkerSpec> {
    orders
        .iter()
        .filter(|row| row.order.active)
        .filter_map(|row| {
            let location = row.location.as_ref()?;
            Some(MarkerSpec {
                id: row.order.id,
                position: LngLat::new(location.longitude, location.latitude),
                color: row.order.color.clone(),
                label: row
                    .contact
                    .as_ref()
                    .map(|contact| contact.name.clone())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Marker specs for drivers that report telemetry
pub fn driver_markers(drivers: &[Driver]) -> Vec<MarkerSpec> {
    drivers
        .iter()
        .filter_map(|driver| {
            let track = driver.geojson.as_ref()?;
            Some(MarkerSpec {
                id: driver.id,
                position: LngLat::new(track.current.longitude, track.current.latitude),
                color: None,
                label: driver.name.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Bridge
// ============================================================================

struct MarkerState {
    handle: MarkerHandle,
    position: LngLat,
}

/// Keeps the rendered markers in step with the entity set and frames the
/// camera around them
pub struct MapSyncBridge<S: MapSurface> {
    surface: S,
    markers: HashMap<EntityId, MarkerState>,
    selected: Option<EntityId>,
    fit: FitOptions,
    detail_fit: FitOptions,
}

impl<S: MapSurface> MapSyncBridge<S> {
    /// Takes ownership of the surface handle; the caller manages the
    /// widget's mount/unmount lifecycle.
    pub fn new(surface: S) -> Self {
        Self::with_fit_options(surface, FitOptions::default(), FitOptions::detail())
    }

    pub fn with_fit_options(surface: S, fit: FitOptions, detail_fit: FitOptions) -> Self {
        Self {
            surface,
            markers: HashMap::new(),
            selected: None,
            fit,
            detail_fit,
        }
    }

    /// Currently selected entity, if any
    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Select one entity for detail framing, or clear with `None`.
    /// Reframes immediately from the marker table.
    pub fn select(&mut self, id: Option<EntityId>) {
        self.selected = id;
        self.frame();
    }

    /// Reconcile markers against `specs`, then reframe the camera.
    ///
    /// Markers whose entity left the set are removed, new ones added, and
    /// existing ones repositioned in place; a marker is never destroyed and
    /// recreated just to move it.
    pub fn sync(&mut self, specs: &[MarkerSpec]) {
        let keep: HashSet<EntityId> = specs.iter().map(|spec| spec.id).collect();
        let gone: Vec<EntityId> = self
            .markers
            .keys()
            .copied()
            .filter(|id| !keep.contains(id))
            .collect();
        for id in gone {
            if let Some(state) = self.markers.remove(&id) {
                self.surface.remove_marker(state.handle);
            }
        }

        for spec in specs {
            match self.markers.get_mut(&spec.id) {
                Some(state) => {
                    if state.position != spec.position {
                        self.surface.set_marker_position(state.handle, spec.position);
                        state.position = spec.position;
                    }
                }
                None => {
                    let handle = self.surface.add_marker(spec);
                    self.markers.insert(
                        spec.id,
                        MarkerState {
                            handle,
                            position: spec.position,
                        },
                    );
                }
            }
        }

        tracing::debug!(markers = self.markers.len(), "Map markers reconciled");
        self.frame();
    }

    /// Center the camera on one point
    pub fn pan_to(&mut self, center: LngLat) {
        self.surface.pan_to(center, self.fit.duration_ms);
    }

    /// Frame the selected entity, or the aggregate of all markers.
    /// With nothing to show the camera stays put.
    fn frame(&mut self) {
        if let Some(id) = self.selected {
            if let Some(state) = self.markers.get(&id) {
                let bounds = point_bounds(state.position);
                self.surface.fit_bounds(bounds, self.detail_fit);
                return;
            }
        }
        if self.markers.is_empty() {
            return;
        }
        let points: Vec<LngLat> = self.markers.values().map(|state| state.position).collect();
        self.surface.fit_bounds(calc_bounds(&points), self.fit);
    }

    /// The injected surface, for owner-side teardown
    pub fn into_surface(self) -> S {
        self.surface
    }
}
