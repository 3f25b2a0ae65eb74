use crate::constants::{MAX_SHARED_ZOOM, MIN_SHARED_ZOOM};
use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// The current view of the map: center and integer zoom level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: u8,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self { center, zoom }
    }

    pub fn from_coords(lat: f64, lng: f64, zoom: u8) -> Self {
        Self::new(LatLng::new(lat, lng), zoom)
    }

    /// Builds a viewport from the server's `[lat, lng]` pair.
    ///
    /// Returns `None` when fewer than two coordinates are supplied.
    pub fn from_lat_long(lat_long: &[f64], zoom: u8) -> Option<Self> {
        match lat_long {
            [lat, lng, ..] => Some(Self::from_coords(*lat, *lng, zoom)),
            _ => None,
        }
    }

    /// Whether this viewport may be restored from a shared link
    pub fn is_shareable(&self) -> bool {
        self.center.is_finite()
            && self.center.is_valid()
            && (MIN_SHARED_ZOOM..=MAX_SHARED_ZOOM).contains(&self.zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), 12)
    }
}
