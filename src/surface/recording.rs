//! In-memory [`MapSurface`] that records every command it receives.
//!
//! Used by tests and by the headless viewer to show what a real map would
//! have been told to do.

use crate::core::geo::LatLngBounds;
use crate::layers::model::PathStyle;
use crate::surface::{
    FeatureInspector, InspectRequest, MapSurface, TileLayerOptions, VectorLayerSpec, WmsTileOptions,
};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    AddTile {
        handle: u64,
        options: TileLayerOptions,
    },
    AddWms {
        handle: u64,
        options: WmsTileOptions,
    },
    SetWmsOpacity {
        handle: u64,
        opacity: f64,
    },
    SetWmsZIndex {
        handle: u64,
        z_index: i32,
    },
    AddVector {
        handle: u64,
        id: String,
        features: usize,
        markers: usize,
        style: PathStyle,
    },
    SetVectorStyle {
        handle: u64,
        style: PathStyle,
    },
    Remove {
        handle: u64,
    },
    FitBounds(LatLngBounds),
}

impl SurfaceOp {
    pub fn is_camera(&self) -> bool {
        matches!(self, SurfaceOp::FitBounds(_))
    }
}

impl std::fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceOp::AddTile { handle, options } => write!(
                f,
                "#{} add tiles {} from {} (z {})",
                handle, options.id, options.url, options.z_index
            ),
            SurfaceOp::AddWms { handle, options } => write!(
                f,
                "#{} add wms {} from {} (opacity {}, z {})",
                handle, options.layers, options.url, options.opacity, options.z_index
            ),
            SurfaceOp::SetWmsOpacity { handle, opacity } => {
                write!(f, "#{} opacity {}", handle, opacity)
            }
            SurfaceOp::SetWmsZIndex { handle, z_index } => write!(f, "#{} z {}", handle, z_index),
            SurfaceOp::AddVector {
                handle,
                id,
                features,
                markers,
                ..
            } => write!(
                f,
                "#{} add vector {} ({} features, {} markers)",
                handle, id, features, markers
            ),
            SurfaceOp::SetVectorStyle { handle, style } => {
                write!(f, "#{} style {:?}", handle, style)
            }
            SurfaceOp::Remove { handle } => write!(f, "#{} remove", handle),
            SurfaceOp::FitBounds(bounds) => write!(
                f,
                "fit [{}, {}] - [{}, {}]",
                bounds.south_west.lat,
                bounds.south_west.lng,
                bounds.north_east.lat,
                bounds.north_east.lng
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    tile_layers: FxHashMap<u64, TileLayerOptions>,
    wms_layers: FxHashMap<u64, WmsTileOptions>,
    vector_layers: FxHashMap<u64, VectorLayerSpec>,
    next_handle: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Returns the recorded commands and starts a fresh log
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn fit_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_camera()).count()
    }

    pub fn mounted_count(&self) -> usize {
        self.tile_layers.len() + self.wms_layers.len() + self.vector_layers.len()
    }

    /// Mounted tile layers, in no particular order
    pub fn tile_layers(&self) -> Vec<&TileLayerOptions> {
        self.tile_layers.values().collect()
    }

    /// Options of the mounted WMS layer with the given remote name
    pub fn wms_layer(&self, name: &str) -> Option<&WmsTileOptions> {
        self.wms_layers.values().find(|options| options.layers == name)
    }

    pub fn vector_layer(&self, id: &str) -> Option<&VectorLayerSpec> {
        self.vector_layers.values().find(|spec| spec.id == id)
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl MapSurface for RecordingSurface {
    type Handle = u64;

    fn add_tile_layer(&mut self, options: &TileLayerOptions) -> u64 {
        let handle = self.allocate();
        self.tile_layers.insert(handle, options.clone());
        self.ops.push(SurfaceOp::AddTile {
            handle,
            options: options.clone(),
        });
        handle
    }

    fn add_wms_layer(&mut self, options: &WmsTileOptions) -> u64 {
        let handle = self.allocate();
        self.wms_layers.insert(handle, options.clone());
        self.ops.push(SurfaceOp::AddWms {
            handle,
            options: options.clone(),
        });
        handle
    }

    fn set_wms_opacity(&mut self, handle: &u64, opacity: f64) {
        if let Some(options) = self.wms_layers.get_mut(handle) {
            options.opacity = opacity;
        }
        self.ops.push(SurfaceOp::SetWmsOpacity {
            handle: *handle,
            opacity,
        });
    }

    fn set_wms_z_index(&mut self, handle: &u64, z_index: i32) {
        if let Some(options) = self.wms_layers.get_mut(handle) {
            options.z_index = z_index;
        }
        self.ops.push(SurfaceOp::SetWmsZIndex {
            handle: *handle,
            z_index,
        });
    }

    fn add_vector_layer(&mut self, spec: VectorLayerSpec) -> u64 {
        let handle = self.allocate();
        self.ops.push(SurfaceOp::AddVector {
            handle,
            id: spec.id.clone(),
            features: spec.features.len(),
            markers: spec.marker_count(),
            style: spec.style.clone(),
        });
        self.vector_layers.insert(handle, spec);
        handle
    }

    fn set_vector_style(&mut self, handle: &u64, style: &PathStyle) {
        if let Some(spec) = self.vector_layers.get_mut(handle) {
            spec.style = spec.style.merged(style);
        }
        self.ops.push(SurfaceOp::SetVectorStyle {
            handle: *handle,
            style: style.clone(),
        });
    }

    fn remove_layer(&mut self, handle: u64) {
        self.tile_layers.remove(&handle);
        self.wms_layers.remove(&handle);
        self.vector_layers.remove(&handle);
        self.ops.push(SurfaceOp::Remove { handle });
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds) {
        self.ops.push(SurfaceOp::FitBounds(bounds.clone()));
    }
}

/// [`FeatureInspector`] that keeps every request; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingInspector {
    requests: Rc<RefCell<Vec<InspectRequest>>>,
}

impl RecordingInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<InspectRequest> {
        self.requests.borrow().clone()
    }
}

impl FeatureInspector for RecordingInspector {
    fn inspect(&self, request: InspectRequest) {
        self.requests.borrow_mut().push(request);
    }
}
