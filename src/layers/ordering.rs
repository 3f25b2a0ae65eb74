//! Z-order arithmetic over the active WMS list.
//!
//! Every function is pure over the slice it is given and only ever touches the
//! `z_index` of the target layer (and, for the neighbour moves, of the layer it
//! trades places with). Neighbours are found by a stable sort on `z_index`, so
//! layers sharing a z-index keep their list order.
//!
//! The mutating functions return `true` when any z-index actually changed.

use crate::layers::model::ActiveWmsLayer;

/// Z-index that places a newly shown layer above every current layer.
pub fn next_z_index(layers: &[ActiveWmsLayer]) -> i32 {
    layers
        .iter()
        .map(|layer| layer.z_index)
        .fold(0, i32::max)
        .saturating_add(1)
}

pub fn move_to_front(layers: &mut [ActiveWmsLayer], id: &str) -> bool {
    let Some(target) = position_of(layers, id) else {
        return false;
    };
    let max = layers
        .iter()
        .map(|layer| layer.z_index)
        .fold(0, i32::max);
    set_z_index(&mut layers[target], max.saturating_add(1))
}

pub fn move_to_back(layers: &mut [ActiveWmsLayer], id: &str) -> bool {
    let Some(target) = position_of(layers, id) else {
        return false;
    };
    let min = layers
        .iter()
        .map(|layer| layer.z_index)
        .fold(1, i32::min);
    set_z_index(&mut layers[target], min.saturating_sub(1))
}

/// Trades z-index values with the next layer up. No-op for the topmost layer.
pub fn move_up(layers: &mut [ActiveWmsLayer], id: &str) -> bool {
    let order = stacking_order(layers);
    let Some(rank) = order.iter().position(|&i| layers[i].id == id) else {
        return false;
    };
    match order.get(rank + 1) {
        Some(&above) => swap_z_index(layers, order[rank], above),
        None => false,
    }
}

/// Trades z-index values with the next layer down. No-op for the bottom layer.
pub fn move_down(layers: &mut [ActiveWmsLayer], id: &str) -> bool {
    let order = stacking_order(layers);
    let Some(rank) = order.iter().position(|&i| layers[i].id == id) else {
        return false;
    };
    if rank == 0 {
        return false;
    }
    swap_z_index(layers, order[rank], order[rank - 1])
}

/// Indices of `layers` from bottom to top. `sort_by_key` is stable.
pub fn stacking_order(layers: &[ActiveWmsLayer]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by_key(|&i| layers[i].z_index);
    order
}

fn position_of(layers: &[ActiveWmsLayer], id: &str) -> Option<usize> {
    layers.iter().position(|layer| layer.id == id)
}

fn set_z_index(layer: &mut ActiveWmsLayer, z_index: i32) -> bool {
    let changed = layer.z_index != z_index;
    layer.z_index = z_index;
    changed
}

fn swap_z_index(layers: &mut [ActiveWmsLayer], a: usize, b: usize) -> bool {
    let (za, zb) = (layers[a].z_index, layers[b].z_index);
    if za == zb {
        return false;
    }
    layers[a].z_index = zb;
    layers[b].z_index = za;
    true
}
