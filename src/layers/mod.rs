pub mod actions;
pub mod model;
pub mod ordering;
pub mod store;
