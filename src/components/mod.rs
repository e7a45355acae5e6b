//! Reusable visualization components.

pub mod tree_diagram;
