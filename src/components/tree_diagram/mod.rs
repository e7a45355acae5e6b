mod component;
pub mod config;
pub mod diff;
pub mod hierarchy;
pub mod layout;
mod render;
pub mod scene;
pub mod state;
pub mod transition;
mod types;
pub mod viewport;

pub use component::TreeDiagram;
pub use config::DiagramConfig;
pub use state::TreeDiagramState;
pub use types::{NodeLabel, RawNode};
