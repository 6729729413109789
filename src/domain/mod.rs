//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod store;
pub mod unlock;
pub mod view;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::TreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use geometry::{compute_connectors, BoundsSource, Connector, Debounce, Point, Rect};
pub use layout::{Layout, LayoutStyle, ScreenProjection, DEFAULT_VIEWPORT};
pub use store::NodeStore;
pub use unlock::{CompletionOutcome, UnlockEngine, UnlockPolicy};
pub use view::ViewState;
