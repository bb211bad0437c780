//! Patchbay graph model
//!
//! Owns groups, ports, portgroups and connections, plus the id allocator
//! that names them. Knows nothing about the canvas or the backend.

mod ids;
mod state;
mod types;

pub use ids::{IdAllocator, IdKind};
pub use state::{GraphModel, PortMove, PortRemoval, natural_cmp};
pub use types::*;
