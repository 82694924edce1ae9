//! Domain types shared by the fetch, storage and serving layers.

pub mod player;
pub mod snapshot;
pub mod window;

pub use player::*;
pub use snapshot::*;
pub use window::*;
