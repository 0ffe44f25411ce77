//! `shapecheck` memory infrastructure
//!
//! - **Arenas**: index-addressed, append-only storage with typed ids and
//!   reserve/define support for self-referential graphs
//! - **String interning**: deduplicated names referenced by [`Symbol`]

pub mod arena;
pub mod interner;

pub use arena::{Arena, ArenaError, Id};
pub use interner::{Interner, Symbol};
