// Battle schema - closed enumerations shared by the engine crate.
// Types, categories, statuses, the effect table and the item property names
// live here so the catalog codecs and the engine agree on one vocabulary.

pub use effects::*;
pub use item_types::*;
pub use move_types::*;
pub use names::*;
pub use pokemon_types::*;

pub mod effects;
pub mod item_types;
pub mod move_types;
pub mod names;
pub mod pokemon_types;
