//! Entity and collection savers.
//!
//! - [`ModelSaver`]: one entity against pre-compiled statements
//! - [`ListModelSaver`]: whole collections, compiling statements once per call
//! - [`CacheableListModelSaver`]: a [`ListModelSaver`] that mirrors each
//!   successful write into a [`CacheAdapter`](crate::adapter::CacheAdapter)

pub mod cacheable_list_saver;
pub mod list_saver;
pub mod model_saver;

pub use cacheable_list_saver::CacheableListModelSaver;
pub use list_saver::{ListModelSaver, ListSaver, Operation};
pub use model_saver::ModelSaver;
