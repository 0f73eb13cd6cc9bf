pub mod collection;
pub mod track;

pub use collection::{Collection, CollectionKind, RawCollection};
pub use track::{RawSong, Track};
