pub mod collection_list;
pub mod song_list;

pub use collection_list::CollectionList;
pub use song_list::SongList;
