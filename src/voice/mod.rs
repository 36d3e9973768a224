pub mod call;

pub use call::{SongbirdBackend, SongbirdSink};
