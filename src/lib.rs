pub mod audio;
pub mod bot;
pub mod config;
pub mod event;
pub mod source;
pub mod util;
pub mod voice;
