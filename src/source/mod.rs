pub mod ytdlp;

pub use ytdlp::YtDlpResolver;
