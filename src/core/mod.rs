//! Media fetcher core: options, engine, progress and results

pub mod engine;
pub mod fetcher;
pub mod options;
pub mod progress;
pub mod video_info;

pub use engine::*;
pub use fetcher::*;
pub use options::*;
pub use progress::*;
pub use video_info::*;
