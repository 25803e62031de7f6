pub mod config;
pub mod error;
pub mod error_utils;
pub mod keyword;
pub mod source;
pub mod subreddit;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use keyword::*;
pub use source::*;
pub use subreddit::*;
pub use types::*;
