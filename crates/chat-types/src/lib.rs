pub mod citation;
pub mod error;
pub mod event;
pub mod message;


pub use error::ChatError;
pub type Result<T> = std::result::Result<T, ChatError>;
