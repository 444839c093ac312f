pub mod download;
pub mod sse;
