pub mod citations;
pub mod event_bus;
pub mod export;
pub mod ports;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;
