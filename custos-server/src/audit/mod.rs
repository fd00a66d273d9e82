pub mod consumer;
pub mod handlers;
pub mod publisher;
