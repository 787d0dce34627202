//! Local queue of pending intents

pub mod ports;

pub use ports::SubscriptionQueue;
