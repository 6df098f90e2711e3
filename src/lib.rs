pub mod adapters;
pub mod api;
pub mod application;
pub mod domain;
pub mod notify;
pub mod ports;
pub mod scheduler;
