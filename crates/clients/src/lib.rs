//! HTTP adapters for the remote account and hospital services.
//!
//! Both clients forward the caller's bearer credential unmodified and bound
//! every call by the configured timeout. A well-formed negative answer is
//! `Ok(false)`; anything that prevents an answer is
//! `TimeError::UpstreamUnavailable`.

pub mod account;
pub mod config;
pub mod hospital;
mod http;

pub use account::AccountServiceClient;
pub use config::ClientConfig;
pub use hospital::HospitalServiceClient;
