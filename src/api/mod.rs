pub mod client;
pub mod corp_codes;
pub mod opendart;
pub mod types;
pub mod viewer;

pub use client::{ClientConfig, DisclosureClient};
pub use opendart::OpenDartClient;
