//! REST resource client for the dispatch dashboard
//!
//! The dashboard core talks to a generic JSON resource store
//! (`/orders`, `/drivers`, `/contacts`, `/locations`, `/users`) through the
//! [`ResourceTransport`] trait. [`RestHttpClient`] is the reqwest-backed
//! implementation; the `mock` feature adds a scripted transport for tests.

pub mod error;
pub mod http;
pub mod transport;

#[cfg(feature = "mock")]
pub mod mock;

pub use error::{ClientError, ClientResult};
pub use http::RestHttpClient;
pub use transport::ResourceTransport;
