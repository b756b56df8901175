//! Remote sink implementations

pub mod auth;
pub mod cloud;
pub mod remote;
pub mod transport;

pub use auth::TokenSource;
pub use cloud::{CloudLoggingSink, CloudSinkConfig};
pub use remote::{RecordingSink, RemoteSink};
pub use transport::{HttpTransport, MonitoredResource, Transport, WireEntry, WriteRequest};
