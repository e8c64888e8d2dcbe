//! Client side of the WebEx XML service.

pub mod envelope;
pub mod errors;
pub mod gateway;
pub mod password;
pub mod request;
pub mod responses;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use envelope::{ServiceResponse, XmlElement};
pub use errors::{codes, ErrorSet, ProviderError};
pub use gateway::{CallFailure, CallOutcome, Gateway};
pub use password::generate_password;
pub use request::SecurityContext;
pub use transport::{HttpTransport, Transport};
