pub mod endpoint_validation;
pub mod isolation;
pub mod wav;

pub use endpoint_validation::{EndpointValidationError, validate_endpoint};
pub use isolation::catch_panic;
pub use wav::WavFileSink;
