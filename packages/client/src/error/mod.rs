pub mod classification;
pub mod types;

pub use types::{CoreError, Result, ShutdownError};

// Boxed source errors carried through retry and observe failures
pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
