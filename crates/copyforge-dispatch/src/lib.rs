//! Vendor dispatcher for copyforge.
//!
//! This crate is the core of the product: given a user's credential blob, a
//! message, optional skill selections, and a model id, it resolves the vendor
//! that serves the model, composes the system instruction, and invokes that
//! vendor's completion API in either non-streaming or streaming mode.
//!
//! Every vendor failure is classified into one [`ErrorKind`] at the dispatch
//! boundary; nothing vendor-specific leaks past this crate.  Streaming
//! responses from every vendor are adapted into one uniform [`DeltaStream`]
//! of text chunks.

pub mod dispatcher;
pub mod error;
pub mod prompt;
mod sse;
pub mod transport;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ErrorKind, Result};
pub use prompt::compose_instruction;
pub use transport::{CallFailure, HttpVendorClient, VendorClient};
pub use types::{CompletionCall, DeltaStream, GenerationRequest};
