//! @ai:module:intent Endpoint invocation and run sequencing
//! @ai:module:layer infrastructure
//! @ai:module:public_api RuntimeClient, MockTransport, EndpointInvoker, RunController, KeypressExtension

pub mod client;
pub mod controller;
pub mod extension;
pub mod invoker;

pub use client::{InferenceTransport, MockTransport, RuntimeClient};
pub use controller::RunController;
pub use extension::{CallPosition, ExtensionSource, KeypressExtension, NoExtension};
pub use invoker::{DocumentSource, EndpointInvoker, InvocationResult};
