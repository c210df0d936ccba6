//! Chat relay core.
//!
//! A request flows through three stages:
//! - [`validate`] turns the raw JSON body into a [`request::ChatRequest`] or rejects it.
//! - [`relay`] defines the [`relay::ChatProvider`] seam; [`openai`] is the production
//!   implementation that streams from an OpenAI-compatible endpoint.
//! - [`forward`] copies the resulting [`relay::ChunkStream`] onto the HTTP response,
//!   stopping early if the client disconnects.

pub mod forward;
pub mod openai;
pub mod relay;
pub mod request;
pub mod validate;

pub use forward::streaming_response;
pub use openai::OpenAiProvider;
pub use relay::{ChatProvider, RelayError};
pub use request::ChatPhase;
pub use validate::{validate_chat_request, ChatRequestError};
