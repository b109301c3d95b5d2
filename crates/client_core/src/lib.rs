//! Client side of the Partz Finda connector: typed operations over HTTP,
//! polling query subscriptions, and the generative request assistant.

pub mod assistant;
pub mod connector;
pub mod error;
pub mod forms;
pub mod generative;
pub mod subscription;
pub mod transport;

pub use assistant::{AssistantSession, InMemoryTranscript, TranscriptStore, FALLBACK_MESSAGE, WELCOME_MESSAGE};
pub use connector::ExampleConnector;
pub use error::{ConnectorError, GenerativeError};
pub use forms::{PartRequestForm, ShopProfileForm};
pub use generative::{GeneratedReply, GenerativeClient, GenerativeConfig, TextGenerator};
pub use subscription::{QueryRef, QuerySubscription};
pub use transport::{HttpTransport, OperationTransport};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
