pub mod bus;
pub mod connection;
pub mod dispatcher;
pub mod registry;
pub mod server;

pub use bus::{MatchPublisher, NoopPublisher, PublishError};
pub use dispatcher::Dispatcher;
pub use server::{start, ServerConfig, ServerHandle};
