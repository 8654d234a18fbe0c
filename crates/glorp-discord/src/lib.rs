pub mod adapter;
pub mod cooldown;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod presence;
pub mod random;
pub mod reactions;
pub mod responses;
pub mod rest;
pub mod rules;
pub mod send;
pub mod votes;

pub use adapter::DiscordAdapter;
pub use dispatcher::{Dispatcher, DispatcherDeps};
pub use error::{DiscordError, DispatchError};
pub use gateway::{Gateway, GatewayError};
pub use handler::GlorpHandler;
pub use rest::SerenityGateway;
