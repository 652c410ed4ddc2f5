pub mod connection;
pub mod dispatcher;

pub use connection::{GatewayContext, handle_connection, verify_token};
pub use dispatcher::Dispatcher;
