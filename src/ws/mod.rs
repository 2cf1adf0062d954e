//! WebSocket layer: the gateway between clients and the duel service.
//!
//! The endpoint at `/ws` carries named events both ways: inbound commands
//! are dispatched to the [`crate::service::DuelService`], and outbound
//! deliveries are filtered per connection by [`subscription::SessionScopes`].

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
