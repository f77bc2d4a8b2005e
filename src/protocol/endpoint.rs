/*!
Core trait for the two protocol endpoints.

Each endpoint is an explicit state machine. The runner feeds it one input
at a time together with a [`Link`] to the rest of the simulation; an `Err`
from a handler is fatal for that endpoint.
*/

use crate::core::{
    error::{Error, Result},
    message::types::Payload,
    session::state::Role,
};
use crate::sim::{network::Link, scheduler::TimerId};

/// One side of a delivery session
pub trait Endpoint {
    /// Which side this is
    fn role(&self) -> Role;

    /// Called once before the first event is processed
    fn start(&mut self, link: &mut Link<'_>) -> Result<()>;

    /// A channel delivered `payload` to this endpoint
    fn on_payload(&mut self, link: &mut Link<'_>, payload: Payload) -> Result<()>;

    /// A timer this endpoint started has expired
    fn on_timer(&mut self, link: &mut Link<'_>, id: TimerId) -> Result<()>;

    /// Enter the failed state, keeping `error` for the session result
    fn fail(&mut self, error: Error);

    /// The fatal error, if the endpoint failed
    fn error(&self) -> Option<&Error>;

    /// Whether the endpoint will neither send nor change state again
    fn is_terminal(&self) -> bool;
}
