/*!
States of the two protocol endpoints.
*/

pub mod state;

pub use self::state::{InitiatorState, ResponderState, Role};
