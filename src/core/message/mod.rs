/*!
Channel payloads and the basis codec.
*/

pub mod basis;
pub mod types;

pub use basis::{Basis, BasisCodec};
pub use types::{ClassicalMessage, Payload, QubitSlot};
