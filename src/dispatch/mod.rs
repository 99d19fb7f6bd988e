//! Command dispatcher
//!
//! The outer command surface of the engine: ENCRYPT, DECRYPT, the gate
//! opcodes, BOOTSTRAP and LOAD_KEY. Payload shapes are validated against
//! the parameter set before anything is routed to the engine.

mod command;
mod dispatcher;

pub use command::{Opcode, Request, Response};
pub use dispatcher::Dispatcher;
