//! AI systems (FSM tick + reactions)

pub mod fsm;
pub mod reactions;

pub use fsm::*;
pub use reactions::*;
