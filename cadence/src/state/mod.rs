//! Command lifecycle states and the machine that walks them.
//!
//! - [`CommandState`]: the eleven lifecycle states, three of them terminal.
//! - [`TransitionTable`]: which state may follow which.
//! - [`StateMachine`]: per-execution current state plus its
//!   [`TransitionHistory`].
//!
//! The machine never raises. An illegal request returns `false` and the state
//! is left as it was.

mod command_state;
mod history;
mod machine;
mod table;

pub use command_state::CommandState;
pub use history::{Transition, TransitionHistory};
pub use machine::StateMachine;
pub use table::{TransitionEdge, TransitionTable};
