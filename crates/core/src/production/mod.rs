//! Run/stoppage state machine and the store contract it runs on.

pub mod engine;
pub mod memory;
pub mod state;
pub mod store;
pub mod timing;

pub use engine::{
    MachineSnapshot, ProductionEngine, RunOutcome, RunTransition, StoppageOutcome,
    StoppageTransition,
};
pub use memory::MemoryStore;
pub use state::MachineState;
pub use store::{MachineTx, OpenRun, OpenStoppage, ProductionStore};
