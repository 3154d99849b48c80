pub mod gate;
pub mod graph;
pub mod provider;

pub use gate::*;
pub use graph::*;
pub use provider::*;
