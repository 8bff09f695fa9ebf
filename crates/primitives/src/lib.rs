mod partition;
mod types;


pub use partition::*;
pub use types::*;
