pub mod enrich;
pub mod errors;
pub mod job;
pub mod pipeline;
pub mod registry;
pub mod run;
pub mod scan;
pub mod sync;
pub mod writer;


pub use enrich::Enricher;
pub use pipeline::*;
pub use registry::SequencerRegistry;
pub use run::{RunReport, Runner, TaskFailure};
pub use sync::{PairingPolicy, Partition, PartitionPair};
