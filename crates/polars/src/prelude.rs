pub use polars::prelude::*;
pub use polars_core::prelude::CompatLevel;
