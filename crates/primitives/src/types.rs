pub type Name = &'static str;

pub type BlockNumber = u64;
