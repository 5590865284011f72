pub mod analysis;
pub mod order;
