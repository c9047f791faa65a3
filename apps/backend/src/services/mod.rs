pub mod gateway;
pub mod registry;
