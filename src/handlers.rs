pub mod inventory;
pub mod productions;
