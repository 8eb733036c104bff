pub mod catalog;
pub mod inventory;
pub mod ledger;
pub mod production;
