pub mod balance_service;
pub use balance_service::BalanceService;
pub mod movement_service;
pub use movement_service::MovementService;
pub mod production_service;
pub use production_service::ProductionService;
