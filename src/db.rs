pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod balance_repo;
pub use balance_repo::BalanceRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod production_repo;
pub use production_repo::ProductionRepository;
