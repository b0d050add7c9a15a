pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod order_repo;
pub mod sales_repo;

pub use catalog_repo::StoreProductRepository;
pub use database::DbClient;
pub use order_repo::StoreOrderRepository;
pub use sales_repo::StoreSalesRepository;
