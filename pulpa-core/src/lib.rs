pub mod repository;

pub use repository::{BoxError, OrderRepository, ProductRepository, SalesRepository};
