pub mod aggregate;
pub mod models;
pub mod number;
pub mod reporting;

pub use aggregate::{ProductDelta, SalesDelta};
pub use models::{Order, OrderError, OrderItem, PAYMENT_CASH, STATUS_COMPLETED};
pub use reporting::{DailySummary, ProductSalesRow, SalesReport, SalesTotals};
