use pulpa_core::repository::{OrderRepository, ProductRepository, SalesRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub expiration: u64,
    pub staff_passcode: String,
}

#[derive(Clone)]
pub struct UploadSettings {
    pub dir: String,
    pub base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub product_repo: Arc<dyn ProductRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub sales_repo: Arc<dyn SalesRepository>,
    pub auth: AuthSettings,
    pub uploads: UploadSettings,
}
