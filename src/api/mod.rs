pub mod error;
pub mod middleware;
pub mod routes;

pub use error::UploadError;
pub use middleware::log_request_errors;
pub use routes::{UploadResponse, health, upload_media};
