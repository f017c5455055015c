pub mod alerts;
pub mod custom_lists;
pub mod db;
pub mod error;
pub mod models;
pub mod stocks;
pub mod users;

pub use alerts::AlertManager;
pub use custom_lists::CustomListManager;
pub use db::DashboardDb;
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use users::UserManager;
