pub mod external_apis;
pub mod models;
pub mod repositories;
