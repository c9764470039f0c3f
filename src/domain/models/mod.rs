pub mod commit;
pub mod credentials;
pub mod dashboard;
