pub mod db;
pub mod models;

pub use db::{Database, DatabaseStats};
pub use models::SubmissionRecord;
