mod utils;

pub use utils::{test_db, test_utils};

mod admin;
mod customers;
mod db;
mod trainers;
