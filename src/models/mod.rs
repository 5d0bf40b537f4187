use chrono::{DateTime, NaiveDateTime, Utc};

pub mod assignment;
pub mod goal;
pub mod message;
pub mod page;
pub mod profile;
pub mod progress;
pub mod registration;
pub mod resource;
pub mod subscription;
pub mod training;

pub use assignment::*;
pub use goal::*;
pub use message::*;
pub use page::*;
pub use profile::*;
pub use progress::*;
pub use registration::*;
pub use resource::*;
pub use subscription::*;
pub use training::*;

pub(crate) fn utc(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

pub(crate) fn utc_opt(dt: Option<NaiveDateTime>) -> Option<DateTime<Utc>> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
}

pub(crate) fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}
