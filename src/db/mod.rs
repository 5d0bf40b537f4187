mod assignments;
mod goals;
mod messages;
mod notifications;
mod profiles;
mod progress;
mod registrations;
mod resources;
mod subscriptions;
mod training;
mod user_sessions;
mod users;

pub use assignments::*;
pub use goals::*;
pub use messages::*;
pub use notifications::*;
pub use profiles::*;
pub use progress::*;
pub use registrations::*;
pub use resources::*;
pub use subscriptions::*;
pub use training::*;
pub use user_sessions::*;
pub use users::*;

/// Joins that attach the customer's and the trainer's user names to a row aliased `x`
/// with `customer_id` and `trainer_id` columns.
pub(crate) const PARTY_COLUMNS: &str = "cu.username AS customer_username, \
     cu.first_name AS customer_first_name, \
     cu.last_name AS customer_last_name, \
     tu.username AS trainer_username, \
     tu.first_name AS trainer_first_name, \
     tu.last_name AS trainer_last_name";

pub(crate) const PARTY_JOINS: &str = "JOIN customers c ON c.id = x.customer_id \
     JOIN users cu ON cu.id = c.user_id \
     JOIN trainers t ON t.id = x.trainer_id \
     JOIN users tu ON tu.id = t.user_id";

/// `%term%` for LIKE searches.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}
