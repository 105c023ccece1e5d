/*!
 * Access Module
 * Access decisions, role ranking, and listing exclusion sets
 */

mod exclusion;
mod handler;
pub mod roles;

pub use handler::{AccessDecision, AccessHandler, GroupMembership, ObjectAccessCheck};
