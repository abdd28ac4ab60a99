// Resource handler modules. Thin by design: validate, hit the store,
// serialize the answer.

pub mod common;
pub mod notes;
pub mod users;
pub mod validation;

pub use common::{ListResponse, MessageResponse};
