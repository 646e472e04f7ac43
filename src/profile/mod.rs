//! User profiles collected by the details dialog.

pub mod model;
pub mod store;

pub use model::{AGE_WITHHELD, Age, UserProfile};
pub use store::{ProfileChange, ProfileDraft, ProfileStore};
