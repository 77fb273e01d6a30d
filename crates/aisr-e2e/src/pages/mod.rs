//! Concrete page objects for the AISR front-end.

mod home;

pub use home::{HomePage, HOME_HEADING, HOME_SUBTITLE};
