mod auth_service_fake;
mod auth_service_impl;
mod relationship_service_impl;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use relationship_service_impl::*;
