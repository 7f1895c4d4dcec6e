pub mod auth;
pub mod shifts;
