pub mod facility;
pub mod staffing;
