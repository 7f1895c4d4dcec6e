pub mod facility;
pub mod shifts;
