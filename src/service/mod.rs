pub mod uploads;
pub mod validation;
