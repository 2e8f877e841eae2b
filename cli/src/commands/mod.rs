pub mod develop;
pub mod score;
