pub mod health;
pub mod phrase;
