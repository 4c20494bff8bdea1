pub mod errors;
pub mod db;
pub mod cash_card;
