//! Types shared between the API and DB models.

pub mod answer;
pub mod question;
pub mod token;
