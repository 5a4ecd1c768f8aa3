pub mod chat;
pub mod laptop;
