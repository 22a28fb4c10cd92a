pub mod connection;
pub mod posts;
