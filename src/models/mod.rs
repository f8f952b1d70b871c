pub mod settings;
pub mod stream;
pub mod user;
