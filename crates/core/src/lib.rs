pub mod accounts;
pub mod category;
pub mod error;
pub mod legacy;
pub mod production;
pub mod roles;
pub mod session;
pub mod types;
