//! Row structs and DTOs.
//!
//! Tables keep their Portuguese column names; repositories alias them onto
//! the English field names used here.

pub mod machine;
pub mod password_reset;
pub mod run;
pub mod session;
pub mod stoppage;
pub mod user;
