pub mod datetime;
pub mod email;
pub mod password;
