pub mod event;
pub mod login;
pub mod otp;
pub mod participant;
pub mod password;
pub mod register;
pub mod session;
