//! Session-token types shared between the Gatherly api service and its tests.
//!
//! Provides JWT claim types, token validation, and session-cookie builders.
//! Token minting lives in the api service; only claim (de)serialization and
//! validation are public here.

pub mod cookie;
pub mod token;
