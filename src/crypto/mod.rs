/// Cryptography module for signed-message verification
///
/// Handles secp256k1 recovery of personal message signatures

pub mod personal_sign;

pub use personal_sign::{recover_message_address, Address};
