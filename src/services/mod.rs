pub mod credentials;
pub mod verifier;
