pub mod cache;
pub mod envelope;
pub mod fingerprint;
pub mod history;
pub mod results;
pub mod session;
