pub mod account;
pub mod bank;
pub mod burn;
pub mod intent;
pub mod lp;
pub mod nullifier;
pub mod oracle;
pub mod valuation;

pub use account::*;
pub use bank::*;
pub use burn::*;
pub use intent::*;
pub use lp::*;
pub use nullifier::*;
pub use oracle::*;
pub use valuation::*;
