pub mod burn;
pub mod lp;
pub mod mint;
pub mod oracle;
pub mod query;

pub use mint::{MintReceipt, MintRequest};
pub use query::LpSnapshot;
