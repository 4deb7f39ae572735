//! Succinct proof boundary
//!
//! The amount-decryption circuit is proven off-ledger. The ledger only sees
//! a fixed-size proof and its public signals, asks a [`ProofVerifier`] for a
//! verdict, and then binds the signals to the output it proved by Merkle
//! inclusion and curve replay.
//!
//! ## Public signal layout
//!
//! | index    | value                                   |
//! |----------|-----------------------------------------|
//! | 0        | decrypted amount (piconero)             |
//! | 1        | output commitment                       |
//! | 2        | encrypted amount (`ecdhAmount`)         |
//! | 3..67    | amount key bits, least significant first|
//! | 67       | `R.x`                                   |
//! | 68       | `S.x`                                   |
//! | 69       | `P.x`                                   |

pub mod types;
pub mod verifier;

pub use types::*;
pub use verifier::*;
