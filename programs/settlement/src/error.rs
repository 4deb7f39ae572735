use std::fmt;

use thiserror::Error;

use crate::crypto::address::Network;
use crate::crypto::encoding::ByteOrder;
use crate::state::Asset;

/// Result alias used by every ledger entry point
pub type Result<T, E = SettlementError> = std::result::Result<T, E>;

/// Failures of the curve arithmetic library and its encodings
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    #[error("point is not on the curve")]
    PointNotOnCurve,

    #[error("non-canonical field element or point encoding")]
    NonCanonical,

    #[error("scalar is not reduced modulo the group order")]
    NonCanonicalScalar,

    #[error("encoded as {found:?} but the pipeline expects {expected:?}")]
    EncodingMismatch { expected: ByteOrder, found: ByteOrder },

    #[error("identity or small-order point")]
    SmallOrder,
}

/// Failures decoding a Monero address
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 character {0:?}")]
    InvalidCharacter(char),

    #[error("invalid base58 block length {0}")]
    InvalidBlockLength(usize),

    #[error("base58 block overflows its byte width")]
    BlockOverflow,

    #[error("address decodes to {0} bytes, not a standard or integrated address")]
    InvalidLength(usize),

    #[error("address checksum mismatch")]
    Checksum,

    #[error("unknown address prefix {0:#04x}")]
    UnknownPrefix(u8),

    #[error("subaddresses cannot receive deposits")]
    Subaddress,

    #[error("address is for {found:?}, expected {expected:?}")]
    WrongNetwork { expected: Network, found: Network },

    #[error("address key rejected: {0}")]
    InvalidKey(CurveError),
}

/// Which externally supplied point failed admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    Ephemeral,
    ViewKey,
    SharedInput,
    SharedSecret,
    OutputKey,
    SpendKey,
    DleqNonceBase,
    DleqNonceShared,
}

impl fmt::Display for PointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointRole::Ephemeral => "ephemeral key R",
            PointRole::ViewKey => "view key A",
            PointRole::SharedInput => "shared input rA",
            PointRole::SharedSecret => "shared secret S",
            PointRole::OutputKey => "output key P",
            PointRole::SpendKey => "spend key B",
            PointRole::DleqNonceBase => "DLEQ commitment K1",
            PointRole::DleqNonceShared => "DLEQ commitment K2",
        };
        f.write_str(name)
    }
}

/// Public-signal slot that disagreed with the replayed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalField {
    Commitment,
    Ciphertext,
    AmountKeyBit(usize),
    EphemeralX,
    SharedSecretX,
    OutputKeyX,
}

/// Conditions the caller can satisfy and then retry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("liquidity provider is not registered")]
    UnknownLp,

    #[error("liquidity provider is already registered")]
    LpAlreadyRegistered,

    #[error("liquidity provider is not active")]
    LpInactive,

    #[error("fee of {0} bps exceeds 10000")]
    InvalidFee(u16),

    #[error("destination address rejected: {0}")]
    InvalidDestination(AddressError),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("operation does not accept native value, got {0}")]
    UnexpectedValue(u128),

    #[error("insufficient {asset:?} balance: need {needed}, have {available}")]
    InsufficientBalance { asset: Asset, needed: u128, available: u128 },

    #[error("insufficient uncommitted collateral: need {needed}, have {available}")]
    InsufficientCollateral { needed: u128, available: u128 },

    #[error("requested {requested} exceeds available capacity {available}")]
    InsufficientCapacity { requested: u128, available: u128 },

    #[error("liquidity provider backs only {backed}, cannot burn {requested}")]
    InsufficientBacking { requested: u128, backed: u128 },

    #[error("intent of {requested} is below the minimum of {minimum}")]
    IntentBelowMinimum { requested: u128, minimum: u128 },

    #[error("anti-griefing deposit {provided} is below the required {required}")]
    DepositTooSmall { required: u128, provided: u128 },

    #[error("amount {amount} is below the minimum of {minimum}")]
    AmountBelowMinimum { amount: u128, minimum: u128 },

    #[error("collateral ratio {ratio_bps} bps is below the required {required_bps} bps")]
    RatioTooLow { ratio_bps: u128, required_bps: u128 },

    #[error("liquidity provider is at or above the safe ratio")]
    LpHealthy,

    #[error("no price has been published yet")]
    PriceUnavailable,

    #[error("price is {age}s old, maximum is {max}s")]
    StalePrice { age: u64, max: u64 },

    #[error("prices must be strictly positive")]
    InvalidPrice,

    #[error("price quote timestamp {as_of} is outside the accepted window")]
    PriceOutOfWindow { as_of: u64 },

    #[error("block {0} has not been relayed")]
    MissingBlock(u64),

    #[error("block height {height} does not extend the latest height {latest}")]
    NonMonotonicHeight { latest: u64, height: u64 },

    #[error("mint intent not found")]
    IntentNotFound,

    #[error("mint intent expired")]
    IntentExpired,

    #[error("mint intent timeout has not elapsed")]
    IntentNotExpired,

    #[error("burn request {0} not found")]
    BurnNotFound(u64),

    #[error("burn request {0} is past its fulfilment window")]
    BurnExpired(u64),

    #[error("burn request {0} is still inside its fulfilment window")]
    BurnNotExpired(u64),

    #[error("no liquidation claim to redeem")]
    NoLiquidationClaim,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Rejections that are final for the exact arguments supplied
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("expected {expected} public signals, got {found}")]
    SignalCount { expected: usize, found: usize },

    #[error("Merkle path of depth {depth} exceeds the maximum {max}")]
    MerklePathTooDeep { depth: usize, max: usize },

    #[error("leaf index {index} does not fit a path of depth {depth}")]
    MerkleIndexOutOfRange { index: u64, depth: usize },

    #[error("transaction is not included in the relayed transaction root")]
    TxInclusion,

    #[error("output record does not belong to the claimed transaction output")]
    OutputMismatch,

    #[error("output is not included in the relayed output root")]
    OutputInclusion,

    #[error("{role} rejected: {source}")]
    InvalidPoint { role: PointRole, source: CurveError },

    #[error("DLEQ scalar rejected: {0}")]
    InvalidScalar(CurveError),

    #[error("DLEQ challenge does not match the transcript")]
    DleqChallenge,

    #[error("DLEQ equation s*G == K1 + c*R failed")]
    DleqBaseEquation,

    #[error("DLEQ equation s*A == K2 + c*rA failed")]
    DleqSharedEquation,

    #[error("shared secret is not the cofactor-cleared shared input")]
    SharedSecretMismatch,

    #[error("stealth key is not derived from the shared secret and spend key")]
    StealthKeyMismatch,

    #[error("stealth key does not match the output key")]
    OutputKeyMismatch,

    #[error("DLEQ view key is not the LP's deposit view key")]
    LpViewKeyMismatch,

    #[error("spend key is not the LP's deposit spend key")]
    LpSpendKeyMismatch,

    #[error("succinct proof rejected by the verifier")]
    SuccinctProofRejected,

    #[error("public signal {0:?} does not match the proven output")]
    SignalMismatch(SignalField),

    #[error("claimed amount does not fit in 64 bits")]
    AmountOutOfRange,

    #[error("proven amount or intent commitment does not match the mint intent")]
    IntentMismatch,
}

/// Attack signals: replays and double terminal transitions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("output {output_index} of transaction {tx_id} was already minted")]
    NullifierReplay { tx_id: String, output_index: u64 },

    #[error("mint intent is already closed")]
    IntentClosed,

    #[error("an identical mint intent already exists")]
    DuplicateIntent,

    #[error("burn request {0} already reached a terminal state")]
    BurnAlreadySettled(u64),

    #[error("block {0} was already posted")]
    BlockAlreadyPosted(u64),

    #[error("re-entrant ledger call")]
    Reentrancy,
}

/// Top-level rejection surfaced by every ledger entry point
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("proof rejected: {0}")]
    Proof(#[from] ProofError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl SettlementError {
    /// Whether the same call may succeed later once conditions change
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettlementError::Precondition(_))
    }

    pub fn is_attack_signal(&self) -> bool {
        matches!(self, SettlementError::Invariant(_))
    }
}

impl ProofError {
    pub fn point(role: PointRole) -> impl FnOnce(CurveError) -> ProofError {
        move |source| ProofError::InvalidPoint { role, source }
    }
}
