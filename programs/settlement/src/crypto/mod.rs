pub mod address;
pub mod curve;
pub mod dleq;
pub mod encoding;
pub mod field;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod stealth;

pub use address::{
    decode_address, decode_address_on, encode_address, AddressKind, MoneroAddress, Network,
};
pub use curve::{basepoint, is_on_curve, EdwardsPoint};
pub use encoding::{ByteOrder, EncodedPoint, EncodedScalar};
pub use field::{mod_inverse, mod_sqrt, FieldElement, Scalar, SecretScalar};
pub use hash::{keccak256, sha256_concat};
pub use keys::AddressKeys;
pub use merkle::{
    CoinbasePolicy, HashInputOrder, Keccak256Nodes, MerkleProof, MerkleTree, NodeHasher,
    OutputRecord, Sha256Nodes, TxTreeConvention,
};
