//! Facto Core - append-only audit ledger primitives
//!
//! This crate provides the shared contract between event producers (agent
//! SDKs), the batching processor and the verification service:
//! - Canonical serialization of events (the byte-exact hash/signature input)
//! - SHA3-256 event hashing and Ed25519 signing/verification
//! - Per-session hash-chain state for producers
//! - The Merkle engine used for per-batch commitments and inclusion proofs
//!
//! Everything here is deterministic and free of I/O; the storage and
//! transport layers live in `facto-db`, `facto-processor` and `facto-api`.

pub mod canon;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod types;

pub use constants::*;
pub use error::*;
pub use types::*;

pub use canon::canonical_event_bytes;
pub use crypto::merkle::{MerkleProof, MerkleTree, ProofElement};
pub use crypto::signer::{new_facto_id, new_session_id, AgentSigner, EventDraft, SessionChain};
pub use crypto::verify::{verify_event, Verification};
