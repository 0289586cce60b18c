// src/wallet/typed_data.rs
//! EIP-712 hashing for the `CertificateData` mint authorization.
//!
//! The contract verifies `mintWithSignature` against
//! `keccak256(0x1901 || domainSeparator || structHash)` where
//!
//! ```text
//! structHash = keccak256(abi.encode(
//!     keccak256("CertificateData(address recipient,string tokenURI,uint256 nonce)"),
//!     recipient, keccak256(bytes(tokenURI)), nonce))
//! ```

use crate::models::mint_request::{MintRequest, SignedMintRequest};
use crate::utils::crypto::keccak;
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, Signature, SignatureError, H256, U256};
use serde::{Deserialize, Serialize};

pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const CERTIFICATE_DATA_TYPE: &str =
    "CertificateData(address recipient,string tokenURI,uint256 nonce)";

/// EIP-712 domain of the deployed certificate contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
    pub name: String,
    pub version: String,
    pub chain_id: U256,
    pub verifying_contract: Address,
}

impl SigningDomain {
    pub fn separator(&self) -> [u8; 32] {
        keccak(&encode(&[
            Token::FixedBytes(keccak(EIP712_DOMAIN_TYPE.as_bytes()).to_vec()),
            Token::FixedBytes(keccak(self.name.as_bytes()).to_vec()),
            Token::FixedBytes(keccak(self.version.as_bytes()).to_vec()),
            Token::Uint(self.chain_id),
            Token::Address(self.verifying_contract),
        ]))
    }
}

pub fn struct_hash(request: &MintRequest) -> [u8; 32] {
    keccak(&encode(&[
        Token::FixedBytes(keccak(CERTIFICATE_DATA_TYPE.as_bytes()).to_vec()),
        Token::Address(request.recipient),
        Token::FixedBytes(keccak(request.token_uri.as_bytes()).to_vec()),
        Token::Uint(request.nonce),
    ]))
}

/// The digest an issuer signs for `request` under `domain`.
pub fn signing_hash(domain: &SigningDomain, request: &MintRequest) -> H256 {
    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(&domain.separator());
    preimage.extend_from_slice(&struct_hash(request));
    H256::from(keccak(&preimage))
}

/// Recovers the address that produced `signed.signature`.
pub fn recover_signer(
    domain: &SigningDomain,
    signed: &SignedMintRequest,
) -> Result<Address, SignatureError> {
    let signature = Signature::try_from(signed.signature.as_ref())?;
    signature.recover(signing_hash(domain, &signed.request))
}
