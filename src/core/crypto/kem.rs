/*!
Key encapsulation for the basis-metadata handshake.

The delivery protocol only ever touches the four-operation contract in
[`KemGateway`]. [`KyberKem`] is the production implementation on top of
`pqcrypto-kyber`; tests can substitute their own gateway.
*/

use pqcrypto_kyber::{kyber512, kyber768, kyber1024};
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::core::{
    constants::FINGERPRINT_BYTES,
    crypto::config::KemAlgorithm,
    error::{KemError, Result},
};

/// A responder's keypair. The private half is wiped when the pair is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KemKeyPair {
    public_key: Vec<u8>,
    private_key: Vec<u8>,
}

impl KemKeyPair {
    /// Assemble a keypair from raw bytes
    pub fn new(public_key: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self { public_key, private_key }
    }

    /// Public key bytes, safe to transmit
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Private key bytes; never leaves the responder
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl std::fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KemKeyPair")
            .field("public_key_len", &self.public_key.len())
            .finish_non_exhaustive()
    }
}

/// Output of an encapsulation against a peer's public key
pub struct EncapsulationResult {
    /// Ciphertext to send to the key owner
    pub ciphertext: Vec<u8>,
    /// Shared secret held by the encapsulating side
    pub shared_secret: Zeroizing<Vec<u8>>,
}

/// The KEM contract consumed by the delivery protocol.
///
/// For every keypair, `decapsulate(sk, encapsulate(pk).ciphertext)` must equal
/// `encapsulate(pk).shared_secret`.
pub trait KemGateway {
    /// Generate a fresh keypair
    fn generate_keypair(&self) -> Result<KemKeyPair>;

    /// Encapsulate a shared secret using the receiver's public key (sender side)
    fn encapsulate(&self, public_key: &[u8]) -> Result<EncapsulationResult>;

    /// Decapsulate a shared secret from a ciphertext (receiver side)
    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Parameter set in use
    fn algorithm(&self) -> KemAlgorithm;
}

/// CRYSTALS-Kyber gateway
#[derive(Debug, Clone, Copy, Default)]
pub struct KyberKem {
    algorithm: KemAlgorithm,
}

impl KyberKem {
    /// Create a gateway for the given parameter set
    pub fn new(algorithm: KemAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Public key size for the configured algorithm
    pub fn public_key_size(&self) -> usize {
        match self.algorithm {
            KemAlgorithm::Kyber512 => kyber512::public_key_bytes(),
            KemAlgorithm::Kyber768 => kyber768::public_key_bytes(),
            KemAlgorithm::Kyber1024 => kyber1024::public_key_bytes(),
        }
    }

    /// Ciphertext size for the configured algorithm
    pub fn ciphertext_size(&self) -> usize {
        match self.algorithm {
            KemAlgorithm::Kyber512 => kyber512::ciphertext_bytes(),
            KemAlgorithm::Kyber768 => kyber768::ciphertext_bytes(),
            KemAlgorithm::Kyber1024 => kyber1024::ciphertext_bytes(),
        }
    }

    /// Shared secret size for the configured algorithm
    pub fn shared_secret_size(&self) -> usize {
        match self.algorithm {
            KemAlgorithm::Kyber512 => kyber512::shared_secret_bytes(),
            KemAlgorithm::Kyber768 => kyber768::shared_secret_bytes(),
            KemAlgorithm::Kyber1024 => kyber1024::shared_secret_bytes(),
        }
    }
}

impl KemGateway for KyberKem {
    fn generate_keypair(&self) -> Result<KemKeyPair> {
        let (pk, sk) = match self.algorithm {
            KemAlgorithm::Kyber512 => {
                let (pk, sk) = kyber512::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
            KemAlgorithm::Kyber768 => {
                let (pk, sk) = kyber768::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
            KemAlgorithm::Kyber1024 => {
                let (pk, sk) = kyber1024::keypair();
                (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
            }
        };
        if pk.is_empty() || sk.is_empty() {
            return Err(KemError::KeyGenerationFailed.into());
        }
        Ok(KemKeyPair::new(pk, sk))
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<EncapsulationResult> {
        let (ss, ct) = match self.algorithm {
            KemAlgorithm::Kyber512 => {
                let pk = kyber512::PublicKey::from_bytes(public_key)
                    .map_err(|_| KemError::InvalidPublicKey)?;
                let (ss, ct) = kyber512::encapsulate(&pk);
                (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
            }
            KemAlgorithm::Kyber768 => {
                let pk = kyber768::PublicKey::from_bytes(public_key)
                    .map_err(|_| KemError::InvalidPublicKey)?;
                let (ss, ct) = kyber768::encapsulate(&pk);
                (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
            }
            KemAlgorithm::Kyber1024 => {
                let pk = kyber1024::PublicKey::from_bytes(public_key)
                    .map_err(|_| KemError::InvalidPublicKey)?;
                let (ss, ct) = kyber1024::encapsulate(&pk);
                (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
            }
        };
        Ok(EncapsulationResult {
            ciphertext: ct,
            shared_secret: Zeroizing::new(ss),
        })
    }

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let ss = match self.algorithm {
            KemAlgorithm::Kyber512 => {
                let ct = kyber512::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KemError::InvalidCiphertext)?;
                let sk = kyber512::SecretKey::from_bytes(private_key)
                    .map_err(|_| KemError::InvalidPrivateKey)?;
                kyber512::decapsulate(&ct, &sk).as_bytes().to_vec()
            }
            KemAlgorithm::Kyber768 => {
                let ct = kyber768::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KemError::InvalidCiphertext)?;
                let sk = kyber768::SecretKey::from_bytes(private_key)
                    .map_err(|_| KemError::InvalidPrivateKey)?;
                kyber768::decapsulate(&ct, &sk).as_bytes().to_vec()
            }
            KemAlgorithm::Kyber1024 => {
                let ct = kyber1024::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KemError::InvalidCiphertext)?;
                let sk = kyber1024::SecretKey::from_bytes(private_key)
                    .map_err(|_| KemError::InvalidPrivateKey)?;
                kyber1024::decapsulate(&ct, &sk).as_bytes().to_vec()
            }
        };
        Ok(Zeroizing::new(ss))
    }

    fn algorithm(&self) -> KemAlgorithm {
        self.algorithm
    }
}

/// Short hex fingerprint of a secret, suitable for logs.
///
/// Only a truncated SHA-256 digest is exposed, never the secret itself.
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
