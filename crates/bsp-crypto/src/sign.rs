//! RSA-PSS signing and verification over canonical record bytes.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use bsp_core::FileRecord;

use crate::canonical::canonical_signing_bytes;
use crate::error::SignatureError;
use crate::keys::fingerprint;

/// Sign a record's canonical rendering; returns the base64 signature.
///
/// PSS salts are random, so two signatures over the same record differ;
/// verification remains stable.
///
/// # Errors
///
/// Returns [`SignatureError::Serialization`] if canonicalization fails.
pub fn sign_record(record: &FileRecord, key: &RsaPrivateKey) -> Result<String, SignatureError> {
    let message = canonical_signing_bytes(record)?;
    let signing_key = BlindedSigningKey::<Sha256>::new(key.clone());
    let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), &message);
    Ok(BASE64_STANDARD.encode(signature.to_bytes()))
}

/// Set the fingerprint and signature fields on a record.
///
/// The fingerprint is written first so it is covered by the signature.
///
/// # Errors
///
/// Propagates canonicalization and key-encoding failures.
pub fn sign_and_attach(record: &mut FileRecord, key: &RsaPrivateKey) -> Result<(), SignatureError> {
    let public = RsaPublicKey::from(key);
    record.public_key_fingerprint = Some(fingerprint(&public)?);
    record.signature = Some(sign_record(record, key)?);
    debug!(
        fingerprint = record.public_key_fingerprint.as_deref().unwrap_or(""),
        "signed record"
    );
    Ok(())
}

/// Verify a record's signature against a public key.
///
/// # Errors
///
/// [`SignatureError::MissingSignature`] if the record is unsigned,
/// [`SignatureError::BadSignature`] if the signature fails to decode or to
/// verify against the canonical rendering.
pub fn verify_record(record: &FileRecord, key: &RsaPublicKey) -> Result<(), SignatureError> {
    let encoded = record
        .signature
        .as_deref()
        .ok_or(SignatureError::MissingSignature)?;
    let raw = BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| SignatureError::BadSignature)?;
    let signature = Signature::try_from(raw.as_slice()).map_err(|_| SignatureError::BadSignature)?;

    let message = canonical_signing_bytes(record)?;
    let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
    verifying_key
        .verify(&message, &signature)
        .map_err(|_| SignatureError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;
    use bsp_core::{ChunkRecord, Compression, Coordinate, ENCODING_NAME, PROTOCOL_VERSION};
    use std::sync::OnceLock;

    fn test_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| generate_keypair(1024).expect("test keypair"))
    }

    fn other_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| generate_keypair(1024).expect("test keypair"))
    }

    fn sample_record() -> FileRecord {
        FileRecord {
            protocol_version: PROTOCOL_VERSION,
            original_name: "signed.bin".to_string(),
            original_size: 64,
            compressed_size: 73,
            compression: Compression::zstd_default(),
            file_sha256: "12".repeat(32),
            chunk_count: 1,
            chunks: vec![ChunkRecord {
                index: 0,
                coordinate: Coordinate::new("0feed1", 1, 1, 1, 1).unwrap(),
                raw_len: 73,
                sha256: "34".repeat(32),
            }],
            encoding: ENCODING_NAME.to_string(),
            signature: None,
            public_key_fingerprint: None,
        }
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (private, public) = test_keypair().clone();
        let mut record = sample_record();
        sign_and_attach(&mut record, &private).unwrap();
        assert!(record.signature.is_some());
        assert!(record.public_key_fingerprint.is_some());
        verify_record(&record, &public).unwrap();
    }

    #[test]
    fn tampered_record_fails() {
        let (private, public) = test_keypair().clone();
        let mut record = sample_record();
        sign_and_attach(&mut record, &private).unwrap();
        record.original_size += 1;
        assert!(matches!(
            verify_record(&record, &public),
            Err(SignatureError::BadSignature)
        ));
    }

    #[test]
    fn tampered_signature_fails() {
        let (private, public) = test_keypair().clone();
        let mut record = sample_record();
        sign_and_attach(&mut record, &private).unwrap();

        // Flip one bit inside the base64 payload.
        let mut raw = BASE64_STANDARD
            .decode(record.signature.as_deref().unwrap())
            .unwrap();
        raw[0] ^= 0x01;
        record.signature = Some(BASE64_STANDARD.encode(&raw));

        assert!(matches!(
            verify_record(&record, &public),
            Err(SignatureError::BadSignature)
        ));
    }

    #[test]
    fn missing_signature_reported() {
        let (_, public) = test_keypair().clone();
        let record = sample_record();
        assert!(matches!(
            verify_record(&record, &public),
            Err(SignatureError::MissingSignature)
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let (private, _) = test_keypair().clone();
        let (_, other_public) = other_keypair().clone();
        let mut record = sample_record();
        sign_and_attach(&mut record, &private).unwrap();
        assert!(matches!(
            verify_record(&record, &other_public),
            Err(SignatureError::BadSignature)
        ));
    }

    #[test]
    fn signatures_randomized_but_both_verify() {
        let (private, public) = test_keypair().clone();
        let record = sample_record();
        let sig1 = sign_record(&record, &private).unwrap();
        let sig2 = sign_record(&record, &private).unwrap();
        assert_ne!(sig1, sig2, "PSS salts are random");

        for sig in [sig1, sig2] {
            let mut signed = record.clone();
            signed.signature = Some(sig);
            verify_record(&signed, &public).unwrap();
        }
    }
}
