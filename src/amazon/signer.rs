//! AWS Signature Version 4 request signing for the Product Advertising API.
//!
//! Signing is pure: the same payload, credentials, and timestamp always produce
//! the same headers. The payload hash is part of the signature, so headers
//! must be recomputed for every request body.

use crate::config::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "ProductAdvertisingAPI";
pub const CONTENT_ENCODING: &str = "amz-1.0";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

const SCOPE_TERMINATOR: &str = "aws4_request";
const SECRET_PREFIX: &str = "AWS4";
const SIGNED_HEADERS: &str = "content-encoding;content-type;host;x-amz-date;x-amz-target";

/// A PA-API operation: the URI path it is posted to and its `x-amz-target` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub path: &'static str,
    pub target: &'static str,
}

/// The batch item lookup operation.
pub const GET_ITEMS: Operation = Operation {
    path: "/paapi5/getitems",
    target: "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems",
};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid HMAC key length")]
    InvalidKey,
}

/// Hashing capability used by the signer.
pub trait Crypto: Send + Sync {
    fn sha256(&self, data: &[u8]) -> Vec<u8>;

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Default [`Crypto`] backed by the `sha2` and `hmac` crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha2Crypto;

impl Crypto for Sha2Crypto {
    fn sha256(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Header values to attach to one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub target: &'static str,
}

/// Produces SigV4 headers for PA-API requests.
pub struct Signer {
    crypto: Box<dyn Crypto>,
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer {
    pub fn new() -> Self {
        Self::with_crypto(Box::new(Sha2Crypto))
    }

    pub fn with_crypto(crypto: Box<dyn Crypto>) -> Self {
        Self { crypto }
    }

    /// Signs `payload` for `operation` at time `now`.
    pub fn sign(
        &self,
        operation: &Operation,
        payload: &[u8],
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, SigningError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let canonical = self.canonical_request(operation, payload, &credentials.host, &amz_date);
        let scope = credential_scope(&date_stamp, &credentials.region);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(self.crypto.sha256(canonical.as_bytes()))
        );

        let key =
            self.signing_key(&credentials.secret_key, &date_stamp, &credentials.region, SERVICE)?;
        let signature = hex::encode(self.crypto.hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, credentials.access_key, scope, SIGNED_HEADERS, signature
            ),
            amz_date,
            target: operation.target,
        })
    }

    /// Builds the canonical request. Query string is always empty.
    pub fn canonical_request(
        &self,
        operation: &Operation,
        payload: &[u8],
        host: &str,
        amz_date: &str,
    ) -> String {
        let canonical_headers = format!(
            "content-encoding:{}\ncontent-type:{}\nhost:{}\nx-amz-date:{}\nx-amz-target:{}\n",
            CONTENT_ENCODING, CONTENT_TYPE, host, amz_date, operation.target
        );

        format!(
            "POST\n{}\n\n{}\n{}\n{}",
            operation.path,
            canonical_headers,
            SIGNED_HEADERS,
            hex::encode(self.crypto.sha256(payload))
        )
    }

    /// Derives the signing key: HMAC chained over date, region, service, terminator.
    pub fn signing_key(
        &self,
        secret_key: &str,
        date_stamp: &str,
        region: &str,
        service: &str,
    ) -> Result<Vec<u8>, SigningError> {
        let seed = format!("{}{}", SECRET_PREFIX, secret_key);
        let k_date = self.crypto.hmac_sha256(seed.as_bytes(), date_stamp.as_bytes())?;
        let k_region = self.crypto.hmac_sha256(&k_date, region.as_bytes())?;
        let k_service = self.crypto.hmac_sha256(&k_region, service.as_bytes())?;
        self.crypto.hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
    }
}

fn credential_scope(date_stamp: &str, region: &str) -> String {
    format!("{}/{}/{}/{}", date_stamp, region, SERVICE, SCOPE_TERMINATOR)
}
