// src/services/api_server.rs
//! API Server for the certificate service
//!
//! REST interface over the issuer, relayer and verifier services.
//!
//! The API is built using Axum and includes endpoints for:
//! - Certificate hashing and authenticity verification (single and batch)
//! - Certificate issuance by data hash
//! - EIP-712 mint request signing and relaying
//! - Certificate, nonce and ownership queries
//! - Contract administration (minters, issuers, base URI)

use crate::blockchain::ledger::{LedgerReader, LedgerWriter};
use crate::errors::ServiceError;
use crate::models::certificate::{CertificateRecord, VerificationResult};
use crate::models::mint_request::{SignedMintRequest, TxOutcome};
use crate::services::certificate_issuer::CertificateIssuer;
use crate::services::relayer::{DomainConfig, Relayer};
use crate::services::verifier::{VerificationRequest, Verifier};
use crate::utils::canonical::CanonicalHasher;
use crate::wallet::key_management::KeyManager;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use ethers_core::types::{Address, H256, U256};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

// API request and response structures

/// Response for certificate hashing
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HashCertificateResponse {
    digest: String,
    scheme: String,
}

/// Request payload for verifying a certificate
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCertificateRequest {
    #[serde(deserialize_with = "deserialize_token_id")]
    token_id: U256,
    certificate: CertificateRecord,
}

/// Verification verdict as returned to clients
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct VerificationResponse {
    authentic: bool,
    token_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_chain_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    computed_digest: Option<String>,
}

impl From<VerificationResult> for VerificationResponse {
    fn from(result: VerificationResult) -> Self {
        let mut response = VerificationResponse {
            authentic: result.is_authentic(),
            token_id: result.token_id().to_string(),
            issuer_address: None,
            on_chain_digest: None,
            computed_digest: None,
        };
        match result {
            VerificationResult::Authentic { issuer_address, .. } => {
                response.issuer_address = Some(format_address(issuer_address));
            }
            VerificationResult::Tampered {
                on_chain_digest,
                computed_digest,
                ..
            } => {
                response.on_chain_digest = Some(on_chain_digest);
                response.computed_digest = Some(computed_digest.to_string());
            }
        }
        response
    }
}

/// Request payload for batch verification
#[derive(Serialize, Deserialize)]
struct VerifyCertificatesRequest {
    items: Vec<VerifyCertificateRequest>,
}

/// One entry of a batch verification response
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchVerificationItem {
    token_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<VerificationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Response for batch verification
#[derive(Serialize, Deserialize)]
struct VerifyCertificatesResponse {
    results: Vec<BatchVerificationItem>,
}

/// Request payload for issuing a certificate
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCertificateRequest {
    recipient: String,
    certificate: CertificateRecord,
}

/// Response for certificate issuance
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCertificateResponse {
    tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_id: Option<String>,
    digest: String,
}

/// Response for any other ledger mutation
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponse {
    tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_id: Option<String>,
}

impl From<TxOutcome> for TransactionResponse {
    fn from(outcome: TxOutcome) -> Self {
        TransactionResponse {
            tx_hash: format_hash(outcome.tx_hash),
            token_id: outcome.token_id.map(|id| id.to_string()),
        }
    }
}

/// Request payload for signing a mint request
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignMintRequest {
    recipient: String,
    token_uri: String,
}

/// Response listing certificates held by an address
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertificatesByOwnerResponse {
    owner: String,
    token_ids: Vec<String>,
}

/// Response containing an issuer's current nonce
#[derive(Serialize, Deserialize)]
struct NonceResponse {
    issuer: String,
    nonce: String,
}

/// Response describing a minted token
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token_id: String,
    owner: String,
    token_uri: String,
    issuer_address: String,
    data_hash: String,
}

/// Response containing the contract owner
#[derive(Serialize, Deserialize)]
struct ContractOwnerResponse {
    owner: String,
}

/// Request payload for registering a minter
#[derive(Serialize, Deserialize)]
struct MinterRequest {
    account: String,
}

/// Request payload for changing an issuer's status
#[derive(Serialize, Deserialize)]
struct IssuerStatusRequest {
    issuer: String,
    active: bool,
}

/// Request payload for changing the base token URI
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseUriRequest {
    base_uri: String,
}

/// Errors surfaced by the HTTP layer
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path or body
    BadRequest(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Service(err) => {
                let status = match &err {
                    ServiceError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
                    ServiceError::CertificateNotFound(_) => StatusCode::NOT_FOUND,
                    ServiceError::InvalidSignature(_) | ServiceError::StaleNonce { .. } => {
                        StatusCode::CONFLICT
                    }
                    ServiceError::ContractReverted(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    ServiceError::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    ServiceError::SignerRequired => StatusCode::NOT_IMPLEMENTED,
                    ServiceError::Ledger(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Formats an address as a lowercase hex string with 0x prefix.
fn format_address(addr: Address) -> String {
    format!("0x{:x}", addr)
}

fn format_hash(hash: H256) -> String {
    format!("0x{:x}", hash)
}

fn parse_address(value: &str) -> Result<Address, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid address {value:?}")))
}

/// Parses a token id written in decimal or as `0x` hex.
fn token_id_from_str(value: &str) -> Option<U256> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(value).ok(),
    }
}

fn parse_token_id(value: &str) -> Result<U256, ApiError> {
    token_id_from_str(value).ok_or_else(|| ApiError::BadRequest(format!("invalid token id {value:?}")))
}

/// Token id as sent by clients: a JSON number, or a decimal or hex string.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenIdInput {
    Number(u64),
    Text(String),
}

fn deserialize_token_id<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match TokenIdInput::deserialize(deserializer)? {
        TokenIdInput::Number(id) => Ok(U256::from(id)),
        TokenIdInput::Text(text) => token_id_from_str(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid token id {text:?}"))),
    }
}

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Read-only contract queries
    ledger: Arc<dyn LedgerReader>,

    /// Service for verifying certificates
    verifier: Verifier,

    /// Service for issuing and administering certificates
    issuer: CertificateIssuer,

    /// Service for signature-based minting
    relayer: Relayer,

    /// Operator key used to sign mint requests, if configured
    keys: Option<KeyManager>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `ledger` - Certificate contract handle
    /// * `keys` - Operator key for signing mint requests (`None` for read-only deployments)
    /// * `hasher` - Canonical hasher shared by issuance and verification
    /// * `domain` - EIP-712 domain name and version of the contract
    pub fn new<L>(
        ledger: Arc<L>,
        keys: Option<KeyManager>,
        hasher: CanonicalHasher,
        domain: DomainConfig,
    ) -> Self
    where
        L: LedgerWriter + 'static,
    {
        ApiServer {
            ledger: ledger.clone(),
            verifier: Verifier::new(ledger.clone(), hasher),
            issuer: CertificateIssuer::new(ledger.clone(), hasher),
            relayer: Relayer::new(ledger, domain),
            keys,
        }
    }

    /// Builds the router with all API routes
    pub fn router(self) -> Router {
        Router::new()
            .route("/hash-certificate", post(Self::hash_certificate_handler))
            .route("/verify-certificate", post(Self::verify_certificate_handler))
            .route("/verify-certificates", post(Self::verify_certificates_handler))
            .route("/issue-certificate", post(Self::issue_certificate_handler))
            .route("/sign-mint-request", post(Self::sign_mint_request_handler))
            .route("/relay-mint", post(Self::relay_mint_handler))
            .route("/certificates/:owner", get(Self::certificates_by_owner_handler))
            .route("/nonces/:issuer", get(Self::nonce_handler))
            .route("/tokens/:token_id", get(Self::token_handler))
            .route("/contract-owner", get(Self::contract_owner_handler))
            .route("/minters", post(Self::add_minter_handler))
            .route("/minters/:account", delete(Self::remove_minter_handler))
            .route("/issuer-status", post(Self::issuer_status_handler))
            .route("/base-uri", post(Self::base_uri_handler))
            .with_state(Arc::new(self))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("API server listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }

    // =====================
    // Verification Handlers
    // =====================

    /// Computes the canonical digest of a certificate record
    ///
    /// # Endpoint
    /// POST /hash-certificate
    async fn hash_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<CertificateRecord>, JsonRejection>,
    ) -> ApiResult<HashCertificateResponse> {
        let Json(record) = payload.map_err(|e| ServiceError::InvalidRecord(e.body_text()))?;
        let hasher = state.verifier.hasher();
        let digest = hasher.digest(&record).map_err(ServiceError::from)?;
        Ok(Json(HashCertificateResponse {
            digest: digest.to_string(),
            scheme: hasher.scheme().name().to_string(),
        }))
    }

    /// Verifies a certificate record against its on-chain digest
    ///
    /// # Endpoint
    /// POST /verify-certificate
    ///
    /// # Responses
    /// - 200 OK: verdict (authentic or tampered)
    /// - 400 Bad Request: malformed certificate record
    /// - 404 Not Found: token does not exist
    /// - 503 Service Unavailable: ledger could not be reached
    async fn verify_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<VerifyCertificateRequest>, JsonRejection>,
    ) -> ApiResult<VerificationResponse> {
        let Json(request) = payload?;
        let verdict = state
            .verifier
            .verify(request.token_id, &request.certificate)
            .await?;
        Ok(Json(verdict.into()))
    }

    /// Verifies several certificates concurrently
    ///
    /// # Endpoint
    /// POST /verify-certificates
    ///
    /// Always 200 OK for a well-formed body; failures are reported per item.
    async fn verify_certificates_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<VerifyCertificatesRequest>, JsonRejection>,
    ) -> ApiResult<VerifyCertificatesResponse> {
        let Json(batch) = payload?;
        let requests: Vec<VerificationRequest> = batch
            .items
            .into_iter()
            .map(|item| VerificationRequest {
                token_id: item.token_id,
                certificate: item.certificate,
            })
            .collect();

        let results = state.verifier.verify_many(&requests).await;
        let results = requests
            .iter()
            .zip(results)
            .map(|(request, result)| match result {
                Ok(verdict) => BatchVerificationItem {
                    token_id: request.token_id.to_string(),
                    verdict: Some(verdict.into()),
                    error: None,
                },
                Err(err) => BatchVerificationItem {
                    token_id: request.token_id.to_string(),
                    verdict: None,
                    error: Some(err.to_string()),
                },
            })
            .collect();
        Ok(Json(VerifyCertificatesResponse { results }))
    }

    // =====================
    // Issuance Handlers
    // =====================

    /// Issues a certificate by committing its digest on-chain
    ///
    /// # Endpoint
    /// POST /issue-certificate
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<IssueCertificateRequest>, JsonRejection>,
    ) -> ApiResult<IssueCertificateResponse> {
        let Json(request) = payload.map_err(|e| ServiceError::InvalidRecord(e.body_text()))?;
        let recipient = parse_address(&request.recipient)?;
        let issuance = state.issuer.issue(recipient, &request.certificate).await?;
        Ok(Json(IssueCertificateResponse {
            tx_hash: format_hash(issuance.outcome.tx_hash),
            token_id: issuance.outcome.token_id.map(|id| id.to_string()),
            digest: issuance.digest.to_string(),
        }))
    }

    /// Signs a mint request with the operator key as issuer
    ///
    /// # Endpoint
    /// POST /sign-mint-request
    ///
    /// # Responses
    /// - 200 OK: signed request, ready for POST /relay-mint
    /// - 501 Not Implemented: no operator key configured
    async fn sign_mint_request_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<SignMintRequest>, JsonRejection>,
    ) -> ApiResult<SignedMintRequest> {
        let Json(request) = payload?;
        let keys = state.keys.as_ref().ok_or(ServiceError::SignerRequired)?;
        let recipient = parse_address(&request.recipient)?;
        let signed = state
            .relayer
            .sign_request(keys, recipient, request.token_uri)
            .await?;
        Ok(Json(signed))
    }

    /// Relays an issuer-signed mint request
    ///
    /// # Endpoint
    /// POST /relay-mint
    async fn relay_mint_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<SignedMintRequest>, JsonRejection>,
    ) -> ApiResult<TransactionResponse> {
        let Json(signed) = payload?;
        let outcome = state.relayer.relay(&signed).await?;
        Ok(Json(outcome.into()))
    }

    // =====================
    // Query Handlers
    // =====================

    /// Lists certificates held by an address
    ///
    /// # Endpoint
    /// GET /certificates/:owner
    async fn certificates_by_owner_handler(
        State(state): State<Arc<ApiServer>>,
        Path(owner): Path<String>,
    ) -> ApiResult<CertificatesByOwnerResponse> {
        let owner = parse_address(&owner)?;
        let token_ids = state
            .ledger
            .certificates_by_owner(owner)
            .await
            .map_err(ServiceError::from)?;
        Ok(Json(CertificatesByOwnerResponse {
            owner: format_address(owner),
            token_ids: token_ids.iter().map(|id| id.to_string()).collect(),
        }))
    }

    /// Returns the nonce an issuer's next signed mint must carry
    ///
    /// # Endpoint
    /// GET /nonces/:issuer
    async fn nonce_handler(
        State(state): State<Arc<ApiServer>>,
        Path(issuer): Path<String>,
    ) -> ApiResult<NonceResponse> {
        let issuer = parse_address(&issuer)?;
        let nonce = state.ledger.nonce_of(issuer).await.map_err(ServiceError::from)?;
        Ok(Json(NonceResponse {
            issuer: format_address(issuer),
            nonce: nonce.to_string(),
        }))
    }

    /// Describes a minted token
    ///
    /// # Endpoint
    /// GET /tokens/:token_id
    async fn token_handler(
        State(state): State<Arc<ApiServer>>,
        Path(token_id): Path<String>,
    ) -> ApiResult<TokenResponse> {
        let token_id = parse_token_id(&token_id)?;
        let details = state
            .ledger
            .certificate_details(token_id)
            .await
            .map_err(ServiceError::from)?;
        let owner = state.ledger.owner_of(token_id).await.map_err(ServiceError::from)?;
        let token_uri = state.ledger.token_uri(token_id).await.map_err(ServiceError::from)?;
        Ok(Json(TokenResponse {
            token_id: token_id.to_string(),
            owner: format_address(owner),
            token_uri,
            issuer_address: format_address(details.issuer_address),
            data_hash: details.data_hash,
        }))
    }

    /// Returns the owner of the certificate contract
    ///
    /// # Endpoint
    /// GET /contract-owner
    async fn contract_owner_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<ContractOwnerResponse> {
        let owner = state.ledger.contract_owner().await.map_err(ServiceError::from)?;
        Ok(Json(ContractOwnerResponse {
            owner: format_address(owner),
        }))
    }

    // =====================
    // Administration Handlers
    // =====================

    /// Grants the minter role
    ///
    /// # Endpoint
    /// POST /minters
    async fn add_minter_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<MinterRequest>, JsonRejection>,
    ) -> ApiResult<TransactionResponse> {
        let Json(request) = payload?;
        let account = parse_address(&request.account)?;
        Ok(Json(state.issuer.add_minter(account).await?.into()))
    }

    /// Revokes the minter role
    ///
    /// # Endpoint
    /// DELETE /minters/:account
    async fn remove_minter_handler(
        State(state): State<Arc<ApiServer>>,
        Path(account): Path<String>,
    ) -> ApiResult<TransactionResponse> {
        let account = parse_address(&account)?;
        Ok(Json(state.issuer.remove_minter(account).await?.into()))
    }

    /// Grants or revokes the right to sign mint requests
    ///
    /// # Endpoint
    /// POST /issuer-status
    async fn issuer_status_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<IssuerStatusRequest>, JsonRejection>,
    ) -> ApiResult<TransactionResponse> {
        let Json(request) = payload?;
        let issuer = parse_address(&request.issuer)?;
        Ok(Json(
            state
                .issuer
                .set_issuer_status(issuer, request.active)
                .await?
                .into(),
        ))
    }

    /// Changes the base token URI
    ///
    /// # Endpoint
    /// POST /base-uri
    async fn base_uri_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<BaseUriRequest>, JsonRejection>,
    ) -> ApiResult<TransactionResponse> {
        let Json(request) = payload?;
        Ok(Json(state.issuer.set_base_uri(request.base_uri).await?.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory_ledger::MemoryLedger;
    use crate::utils::canonical::tests::{sample_record, SAMPLE_DIGEST};
    use crate::wallet::key_management::tests::random_key;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const OPERATOR: Address = Address::repeat_byte(0x01);
    const STUDENT: Address = Address::repeat_byte(0xf5);

    fn domain() -> DomainConfig {
        DomainConfig {
            name: "Sertifyed".into(),
            version: "1".into(),
            chain_id: None,
        }
    }

    fn server(ledger: Arc<MemoryLedger>, keys: Option<KeyManager>) -> Router {
        ApiServer::new(ledger, keys, CanonicalHasher::default(), domain()).router()
    }

    async fn call(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn record_json() -> Value {
        serde_json::to_value(sample_record()).unwrap()
    }

    #[tokio::test]
    async fn test_hash_certificate() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, body) = call(router, "POST", "/hash-certificate", Some(record_json())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["digest"], SAMPLE_DIGEST);
        assert_eq!(body["scheme"], "json-v1");
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let mut record = record_json();
        record.as_object_mut().unwrap().remove("grade");
        let (status, body) = call(router, "POST", "/hash-certificate", Some(record)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("grade"));
    }

    #[tokio::test]
    async fn test_verify_authentic_and_tampered() {
        let ledger = Arc::new(MemoryLedger::new(OPERATOR));
        ledger.insert(1, STUDENT, OPERATOR, SAMPLE_DIGEST);

        let (status, body) = call(
            server(ledger.clone(), None),
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": 1, "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authentic"], true);
        assert_eq!(body["tokenId"], "1");
        assert_eq!(body["issuerAddress"], format_address(OPERATOR));

        let mut forged = record_json();
        forged["grade"] = json!("B");
        let (status, body) = call(
            server(ledger, None),
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": 1, "certificate": forged })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authentic"], false);
        assert_eq!(body["onChainDigest"], SAMPLE_DIGEST);
    }

    #[tokio::test]
    async fn test_verify_accepts_token_id_strings() {
        let ledger = Arc::new(MemoryLedger::new(OPERATOR));
        ledger.insert(1, STUDENT, OPERATOR, SAMPLE_DIGEST);

        let (status, body) = call(
            server(ledger.clone(), None),
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": "0x1", "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authentic"], true);

        let (status, _) = call(
            server(ledger, None),
            "POST",
            "/verify-certificate",
            Some(json!({
                "tokenId": "340282366920938463463374607431768211456",
                "certificate": record_json(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_token_id_is_bad_request_not_invalid_record() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, body) = call(
            router,
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": "twelve", "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("invalid token id"));
        assert!(!message.contains("invalid certificate record"));
    }

    #[tokio::test]
    async fn test_verify_unknown_token_is_404() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, _) = call(
            router,
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": 999999, "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_verify_with_offline_ledger_is_503() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR).offline()), None);
        let (status, _) = call(
            router,
            "POST",
            "/verify-certificate",
            Some(json!({ "tokenId": 1, "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_batch_reports_per_item() {
        let ledger = Arc::new(MemoryLedger::new(OPERATOR));
        ledger.insert(1, STUDENT, OPERATOR, SAMPLE_DIGEST);
        let (status, body) = call(
            server(ledger, None),
            "POST",
            "/verify-certificates",
            Some(json!({ "items": [
                { "tokenId": 1, "certificate": record_json() },
                { "tokenId": 2, "certificate": record_json() },
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["verdict"]["authentic"], true);
        assert!(body["results"][1]["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_issue_then_query_owner_certificates() {
        let ledger = Arc::new(MemoryLedger::new(OPERATOR));
        let router = server(ledger.clone(), None);
        let student = "0xf567b8302d56b154ff6c4b2b851e433f3039edb0";

        let (status, _) = call(
            router.clone(),
            "POST",
            "/minters",
            Some(json!({ "account": format_address(OPERATOR) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            router.clone(),
            "POST",
            "/issue-certificate",
            Some(json!({ "recipient": student, "certificate": record_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["digest"], SAMPLE_DIGEST);
        assert_eq!(body["tokenId"], "1");

        let (status, body) = call(router.clone(), "GET", &format!("/certificates/{student}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokenIds"], json!(["1"]));

        let (status, body) = call(router, "GET", "/tokens/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], student);
        assert_eq!(body["dataHash"], SAMPLE_DIGEST);
    }

    #[tokio::test]
    async fn test_sign_and_relay_over_http() {
        let ledger = Arc::new(MemoryLedger::new(OPERATOR));
        let keys = random_key();
        ledger.register_issuer(keys.address());
        let router = server(ledger, Some(keys.clone()));

        let (status, signed) = call(
            router.clone(),
            "POST",
            "/sign-mint-request",
            Some(json!({
                "recipient": "0x9965507d1a55bcc2695c58ba16fb37d819b0a4dc",
                "tokenUri": "ipfs://sdodsfdosvodsfodsfsdfdsf13",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(router.clone(), "POST", "/relay-mint", Some(signed.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokenId"], "1");

        let (status, _) = call(router.clone(), "POST", "/relay-mint", Some(signed)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(router, "GET", &format!("/nonces/{}", format_address(keys.address())), None).await;
        assert_eq!(body["nonce"], "1");
    }

    #[tokio::test]
    async fn test_sign_without_key_is_501() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, _) = call(
            router,
            "POST",
            "/sign-mint-request",
            Some(json!({ "recipient": format_address(OPERATOR), "tokenUri": "ipfs://x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_bad_address_is_400() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, _) = call(router, "GET", "/certificates/not-an-address", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contract_owner() {
        let router = server(Arc::new(MemoryLedger::new(OPERATOR)), None);
        let (status, body) = call(router, "GET", "/contract-owner", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], format_address(OPERATOR));
    }
}
