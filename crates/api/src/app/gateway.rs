//! Gateway orchestrator: sequences decode → session → identity →
//! entitlements → authorization → transfer for one document request.
//!
//! Every stage is an explicit [`GatewayStage`]. Any failure ends the request
//! with a [`GatewayError`]; a missing session ends it with a sign-in redirect.

use std::sync::Arc;

use axum::response::Response;
use tracing::Instrument;

use docgate_auth::{EntitlementSet, Identity, authorize, explain_authorization};
use docgate_core::{AccessToken, DocumentUrl, decode};
use docgate_infra::{
    AccountDirectory, Credential, DocumentOrigin, SessionState, SessionVerifier, UpstreamError,
    UpstreamService,
};

use crate::app::errors::{ErrorResponder, GatewayError};
use crate::app::transfer;
use crate::config::GatewayConfig;

/// Shared, read-only request-handling state.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub directory: Arc<dyn AccountDirectory>,
    pub origin: Arc<dyn DocumentOrigin>,
    pub responder: ErrorResponder,
}

impl GatewayState {
    pub fn new(
        config: GatewayConfig,
        sessions: Arc<dyn SessionVerifier>,
        directory: Arc<dyn AccountDirectory>,
        origin: Arc<dyn DocumentOrigin>,
    ) -> Self {
        let responder = ErrorResponder::new(config.frontend_url.clone());
        Self {
            config: Arc::new(config),
            sessions,
            directory,
            origin,
            responder,
        }
    }
}

/// Progress marker of one request, used for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStage {
    Start,
    KeyValidated,
    UrlDecoded,
    SessionVerified,
    TokenObtained,
    IdentityResolved,
    Authorized,
    Streaming,
}

impl core::fmt::Display for GatewayStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::KeyValidated => "key_validated",
            Self::UrlDecoded => "url_decoded",
            Self::SessionVerified => "session_verified",
            Self::TokenObtained => "token_obtained",
            Self::IdentityResolved => "identity_resolved",
            Self::Authorized => "authorized",
            Self::Streaming => "streaming",
        })
    }
}

/// One inbound document request.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    /// Logical document name from the path.
    pub name: String,
    /// Raw `key` query value, if any.
    pub key: Option<String>,
    /// Original path and query, replayed after sign-in.
    pub return_to: String,
    pub headers: axum::http::HeaderMap,
}

/// Non-error terminal states.
pub enum GatewayOutcome {
    /// The document is streaming.
    Stream(Response),
    /// No session: send the caller to sign in, then back to `return_to`.
    SignIn { return_to: String },
}

/// Failure annotated with the last stage reached.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: GatewayStage,
    pub error: GatewayError,
}

struct Progress {
    stage: GatewayStage,
}

impl Progress {
    fn advance(&mut self, next: GatewayStage) {
        tracing::debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    fn fail(&self, error: GatewayError) -> StageFailure {
        StageFailure {
            stage: self.stage,
            error,
        }
    }
}

/// Run one request to its terminal state.
pub async fn run(state: &GatewayState, req: DocumentRequest) -> Result<GatewayOutcome, StageFailure> {
    let span = tracing::info_span!("document", name = %req.name);
    process(state, req).instrument(span).await
}

async fn process(state: &GatewayState, req: DocumentRequest) -> Result<GatewayOutcome, StageFailure> {
    let mut progress = Progress {
        stage: GatewayStage::Start,
    };

    // START → KEY_VALIDATED
    let token = req
        .key
        .as_deref()
        .and_then(|k| AccessToken::new(k).ok())
        .ok_or_else(|| progress.fail(GatewayError::MissingKey))?;
    let secret = state
        .config
        .secret_key
        .as_ref()
        .ok_or_else(|| progress.fail(GatewayError::MissingSecret))?;
    progress.advance(GatewayStage::KeyValidated);

    // KEY_VALIDATED → URL_DECODED
    let document = decode(token.as_str(), secret)
        .map_err(|e| e.to_string())
        .and_then(|plain| DocumentUrl::parse(plain).map_err(|e| e.to_string()))
        .map_err(|reason| progress.fail(GatewayError::InvalidKey(reason)))?;
    progress.advance(GatewayStage::UrlDecoded);

    // URL_DECODED → SESSION_VERIFIED (or sign-in)
    let session = match state.sessions.verify(&req.headers).await {
        Ok(SessionState::Active(session)) => session,
        Ok(SessionState::Missing) => {
            tracing::info!("no session; redirecting to sign-in");
            return Ok(GatewayOutcome::SignIn {
                return_to: req.return_to,
            });
        }
        Err(e) if e.is_timeout() => {
            return Err(progress.fail(GatewayError::UpstreamTimeout(e.service())));
        }
        Err(e) => {
            tracing::warn!(error = %e, "session verification failed; treating as signed out");
            return Ok(GatewayOutcome::SignIn {
                return_to: req.return_to,
            });
        }
    };
    progress.advance(GatewayStage::SessionVerified);

    // SESSION_VERIFIED → TOKEN_OBTAINED
    let credential = session
        .credential
        .ok_or_else(|| progress.fail(GatewayError::SessionExpired))?;
    progress.advance(GatewayStage::TokenObtained);

    // TOKEN_OBTAINED → IDENTITY_RESOLVED
    let identity = resolve_identity(state.directory.as_ref(), &credential)
        .await
        .map_err(|e| progress.fail(e))?;
    let entitlements = fetch_entitlements(state.directory.as_ref(), &credential, &identity)
        .await
        .map_err(|e| progress.fail(e))?;
    progress.advance(GatewayStage::IdentityResolved);

    // IDENTITY_RESOLVED → AUTHORIZED
    let grant = authorize(&identity, &entitlements, &document).map_err(|_| {
        let explanation = explain_authorization(&identity, &entitlements, &document);
        tracing::debug!(reason = %explanation.reason, "authorization denied");
        progress.fail(GatewayError::PermissionDenied)
    })?;
    tracing::debug!(?grant, "authorization granted");
    progress.advance(GatewayStage::Authorized);

    // AUTHORIZED → STREAMING
    let origin = state
        .origin
        .fetch(&document)
        .await
        .map_err(|e| progress.fail(transfer::origin_failure(e)))?;
    let resp = transfer::relay(origin, &req.name, &token, &state.config.cache)
        .map_err(|e| progress.fail(e))?;
    progress.advance(GatewayStage::Streaming);

    tracing::info!(origin = %document.redacted(), "streaming document");
    Ok(GatewayOutcome::Stream(resp))
}

async fn resolve_identity(
    directory: &dyn AccountDirectory,
    credential: &Credential,
) -> Result<Identity, GatewayError> {
    let info = directory.user_info(credential).await.map_err(|e| match e {
        UpstreamError::Timeout { .. } => GatewayError::UpstreamTimeout(UpstreamService::Identity),
        other => {
            tracing::warn!(error = %other, "identity lookup failed");
            GatewayError::IdentityUnresolved
        }
    })?;

    let id = info.id.ok_or(GatewayError::IdentityUnresolved)?;
    Ok(Identity::new(id, info.roles))
}

/// Entitlement failures fail closed to an empty set, except timeouts.
async fn fetch_entitlements(
    directory: &dyn AccountDirectory,
    credential: &Credential,
    identity: &Identity,
) -> Result<EntitlementSet, GatewayError> {
    match directory.unlocked_resources(credential, &identity.id).await {
        Ok(list) => Ok(list.into_iter().collect()),
        Err(UpstreamError::Timeout { .. }) => {
            Err(GatewayError::UpstreamTimeout(UpstreamService::Entitlements))
        }
        Err(e) => {
            tracing::warn!(error = %e, "entitlement lookup failed; assuming none");
            Ok(EntitlementSet::empty())
        }
    }
}
