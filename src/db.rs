//! Per-request database session.
//!
//! [`db_session_middleware`] attaches a [`DbSession`] to every request. Handlers pull
//! it out with the extractor and borrow the transaction through [`DbSession::acquire`].
//! Once the handler has produced a response the middleware commits when the status is
//! below 400 and rolls back otherwise. A session whose handler never touched the
//! database never checks a connection out of the pool.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Identifier of the request a session is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

type TxSlot = Option<Transaction<'static, Postgres>>;

#[derive(Clone)]
pub struct DbSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    pool: PgPool,
    request_id: RequestId,
    tx: Arc<Mutex<TxSlot>>,
}

impl DbSession {
    pub fn new(pool: PgPool, request_id: RequestId) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                pool,
                request_id,
                tx: Arc::new(Mutex::new(None)),
            }),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    /// Borrow the request's transaction, beginning it on first use.
    pub async fn acquire(
        &self,
    ) -> Result<OwnedMappedMutexGuard<TxSlot, Transaction<'static, Postgres>>, sqlx::Error> {
        let mut slot = self.inner.tx.clone().lock_owned().await;
        let tx = match slot.take() {
            Some(tx) => tx,
            None => {
                let tx = self.inner.pool.begin().await?;
                debug!(request_id = %self.inner.request_id.0, "database session opened");
                tx
            }
        };
        Ok(OwnedMutexGuard::map(slot, |slot| slot.insert(tx)))
    }

    /// Commit if `status` is a success, roll back otherwise. No-op if nothing was opened.
    pub async fn finish(&self, status: StatusCode) -> Result<(), sqlx::Error> {
        let Some(tx) = self.inner.tx.lock().await.take() else {
            return Ok(());
        };
        let request_id = self.inner.request_id.0;
        if status.as_u16() < 400 {
            tx.commit().await?;
            debug!(%request_id, %status, "database session committed");
        } else {
            tx.rollback().await?;
            debug!(%request_id, %status, "database session rolled back");
        }
        Ok(())
    }
}

pub async fn db_session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = RequestId(Uuid::new_v4());
    let session = DbSession::new(state.db.clone(), request_id);
    req.extensions_mut().insert(session.clone());

    let span = info_span!("db_session", request_id = %request_id.0);
    let response = next.run(req).instrument(span.clone()).await;

    match session.finish(response.status()).instrument(span).await {
        Ok(()) => response,
        Err(e) => {
            error!(error = %e, request_id = %request_id.0, "failed to close database session");
            ApiError::Database(e).into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DbSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<DbSession>().cloned().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "database session middleware is not installed"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finishing_an_unused_session_does_not_touch_the_pool() {
        let state = AppState::fake();
        let session = DbSession::new(state.db.clone(), RequestId(Uuid::new_v4()));
        session.finish(StatusCode::OK).await.unwrap();
        session
            .finish(StatusCode::INTERNAL_SERVER_ERROR)
            .await
            .unwrap();
        assert_eq!(state.db.size(), 0);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn acquire_can_be_held_across_await_in_handlers() {
        let session = DbSession::new(AppState::fake().db, RequestId(Uuid::new_v4()));
        let handler = async move {
            let mut tx = session.acquire().await?;
            sqlx::query("SELECT 1").execute(&mut **tx).await?;
            Ok::<_, sqlx::Error>(())
        };
        assert_send(&handler);
    }

    #[tokio::test]
    async fn clones_share_the_request_id() {
        let state = AppState::fake();
        let id = RequestId(Uuid::new_v4());
        let session = DbSession::new(state.db.clone(), id);
        assert_eq!(session.clone().request_id(), id);
    }

    #[tokio::test]
    async fn extractor_fails_without_middleware() {
        let req = axum::http::Request::builder()
            .uri("/")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let err = DbSession::from_request_parts(&mut parts, &()).await.err();
        assert!(matches!(err, Some(ApiError::Internal(_))));
    }
}
