use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use serde::{Deserialize, Serialize};
use tollgate_core::{Token, UserTokens};

use crate::handler::{Error, ErrorKind};
use crate::header::{AUTHORIZATION, REFRESH_TOKEN, TX_TOKEN};

/// Writes an access and refresh token pair into `Authorization` and `Refresh-Token`.
#[derive(Debug, Clone)]
pub struct UserTokenHeaders(pub UserTokens);

impl IntoResponseParts for UserTokenHeaders {
    type Error = Error<'static>;

    fn into_response_parts(self, mut parts: ResponseParts) -> Result<ResponseParts, Self::Error> {
        insert_bearer(&mut parts, AUTHORIZATION, &self.0.access)?;
        insert_bearer(&mut parts, REFRESH_TOKEN, &self.0.refresh)?;
        Ok(parts)
    }
}

/// Writes a transaction token into `TX-TOKEN`.
#[derive(Debug, Clone)]
pub struct TransactionTokenHeader(pub Token);

impl IntoResponseParts for TransactionTokenHeader {
    type Error = Error<'static>;

    fn into_response_parts(self, mut parts: ResponseParts) -> Result<ResponseParts, Self::Error> {
        insert_bearer(&mut parts, TX_TOKEN, &self.0)?;
        Ok(parts)
    }
}

fn insert_bearer(parts: &mut ResponseParts, name: HeaderName, token: &Token) -> Result<(), Error<'static>> {
    let value = HeaderValue::try_from(token.bearer()).map_err(|e| {
        ErrorKind::InternalServerError.with_context(format!("token is not a valid header value: {e}"))
    })?;
    parts.headers_mut().insert(name, value);
    Ok(())
}

/// Body of a transaction token response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTokenBody {
    pub tx_token: String,
}

impl From<&Token> for TransactionTokenBody {
    fn from(token: &Token) -> Self {
        Self {
            tx_token: token.bearer(),
        }
    }
}
