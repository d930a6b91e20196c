//! Human-readable token statistics.

use std::fmt;

use jiff::Timestamp;
use serde::Serialize;

use crate::Result;
use crate::codec::TokenCodec;
use crate::token::Claims;

/// Decoded summary of a token.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStats {
    pub subject: Option<String>,
    pub token_type: Option<String>,
    pub role: Option<String>,
    pub issued_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    /// Remaining lifetime in milliseconds at inspection time, zero once expired.
    pub remaining_ms: i64,
    pub claims: Claims,
}

impl TokenStats {
    /// Verifies and summarizes a token.
    ///
    /// # Errors
    ///
    /// Fails like [`TokenCodec::decode`].
    pub fn inspect(codec: &TokenCodec, token: &str) -> Result<Self> {
        let claims = codec.decode(token)?;
        Ok(Self::from_claims(claims, Timestamp::now()))
    }

    /// Summarizes already decoded claims relative to `now`.
    pub fn from_claims(claims: Claims, now: Timestamp) -> Self {
        let expires_at = claims.expires_at();
        let remaining_ms = expires_at
            .map(|exp| exp.as_millisecond() - now.as_millisecond())
            .unwrap_or_default()
            .max(0);

        Self {
            subject: claims.subject().map(str::to_owned),
            token_type: claims.raw_token_type().map(str::to_owned),
            role: claims.role().map(str::to_owned),
            issued_at: claims.issued_at(),
            expires_at,
            remaining_ms,
            claims,
        }
    }
}

impl fmt::Display for TokenStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |value: Option<&str>| value.unwrap_or("-").to_owned();

        writeln!(f, "subject:    {}", or_dash(self.subject.as_deref()))?;
        writeln!(f, "type:       {}", or_dash(self.token_type.as_deref()))?;
        writeln!(f, "role:       {}", or_dash(self.role.as_deref()))?;
        if let Some(issued_at) = self.issued_at {
            writeln!(f, "issued at:  {issued_at}")?;
        }
        if let Some(expires_at) = self.expires_at {
            writeln!(f, "expires at: {expires_at}")?;
        }
        write!(f, "expires in: {}", format_expiry(self.remaining_ms))
    }
}

/// Formats a duration in milliseconds as `Days:Hours:Mins:Seconds`.
///
/// Negative values are treated as zero.
pub fn format_expiry(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    format!("{days}:{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::*;
    use crate::token::keys;

    #[test]
    fn format_expiry_values() {
        assert_eq!(format_expiry(0), "0:00:00:00");
        assert_eq!(format_expiry(300_000), "0:00:05:00");
        assert_eq!(format_expiry(1_800_000), "0:00:30:00");
        assert_eq!(format_expiry(86_400_000), "1:00:00:00");
        assert_eq!(format_expiry(90_061_000), "1:01:01:01");
        assert_eq!(format_expiry(-5), "0:00:00:00");
    }

    #[test]
    fn stats_from_claims() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let expires = now + SignedDuration::from_secs(300);
        let claims = Claims::new()
            .with(keys::SUBJECT, "jane.doe")
            .with(keys::TYPE, "AUTH")
            .with(keys::ISSUED_AT, now.as_second())
            .with(keys::EXPIRES_AT, expires.as_second());

        let stats = TokenStats::from_claims(claims, now);
        assert_eq!(stats.subject.as_deref(), Some("jane.doe"));
        assert_eq!(stats.token_type.as_deref(), Some("AUTH"));
        assert_eq!(stats.role, None);
        assert_eq!(stats.remaining_ms, 300_000);
        assert!(stats.to_string().contains("expires in: 0:00:05:00"));
        assert!(stats.to_string().contains("role:       -"));
    }

    #[test]
    fn expired_stats_clamp_to_zero() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let claims = Claims::new().with(keys::EXPIRES_AT, now.as_second() - 10);
        assert_eq!(TokenStats::from_claims(claims, now).remaining_ms, 0);
    }
}
