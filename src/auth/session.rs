use axum_extra::extract::cookie::Cookie;
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "token";

/// HTTP-only cookie carrying the signed session token.
pub fn session_cookie(token: String, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .expires(OffsetDateTime::now_utc() + Duration::days(ttl_days))
        .build()
}

/// Replacement cookie set on logout: empty value, already expired.
pub fn expired_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .expires(OffsetDateTime::now_utc())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Expiration;

    fn expiry(cookie: &Cookie<'_>) -> OffsetDateTime {
        match cookie.expires() {
            Some(Expiration::DateTime(dt)) => dt,
            other => panic!("expected datetime expiration, got {:?}", other),
        }
    }

    #[test]
    fn session_cookie_is_http_only_and_lives_for_ttl() {
        let cookie = session_cookie("tok-value".into(), 3);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "tok-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let lives_for = expiry(&cookie) - OffsetDateTime::now_utc();
        assert!(lives_for > Duration::days(2));
        assert!(lives_for <= Duration::days(3));
    }

    #[test]
    fn expired_cookie_clears_the_session() {
        let cookie = expired_cookie();
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.http_only(), Some(true));
        assert!(expiry(&cookie) <= OffsetDateTime::now_utc());
    }
}
