//! HTTP response utilities.
//!
//! Provides shared functions for answering requests directly from the guard.

use crate::config::Config;
use crate::core::proxy::headers::inject_security_headers;
use pingora::Result;
use pingora::http::ResponseHeader;
use pingora::proxy::Session;

/// Builds a `303 See Other` header pointing at `location`.
///
/// # Errors
///
/// Returns an error if headers cannot be built.
pub fn redirect_header(
    config: &Config,
    location: &str,
    set_cookie: Option<&str>,
) -> Result<ResponseHeader> {
    let mut header = ResponseHeader::build(303, None)?;
    header.insert_header("Location", location)?;
    header.insert_header("Content-Length", "0")?;
    header.insert_header(
        "Cache-Control",
        "no-store, no-cache, must-revalidate, max-age=0",
    )?;

    if let Some(cookie) = set_cookie {
        header.insert_header("Set-Cookie", cookie)?;
    }

    inject_security_headers(&mut header, config)?;
    Ok(header)
}

/// Serves a redirect response with optional cookie.
///
/// # Errors
///
/// Returns an error if headers cannot be built or response cannot be written.
pub async fn serve_redirect(
    session: &mut Session,
    config: &Config,
    location: &str,
    set_cookie: Option<&str>,
) -> Result<bool> {
    let header = redirect_header(config, location, set_cookie)?;
    session
        .write_response_header(Box::new(header), true)
        .await?;
    Ok(true)
}

/// Serves a short plain-text response.
///
/// # Errors
///
/// Returns an error if headers cannot be built or response cannot be written.
pub async fn serve_text(session: &mut Session, status: u16, body: &'static str) -> Result<bool> {
    let mut header = ResponseHeader::build(status, None)?;
    header.insert_header("Content-Type", "text/plain")?;
    header.insert_header("Content-Length", body.len().to_string())?;
    header.insert_header("Cache-Control", "no-store")?;
    session
        .write_response_header(Box::new(header), false)
        .await?;
    session
        .write_response_body(Some(bytes::Bytes::from_static(body.as_bytes())), true)
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    #[test]
    fn test_redirect_header() {
        let config = create_test_config();
        let header = redirect_header(&config, "http://eco.test/login", None).unwrap();

        assert_eq!(header.status.as_u16(), 303);
        assert_eq!(
            header.headers.get("Location").unwrap(),
            "http://eco.test/login"
        );
        assert!(header.headers.get("Set-Cookie").is_none());
        assert!(header.headers.get("X-Content-Type-Options").is_some());
    }

    #[test]
    fn test_redirect_header_with_cookie() {
        let config = create_test_config();
        let header =
            redirect_header(&config, "/login", Some("eco_session=; Max-Age=0")).unwrap();

        assert_eq!(
            header.headers.get("Set-Cookie").unwrap(),
            "eco_session=; Max-Age=0"
        );
        assert!(
            header
                .headers
                .get("Cache-Control")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("no-store")
        );
    }
}
