//! Security header injection.
//!
//! Adds baseline security headers to guarded responses without touching
//! the applications' own content policies.

use crate::config::Config;
use pingora::Result;
use pingora::http::ResponseHeader;

/// Injects standard and configured security headers.
///
/// # Errors
///
/// Returns an error if header insertion fails.
pub fn inject_security_headers(response: &mut ResponseHeader, config: &Config) -> Result<()> {
    response.remove_header("Server");
    response.remove_header("X-Powered-By");

    if config.public_scheme == "https" {
        response.insert_header(
            "Strict-Transport-Security",
            "max-age=63072000; includeSubDomains",
        )?;
    }

    response.insert_header("X-Content-Type-Options", "nosniff")?;
    response.insert_header("Referrer-Policy", "strict-origin-when-cross-origin")?;

    if config.coop_policy != "off" {
        response.insert_header("Cross-Origin-Opener-Policy", &config.coop_policy)?;
    }

    Ok(())
}
