//! Route filters.
//!
//! Decide which request paths reach the session guard at all.

/// Path-matching rule of one guarded application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFilter {
    /// Every path except the listed prefixes and, optionally, static assets.
    Exclude {
        prefixes: Vec<String>,
        static_assets: bool,
    },
    /// Only the listed exact paths and everything under the listed prefixes.
    Include {
        exact: Vec<String>,
        prefixes: Vec<String>,
    },
}

impl RouteFilter {
    /// Admin dashboard: all pages, skipping API routes, framework
    /// internals and static files.
    #[must_use]
    pub fn admin() -> Self {
        Self::Exclude {
            prefixes: vec![
                "/api".to_string(),
                "/_next".to_string(),
                "/favicon.ico".to_string(),
            ],
            static_assets: true,
        }
    }

    /// User site: the landing page, the login page and the `/user` tree.
    #[must_use]
    pub fn user() -> Self {
        Self::Include {
            exact: vec!["/".to_string(), "/login".to_string()],
            prefixes: vec!["/user".to_string()],
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exclude {
                prefixes,
                static_assets,
            } => {
                !prefixes.iter().any(|p| under_prefix(path, p))
                    && !(*static_assets && is_static_asset(path))
            }
            Self::Include { exact, prefixes } => {
                exact.iter().any(|p| p == path) || prefixes.iter().any(|p| under_prefix(path, p))
            }
        }
    }
}

/// Canonical form of a request path: percent-escaped unreserved characters
/// decoded, empty and `.` segments dropped, `..` resolved against the root.
///
/// Returns `None` for paths with no safe canonical form: relative paths,
/// backslashes, encoded separators and malformed escapes.
#[must_use]
pub fn canonical_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix('/')?;
    if rest.contains('\\') {
        return None;
    }

    let mut segments: Vec<String> = Vec::new();
    let mut trailing_slash = false;
    for raw in rest.split('/') {
        let segment = decode_unreserved(raw)?;
        trailing_slash = matches!(segment.as_str(), "" | "." | "..");
        if segment == ".." {
            segments.pop();
        } else if !trailing_slash {
            segments.push(segment);
        }
    }

    let mut canonical = String::with_capacity(path.len());
    for segment in &segments {
        canonical.push('/');
        canonical.push_str(segment);
    }
    if canonical.is_empty() || trailing_slash {
        canonical.push('/');
    }
    Some(canonical)
}

fn decode_unreserved(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let hex = bytes.get(i + 1..i + 3)?;
        if !hex.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        let byte = u8::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
        match byte {
            b'/' | b'\\' => return None,
            b if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') => {
                out.push(b);
            }
            _ => out.extend_from_slice(&bytes[i..i + 3]),
        }
        i += 3;
    }
    String::from_utf8(out).ok()
}

/// `path` equals `prefix` or lies below it as a path segment.
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_static_asset(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "css"
                    | "js"
                    | "mjs"
                    | "map"
                    | "png"
                    | "jpg"
                    | "jpeg"
                    | "gif"
                    | "webp"
                    | "avif"
                    | "ico"
                    | "svg"
                    | "woff"
                    | "woff2"
                    | "ttf"
                    | "otf"
                    | "mp4"
                    | "webm"
                    | "pdf"
                    | "txt"
                    | "xml"
                    | "webmanifest"
                    | "wasm"
            )
        })
}
