//! Request classification and dispatch.
//!
//! Everything here is transport-free: the server turns a `tiny_http` request
//! into a method, a URL, a fragment flag and a body, and sends back the
//! [`Reply`]. That keeps routing testable without a socket.

use minijinja::HtmlEscape;

use mosaic_render::{RenderError, RenderMode};

use crate::app::{App, AppError};

/// A recognised endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Listing,
    Page { slug: String },
    Preview { slug: String },
    Save { slug: String, filename: String },
    NotFound,
}

impl Route {
    /// Classifies a request line. Query strings are ignored and path segments
    /// are percent-decoded.
    pub fn parse(method: &str, url: &str) -> Route {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let segments: Option<Vec<String>> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).ok().map(|s| s.into_owned()))
            .collect();
        let Some(segments) = segments else {
            return Route::NotFound;
        };
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match (method, segments.as_slice()) {
            ("GET", []) => Route::Home,
            ("GET", ["modules"]) => Route::Listing,
            ("GET", ["m", slug]) => Route::Page {
                slug: slug.to_string(),
            },
            ("POST", ["m", slug, "preview"]) => Route::Preview {
                slug: slug.to_string(),
            },
            ("PUT", ["m", slug, "templates", filename]) if is_plain_filename(filename) => {
                Route::Save {
                    slug: slug.to_string(),
                    filename: filename.to_string(),
                }
            }
            _ => Route::NotFound,
        }
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Response produced by [`dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Whether the request headers ask for a fragment: `header` must be present
/// with the value `true` (any case), as htmx sends it.
pub fn fragment_requested<'a>(
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    header: &str,
) -> bool {
    headers.into_iter().any(|(name, value)| {
        name.eq_ignore_ascii_case(header) && value.trim().eq_ignore_ascii_case("true")
    })
}

/// Out-of-band title update appended to fragment responses.
pub fn title_snippet(name: &str) -> String {
    format!(
        r#"<title id="mosaic-title" hx-swap-oob="true">{}</title>"#,
        HtmlEscape(name)
    )
}

/// Runs a classified request against the application.
pub fn dispatch(app: &App, route: &Route, fragment: bool, body: &str) -> Reply {
    let result = match route {
        Route::Home => app.home().map(Reply::ok),
        Route::Listing => app.listing().map(Reply::ok),
        Route::Page { slug } => {
            app.page(slug, RenderMode::from_fragment_flag(fragment))
                .map(|response| {
                    let mut html = response.page.body;
                    if response.page.mode == RenderMode::Fragment {
                        html.push_str(&title_snippet(&response.module_name));
                    }
                    Reply::ok(html)
                })
        }
        Route::Preview { slug } => app
            .preview(slug, body)
            .map(|output| Reply::ok(output.into_body())),
        Route::Save { slug, filename } => app
            .save(slug, filename, body)
            .map(|()| Reply::status(204, "")),
        Route::NotFound => Err(AppError::NotFound("no such route".to_string())),
    };

    result.unwrap_or_else(|e| error_reply(route, &e))
}

fn error_reply(route: &Route, err: &AppError) -> Reply {
    let status = match err {
        AppError::NotFound(_) => 404,
        AppError::Render(RenderError::MissingEntryBlock { .. }) => 404,
        AppError::Unavailable(_) => 503,
        AppError::BadRequest(_) => 400,
        AppError::Build(_) => 422,
        AppError::Render(_) | AppError::Catalog(_) | AppError::Write { .. } => 500,
    };
    if status >= 500 {
        tracing::error!(?route, error = %err, status, "request failed");
    } else {
        tracing::debug!(?route, error = %err, status, "request rejected");
    }
    Reply::status(status, HtmlEscape(&err.to_string()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("GET", "/"), Route::Home);
        assert_eq!(Route::parse("GET", "/modules?x=1"), Route::Listing);
        assert_eq!(
            Route::parse("GET", "/m/news"),
            Route::Page {
                slug: "news".to_string()
            }
        );
        assert_eq!(
            Route::parse("POST", "/m/news/preview"),
            Route::Preview {
                slug: "news".to_string()
            }
        );
        assert_eq!(
            Route::parse("PUT", "/m/news/templates/my%20widget.html"),
            Route::Save {
                slug: "news".to_string(),
                filename: "my widget.html".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_other_methods_and_paths() {
        assert_eq!(Route::parse("POST", "/"), Route::NotFound);
        assert_eq!(Route::parse("GET", "/m/news/preview"), Route::NotFound);
        assert_eq!(Route::parse("DELETE", "/m/news"), Route::NotFound);
        assert_eq!(Route::parse("GET", "/static/app.js"), Route::NotFound);
    }

    #[test]
    fn test_parse_rejects_path_tricks() {
        assert_eq!(
            Route::parse("PUT", "/m/news/templates/..%2Fmodule.json"),
            Route::NotFound
        );
        assert_eq!(
            Route::parse("PUT", "/m/news/templates/%2E%2E"),
            Route::NotFound
        );
        assert_eq!(Route::parse("GET", "/m/%FF"), Route::NotFound);
    }

    #[test]
    fn test_fragment_header_needs_true_value() {
        assert!(fragment_requested([("HX-Request", "true")], "HX-Request"));
        assert!(fragment_requested([("hx-request", "TRUE")], "HX-Request"));
        assert!(!fragment_requested([("HX-Request", "false")], "HX-Request"));
        assert!(!fragment_requested([("HX-Request", "")], "HX-Request"));
        assert!(!fragment_requested([("Accept", "true")], "HX-Request"));
        assert!(!fragment_requested(std::iter::empty(), "HX-Request"));
    }

    #[test]
    fn test_title_snippet_escapes() {
        assert_eq!(
            title_snippet("A & B"),
            r#"<title id="mosaic-title" hx-swap-oob="true">A &amp; B</title>"#
        );
    }
}
