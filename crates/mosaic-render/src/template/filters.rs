//! MiniJinja filter registration.

use chrono::DateTime;
use minijinja::{Environment, Error, ErrorKind};

const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Registers the built-in filters on a composed environment.
///
/// - `slugify`: ASCII, lowercase, dash-separated (`"Préface à 2"` → `"preface-a-2"`)
/// - `datetime`: formats an RFC 3339 timestamp, e.g. a module's `updated_at`
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("slugify", |value: String| -> String { slugify(&value) });

    env.add_filter(
        "datetime",
        |value: String, format: Option<String>| -> Result<String, Error> {
            let parsed = DateTime::parse_from_rfc3339(&value).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("`datetime` expects an RFC 3339 timestamp, got {value:?}: {e}"),
                )
            })?;
            let format = format.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT);
            Ok(parsed.format(format).to_string())
        },
    );
}

/// Transliterates to ASCII and joins alphanumeric runs with `-`.
pub fn slugify(value: &str) -> String {
    let ascii = deunicode::deunicode(value).to_ascii_lowercase();
    ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
