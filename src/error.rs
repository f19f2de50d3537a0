//! Error types for javadoc-parser.

use thiserror::Error;

/// Errors that can occur while building the catalog or resolving a query.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport gave up after exhausting its retry budget.
    ///
    /// Fatal for the calling query; the resolver never retries on top of the
    /// fetcher's own budget.
    #[error("failed to fetch `{location}` after {attempts} attempt(s)")]
    Fetch {
        /// The location that could not be fetched
        location: String,
        /// How many attempts were made before giving up
        attempts: u32,
        /// The underlying transport error
        #[source]
        source: anyhow::Error,
    },

    /// No class or member matched the query.
    ///
    /// Recoverable: the caller can re-issue a corrected query.
    #[error("no class, method, enum constant, or field matched `{query}`")]
    NotFound {
        /// The offending query text
        query: String,
    },

    /// A fetched page is missing the minimum structure for a record.
    ///
    /// Fatal for that one page. A multi-class search catches this and
    /// excludes the candidate instead of aborting.
    #[error("malformed page at `{location}`: {reason}")]
    MalformedPage {
        /// The page that could not be parsed
        location: String,
        /// What was missing or unparsable
        reason: String,
    },

    /// The blocking HTTP client could not be constructed.
    #[error("failed to initialize http client")]
    ClientInit(#[source] reqwest::Error),
}

impl Error {
    /// Build a `NotFound` for the given query text.
    pub(crate) fn not_found(query: impl Into<String>) -> Self {
        Error::NotFound {
            query: query.into(),
        }
    }

    /// Build a `MalformedPage` for the given location.
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPage {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
