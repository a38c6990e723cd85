use thiserror::Error;

/// The configuration record failed structural or cross-field validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field '{present}' requires '{missing}' to be set")]
    UnpairedField {
        present: &'static str,
        missing: &'static str,
    },

    #[error("Invalid CSS selector in '{field}': {selector}")]
    InvalidSelector { field: &'static str, selector: String },

    #[error("Invalid website URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown description type '{0}' (expected 'text' or 'html')")]
    UnknownDescriptionType(String),

    #[error("Invalid wait strategy: {0}")]
    InvalidWait(String),
}

/// A required field could not be extracted from an item container.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Item {index}: {field} selector '{selector}' matched nothing")]
    NoMatch {
        index: usize,
        field: &'static str,
        selector: String,
    },

    #[error("Item {index}: {field} element has no '{attribute}' attribute")]
    MissingAttribute {
        index: usize,
        field: &'static str,
        attribute: &'static str,
    },

    #[error("Item {index}: cannot resolve {field} URL '{value}': {source}")]
    BadUrl {
        index: usize,
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Item {index}: date '{value}' does not match format '{format}': {source}")]
    BadDate {
        index: usize,
        value: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// The document provider could not load the page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("No document session is open")]
    NoSession,
}

#[derive(Error, Debug)]
pub enum FeederError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid environment setting {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML write failed: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for FeederError {
    fn from(err: quick_xml::Error) -> Self {
        FeederError::Xml(err.to_string())
    }
}

pub type FeederResult<T> = Result<T, FeederError>;
