//! Built-in redaction patterns

/// Keywords that mark a structured field as sensitive regardless of its value.
/// Matched case-insensitively as substrings of the field key.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "api-key",
    "access_key",
    "private_key",
    "auth",
    "credential",
    "credit_card",
    "card_number",
    "cvv",
    "ssn",
    "session",
    "cookie",
];

/// Credentials written as `key=value` / `key: value`
pub const CREDENTIAL_ASSIGNMENT: &str = r#"(?i)\b(?:password|passwd|pwd|secret|token|api[_-]?key|access[_-]?key|private[_-]?key|auth(?:orization)?|credentials?)\s*[:=]\s*(?:"[^"]*"|'[^']*'|[^\s,;&]+)"#;

/// Major card network number layouts, optionally grouped with spaces or dashes
pub const CREDIT_CARD: &str = r"\b(?:4\d{3}|5[1-5]\d{2}|6011|65\d{2})(?:[ -]?\d{4}){3}\b|\b3[47]\d{2}[ -]?\d{6}[ -]?\d{5}\b";

/// US social security number
pub const SSN: &str = r"\b\d{3}-\d{2}-\d{4}\b";

/// HTTP bearer credentials
pub const BEARER_TOKEN: &str = r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*";

/// PEM encoded private key blocks
pub const PRIVATE_KEY_BLOCK: &str =
    r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]*?-----END [A-Z ]*PRIVATE KEY-----";

pub const EMAIL: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

pub const IPV4: &str =
    r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b";

pub const JWT: &str = r"\beyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+";

pub const AWS_ACCESS_KEY: &str = r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b";

pub const GITHUB_TOKEN: &str = r"\bgh[pousr]_[A-Za-z0-9]{36,}\b";

pub const SECRET_KEY_PREFIXED: &str = r"\bsk[-_](?:live_|test_)?[A-Za-z0-9]{20,}\b";

/// Credentials embedded in a connection URL (`scheme://user:pass@`)
pub const CONNECTION_STRING: &str = r"(?i)\b(?:postgres(?:ql)?|mysql|mongodb(?:\+srv)?|redis|amqp)://[^\s:@/]+:[^\s@/]+@";

/// Patterns for [`SensitiveDataFilter::basic`](super::SensitiveDataFilter::basic)
pub const BASIC_PATTERNS: &[&str] = &[
    PRIVATE_KEY_BLOCK,
    // before the assignment pattern, which would stop at the space after "Bearer"
    BEARER_TOKEN,
    CREDENTIAL_ASSIGNMENT,
    CREDIT_CARD,
    SSN,
];

/// Additional patterns layered on top of the basic set by
/// [`SensitiveDataFilter::full`](super::SensitiveDataFilter::full)
pub const EXTENDED_PATTERNS: &[&str] = &[
    CONNECTION_STRING,
    JWT,
    AWS_ACCESS_KEY,
    GITHUB_TOKEN,
    SECRET_KEY_PREFIXED,
    EMAIL,
    IPV4,
];
