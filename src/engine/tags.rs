//! The tag vocabulary
//!
//! A format is a list of tag strings. Each one is either an exact literal
//! (`"status"`) or a `prefix:name` pair (`"header:X-Request-Id"`). Tags are
//! compiled once into [`Tag`] values when the configuration is resolved.

pub const PID: &str = "pid";
pub const TIME: &str = "time";
pub const REFERER: &str = "referer";
pub const PROTOCOL: &str = "protocol";
pub const ID: &str = "id";
pub const IP: &str = "ip";
pub const IPS: &str = "ips";
pub const HOST: &str = "host";
pub const METHOD: &str = "method";
pub const PATH: &str = "path";
pub const URL: &str = "url";
pub const UA: &str = "ua";
pub const LATENCY: &str = "latency";
pub const STATUS: &str = "status";
pub const RES_BODY: &str = "resBody";
pub const QUERY_PARAMS: &str = "queryParams";
pub const BODY: &str = "body";
pub const BYTES_SENT: &str = "bytesSent";
pub const BYTES_RECEIVED: &str = "bytesReceived";
pub const ROUTE: &str = "route";
pub const ERROR: &str = "error";

pub const HEADER_PREFIX: &str = "header:";
pub const QUERY_PREFIX: &str = "query:";
pub const FORM_PREFIX: &str = "form:";
pub const COOKIE_PREFIX: &str = "cookie:";
pub const LOCALS_PREFIX: &str = "locals:";

/// A compiled tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Pid,
    Time,
    Referer,
    Protocol,
    Id,
    Ip,
    Ips,
    Host,
    Method,
    Path,
    Url,
    UserAgent,
    Latency,
    Status,
    ResBody,
    QueryParams,
    Body,
    BytesSent,
    BytesReceived,
    Route,
    Error,
    Header(String),
    Query(String),
    Form(String),
    Cookie(String),
    Locals(String),
    Unknown(String),
}

impl Tag {
    /// Parse one tag string.
    ///
    /// Exact literals are tried first, then the prefixes in the order
    /// `header:`, `query:`, `form:`, `cookie:`, `locals:`. The parameter is
    /// everything after the prefix, verbatim (it may contain colons).
    pub fn parse(raw: &str) -> Tag {
        match raw {
            PID => Tag::Pid,
            TIME => Tag::Time,
            REFERER => Tag::Referer,
            PROTOCOL => Tag::Protocol,
            ID => Tag::Id,
            IP => Tag::Ip,
            IPS => Tag::Ips,
            HOST => Tag::Host,
            METHOD => Tag::Method,
            PATH => Tag::Path,
            URL => Tag::Url,
            UA => Tag::UserAgent,
            LATENCY => Tag::Latency,
            STATUS => Tag::Status,
            RES_BODY => Tag::ResBody,
            QUERY_PARAMS => Tag::QueryParams,
            BODY => Tag::Body,
            BYTES_SENT => Tag::BytesSent,
            BYTES_RECEIVED => Tag::BytesReceived,
            ROUTE => Tag::Route,
            ERROR => Tag::Error,
            _ => Self::parse_prefixed(raw),
        }
    }

    fn parse_prefixed(raw: &str) -> Tag {
        const PREFIXES: [(&str, fn(String) -> Tag); 5] = [
            (HEADER_PREFIX, Tag::Header),
            (QUERY_PREFIX, Tag::Query),
            (FORM_PREFIX, Tag::Form),
            (COOKIE_PREFIX, Tag::Cookie),
            (LOCALS_PREFIX, Tag::Locals),
        ];

        PREFIXES
            .iter()
            .find_map(|(prefix, build)| raw.strip_prefix(prefix).map(|p| build(p.to_string())))
            .unwrap_or_else(|| Tag::Unknown(raw.to_string()))
    }

    /// Compile a format, dropping unknown tags. Order and duplicates are kept.
    pub fn compile<S: AsRef<str>>(format: &[S]) -> Vec<Tag> {
        format
            .iter()
            .map(|raw| Tag::parse(raw.as_ref()))
            .filter(|tag| match tag {
                Tag::Unknown(raw) => {
                    tracing::debug!(tag = %raw, "ignoring unknown log tag");
                    false
                }
                _ => true,
            })
            .collect()
    }

    /// The key this tag is emitted under.
    pub fn key(&self) -> &str {
        match self {
            Tag::Pid => PID,
            Tag::Time => TIME,
            Tag::Referer => REFERER,
            Tag::Protocol => PROTOCOL,
            Tag::Id => ID,
            Tag::Ip => IP,
            Tag::Ips => IPS,
            Tag::Host => HOST,
            Tag::Method => METHOD,
            Tag::Path => PATH,
            Tag::Url => URL,
            Tag::UserAgent => UA,
            Tag::Latency => LATENCY,
            Tag::Status => STATUS,
            Tag::ResBody => RES_BODY,
            Tag::QueryParams => QUERY_PARAMS,
            Tag::Body => BODY,
            Tag::BytesSent => BYTES_SENT,
            Tag::BytesReceived => BYTES_RECEIVED,
            Tag::Route => ROUTE,
            Tag::Error => ERROR,
            Tag::Header(name)
            | Tag::Query(name)
            | Tag::Form(name)
            | Tag::Cookie(name)
            | Tag::Locals(name)
            | Tag::Unknown(name) => name,
        }
    }
}
