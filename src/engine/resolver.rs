//! Tag resolution
//!
//! Turns the compiled tag list into event fields, one field write per tag,
//! in order. Resolution never fails: missing data becomes an empty or zero
//! value, and tags whose data the host cannot provide are skipped.

use super::exchange::Exchange;
use super::locals::LocalValue;
use super::tags::Tag;
use crate::sink::LogEvent;
use std::time::Duration;

/// Everything a tag may read besides the exchange itself.
pub(crate) struct Context<'a> {
    pub exchange: &'a dyn Exchange,
    pub latency: Option<Duration>,
    pub error: Option<&'a str>,
    pub timestamp: &'a str,
    pub pid: &'a str,
    pub pretty_latency: bool,
}

pub(crate) fn resolve_all(tags: &[Tag], ctx: &Context<'_>, event: &mut LogEvent) {
    for tag in tags {
        resolve(tag, ctx, event);
    }
}

fn resolve(tag: &Tag, ctx: &Context<'_>, event: &mut LogEvent) {
    let ex = ctx.exchange;
    let key = tag.key();

    match tag {
        Tag::Pid => {
            event.str(key, ctx.pid);
        }
        Tag::Time => {
            event.str(key, ctx.timestamp);
        }
        Tag::Referer => {
            event.str(key, ex.header("referer"));
        }
        Tag::Protocol => {
            event.str(key, ex.protocol());
        }
        Tag::Id => {
            event.str(key, ex.header(super::exchange::X_REQUEST_ID));
        }
        Tag::Ip => {
            event.str(key, ex.client_ip());
        }
        Tag::Ips => {
            event.str(key, ex.header(super::exchange::X_FORWARDED_FOR));
        }
        Tag::Host => {
            event.str(key, ex.host());
        }
        Tag::Method => {
            event.str(key, ex.method().as_str());
        }
        Tag::Path => {
            event.str(key, ex.path());
        }
        Tag::Url => {
            event.str(key, ex.url());
        }
        Tag::UserAgent => {
            event.str(key, ex.header("user-agent"));
        }
        Tag::Latency => {
            // Only measured when the format asked for it.
            if let Some(latency) = ctx.latency {
                if ctx.pretty_latency {
                    event.str(key, format!("{:?}", latency));
                } else {
                    event.dur(key, latency);
                }
            }
        }
        Tag::Status => {
            event.int(key, i64::from(ex.status()));
        }
        Tag::ResBody => {
            if let Some(body) = ex.response_body() {
                event.bytes(key, body.to_vec());
            }
        }
        Tag::QueryParams => {
            event.str(key, ex.raw_query());
        }
        Tag::Body => {
            if let Some(body) = ex.request_body() {
                event.bytes(key, body.to_vec());
            }
        }
        Tag::BytesSent => {
            event.int(key, ex.bytes_sent());
        }
        Tag::BytesReceived => {
            event.int(key, ex.bytes_received());
        }
        Tag::Route => {
            event.str(key, ex.route());
        }
        Tag::Error => {
            if let Some(message) = ctx.error {
                event.err(message);
            }
        }
        Tag::Header(name) => {
            event.str(key, ex.header(name));
        }
        Tag::Query(name) => {
            event.str(key, ex.query_param(name));
        }
        Tag::Form(name) => {
            event.str(key, ex.form_value(name));
        }
        Tag::Cookie(name) => {
            event.str(key, ex.cookie(name).unwrap_or_default());
        }
        Tag::Locals(name) => match ex.local(name) {
            Some(LocalValue::Bytes(bytes)) => {
                event.bytes(key, bytes);
            }
            Some(LocalValue::Text(text)) => {
                event.str(key, text);
            }
            Some(LocalValue::Other(value)) => {
                event.str(key, value.to_string());
            }
            None => {}
        },
        Tag::Unknown(_) => {}
    }
}
