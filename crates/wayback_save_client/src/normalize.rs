//! URL normalization and cache-busting applied before submission.

use crate::config::CacheBuster;
use rand::Rng;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 10;

/// Source of the random tokens used for cache-busting.
pub trait TokenSource {
    fn token(&mut self) -> String;
}

/// Lowercase alphanumeric tokens drawn from the thread-local RNG.
#[derive(Debug, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn token(&mut self) -> String {
        let mut rng = rand::rng();
        (0..TOKEN_LEN)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

/// Strip a leading `http://` or `https://`, case-insensitively, once.
pub fn strip_protocol(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = url.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &url[scheme.len()..];
            }
        }
    }
    url
}

/// Produce the exact string sent to the save endpoint.
pub fn normalize(
    url: &str,
    keep_protocol: bool,
    cache_buster: CacheBuster,
    tokens: &mut dyn TokenSource,
) -> String {
    let mut out = if keep_protocol {
        url.to_string()
    } else {
        strip_protocol(url).to_string()
    };

    match cache_buster {
        CacheBuster::None => {}
        CacheBuster::Fragment => {
            out.push('#');
            out.push_str(&tokens.token());
            out.push('=');
            out.push_str(&tokens.token());
        }
        CacheBuster::Query => {
            tracing::warn!(
                "query cache-buster: the service will index {} as its own resource, \
                 separate from the bare URL; searches for the base page may not find this capture",
                url
            );
            out.push(if out.contains('?') { '&' } else { '?' });
            out.push_str(&tokens.token());
            out.push('=');
            out.push_str(&tokens.token());
        }
    }
    out
}
