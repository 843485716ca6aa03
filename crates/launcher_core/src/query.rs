//! Query-string helpers for inbound deep links and the outbound launch URL.

use std::{borrow::Cow, collections::HashMap};

use shared::domain::ClientId;

/// Parses the query parameters of `url` into a map.
///
/// Everything after the first `?` up to an optional `#fragment` is treated as
/// the query. Pairs split on their first `=`; a pair without `=` maps to an
/// empty value. Keys and values are percent-decoded (`+` stays literal) and a
/// sequence that does not decode to UTF-8 is kept as written. Later duplicates
/// win.
pub fn parse_query_params(url: &str) -> HashMap<String, String> {
    let Some((_, query)) = url.split_once('?') else {
        return HashMap::new();
    };
    let query = query.split_once('#').map_or(query, |(query, _)| query);

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Builds `<prefix>?clientId=<id>` with the id percent-encoded.
pub fn build_launch_url(prefix: &str, client_id: &ClientId) -> String {
    let separator = if prefix.contains('?') { '&' } else { '?' };
    format!(
        "{prefix}{separator}clientId={}",
        urlencoding::encode(client_id.as_str())
    )
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
