//! Mapping of `tshark -T json -e ...` packet layers to raw requests.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::RawRequest;

/// HTTP/1.x header fields and the header name each one carries.
const HTTP1_HEADER_FIELDS: &[(&str, &str)] = &[
    ("http.user_agent", "User-Agent"),
    ("http.accept", "Accept"),
    ("http.accept_language", "Accept-Language"),
    ("http.accept_encoding", "Accept-Encoding"),
    ("http.content_type", "Content-Type"),
    ("http.content_length", "Content-Length"),
    ("http.authorization", "Authorization"),
    ("http.cookie", "Cookie"),
    ("http.referer", "Referer"),
    ("http.origin", "Origin"),
    ("http.connection", "Connection"),
    ("http.cache_control", "Cache-Control"),
    ("http.upgrade", "Upgrade"),
    ("http.sec_websocket_key", "Sec-Websocket-Key"),
    ("http.sec_websocket_version", "Sec-Websocket-Version"),
    ("http.sec_fetch_site", "Sec-Fetch-Site"),
    ("http.sec_fetch_mode", "Sec-Fetch-Mode"),
    ("http.sec_fetch_dest", "Sec-Fetch-Dest"),
    ("http.x_requested_with", "X-Requested-With"),
    ("http.x_forwarded_for", "X-Forwarded-For"),
    ("http.x_csrf_token", "X-Csrf-Token"),
    ("http.x_xsrf_token", "X-Xsrf-Token"),
];

/// HTTP/2 named header fields.
const HTTP2_HEADER_FIELDS: &[(&str, &str)] = &[
    ("http2.headers.cookie", "Cookie"),
    ("http2.headers.authorization", "Authorization"),
    ("http2.headers.user-agent", "User-Agent"),
    ("http2.headers.content-type", "Content-Type"),
    ("http2.headers.content-length", "Content-Length"),
    ("http2.headers.accept", "Accept"),
    ("http2.headers.accept-language", "Accept-Language"),
    ("http2.headers.accept-encoding", "Accept-Encoding"),
    ("http2.headers.referer", "Referer"),
    ("http2.headers.origin", "Origin"),
    ("http2.headers.sec-fetch-site", "Sec-Fetch-Site"),
    ("http2.headers.sec-fetch-mode", "Sec-Fetch-Mode"),
    ("http2.headers.sec-fetch-dest", "Sec-Fetch-Dest"),
];

/// Every field requested from tshark with `-e`.
pub(super) fn requested_fields() -> Vec<&'static str> {
    let mut fields = vec![
        "http.request.method",
        "http.request.uri",
        "http.host",
        "http.request.full_uri",
        "http.request.line",
        "http.file_data",
        "urlencoded-form.key",
        "urlencoded-form.value",
        "json.key",
        "json.value.string",
        "mime_multipart.part",
        "data.data",
        "http2.headers.method",
        "http2.headers.path",
        "http2.headers.authority",
        "http2.headers.scheme",
        "http2.header.name",
        "http2.header.value",
        "tcp.dstport",
    ];
    fields.extend(HTTP1_HEADER_FIELDS.iter().map(|(f, _)| *f));
    fields.extend(HTTP2_HEADER_FIELDS.iter().map(|(f, _)| *f));
    fields
}

#[derive(Debug, Deserialize)]
struct Packet {
    #[serde(rename = "_source", default)]
    source: Source,
}

#[derive(Debug, Default, Deserialize)]
struct Source {
    #[serde(default)]
    layers: Map<String, Value>,
}

struct Layers<'a>(&'a Map<String, Value>);

impl<'a> Layers<'a> {
    fn all(&self, field: &str) -> Vec<&'a str> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    fn first(&self, field: &str) -> Option<&'a str> {
        self.all(field).into_iter().next().filter(|s| !s.is_empty())
    }
}

/// Parses tshark JSON output into raw requests, one per HTTP request packet.
/// Packets that carry neither an HTTP/1.x nor an HTTP/2 method still yield a
/// (method-less) request so the caller can count them.
pub fn requests_from_tshark_json(bytes: &[u8]) -> Result<Vec<RawRequest>, serde_json::Error> {
    let packets: Vec<Packet> = serde_json::from_slice(bytes)?;
    Ok(packets
        .iter()
        .map(|p| request_from_layers(&Layers(&p.source.layers)))
        .collect())
}

fn request_from_layers(layers: &Layers<'_>) -> RawRequest {
    let mut req = if layers.first("http.request.method").is_some() {
        http1_request(layers)
    } else {
        http2_request(layers)
    };
    req.port = layers.first("tcp.dstport").and_then(|p| p.trim().parse().ok());
    req
}

fn http1_request(layers: &Layers<'_>) -> RawRequest {
    let mut headers: Vec<(String, String)> = Vec::new();
    for (field, name) in HTTP1_HEADER_FIELDS {
        if let Some(value) = layers.first(field) {
            headers.push((name.to_string(), value.to_string()));
        }
    }
    for line in layers.all("http.request.line") {
        if let Some((name, value)) = line.split_once(": ") {
            let value = value
                .trim_end_matches("\\r\\n")
                .trim_end_matches(&['\r', '\n'][..])
                .trim();
            let name = name.trim();
            if !name.is_empty() && !value.is_empty() {
                headers.push((name.to_string(), value.to_string()));
            }
        }
    }

    RawRequest {
        method: layers.first("http.request.method").map(String::from),
        uri: layers.first("http.request.uri").unwrap_or_default().to_string(),
        host: layers.first("http.host").map(String::from),
        headers,
        body: http1_body(layers).unwrap_or_default(),
        scheme: None,
        port: None,
        full_url: layers.first("http.request.full_uri").map(String::from),
    }
}

/// Body from the most complete source available.
fn http1_body(layers: &Layers<'_>) -> Option<String> {
    if let Some(data) = layers.first("http.file_data") {
        return Some(data.to_string());
    }

    let keys = layers.all("urlencoded-form.key");
    if !keys.is_empty() {
        let values = layers.all("urlencoded-form.value");
        let pairs: Vec<String> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| !k.is_empty())
            .map(|(i, k)| format!("{k}={}", values.get(i).copied().unwrap_or("")))
            .collect();
        if !pairs.is_empty() {
            return Some(pairs.join("&"));
        }
    }

    let json_keys = layers.all("json.key");
    let json_values = layers.all("json.value.string");
    if !json_keys.is_empty() && !json_values.is_empty() {
        let object: Map<String, Value> = json_keys
            .iter()
            .zip(json_values.iter())
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        return Some(Value::Object(object).to_string());
    }

    let parts = layers.all("mime_multipart.part");
    if !parts.is_empty() {
        return Some(format!("[Multipart data with {} part(s)]", parts.len()));
    }

    let hex_data = layers.first("data.data")?.replace(':', "");
    let bytes = hex::decode(hex_data).ok()?;
    let decoded = String::from_utf8_lossy(&bytes).into_owned();
    (!decoded.trim().is_empty()).then_some(decoded)
}

fn http2_request(layers: &Layers<'_>) -> RawRequest {
    let mut headers: Vec<(String, String)> = Vec::new();
    for (field, name) in HTTP2_HEADER_FIELDS {
        if let Some(value) = layers.first(field) {
            headers.push((name.to_string(), value.to_string()));
        }
    }
    let names = layers.all("http2.header.name");
    let values = layers.all("http2.header.value");
    for (name, value) in names.iter().zip(values.iter()) {
        if !name.is_empty() && !value.is_empty() && !name.starts_with(':') {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    RawRequest {
        method: layers.first("http2.headers.method").map(String::from),
        uri: layers.first("http2.headers.path").unwrap_or_default().to_string(),
        host: layers.first("http2.headers.authority").map(String::from),
        headers,
        body: String::new(),
        scheme: layers.first("http2.headers.scheme").map(String::from),
        port: None,
        full_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http1_packet_with_headers_and_form_body() {
        let json = br#"[{"_source":{"layers":{
            "http.request.method":["POST"],
            "http.request.uri":["/login"],
            "http.host":["api.example.com"],
            "http.content_type":["application/x-www-form-urlencoded"],
            "http.request.line":["X-Trace: abc\r\n","Host: api.example.com\r\n"],
            "urlencoded-form.key":["user","pass"],
            "urlencoded-form.value":["bob","pw"],
            "tcp.dstport":["8080"]
        }}}]"#;
        let reqs = requests_from_tshark_json(json).unwrap();
        assert_eq!(reqs.len(), 1);
        let r = &reqs[0];
        assert_eq!(r.method.as_deref(), Some("POST"));
        assert_eq!(r.host.as_deref(), Some("api.example.com"));
        assert_eq!(r.port, Some(8080));
        assert_eq!(r.body, "user=bob&pass=pw");
        assert!(r.headers.contains(&("X-Trace".to_string(), "abc".to_string())));
        assert_eq!(r.headers[0].0, "Content-Type");
    }

    #[test]
    fn http1_hex_payload_decoded() {
        let json = br#"[{"_source":{"layers":{
            "http.request.method":["PUT"],
            "http.host":["h"],
            "data.data":["68:69"]
        }}}]"#;
        let reqs = requests_from_tshark_json(json).unwrap();
        assert_eq!(reqs[0].body, "hi");
        assert_eq!(reqs[0].uri, "");
    }

    #[test]
    fn http2_packet_uses_pseudo_headers() {
        let json = br#"[{"_source":{"layers":{
            "http2.headers.method":["GET"],
            "http2.headers.path":["/v1/me"],
            "http2.headers.authority":["api.example.com"],
            "http2.headers.scheme":["https"],
            "http2.headers.authorization":["Bearer t"],
            "http2.header.name":[":method","x-client","x-empty"],
            "http2.header.value":["GET","web",""]
        }}}]"#;
        let reqs = requests_from_tshark_json(json).unwrap();
        let r = &reqs[0];
        assert_eq!(r.method.as_deref(), Some("GET"));
        assert_eq!(r.uri, "/v1/me");
        assert_eq!(r.scheme.as_deref(), Some("https"));
        assert_eq!(
            r.headers,
            vec![
                ("Authorization".to_string(), "Bearer t".to_string()),
                ("x-client".to_string(), "web".to_string()),
            ]
        );
    }

    #[test]
    fn packet_without_method_yields_methodless_request() {
        let reqs = requests_from_tshark_json(br#"[{"_source":{"layers":{}}}]"#).unwrap();
        assert_eq!(reqs.len(), 1);
        assert!(reqs[0].method.is_none());
    }

    #[test]
    fn field_list_contains_header_fields() {
        let fields = requested_fields();
        assert!(fields.contains(&"http.cookie"));
        assert!(fields.contains(&"http2.headers.authorization"));
    }
}
