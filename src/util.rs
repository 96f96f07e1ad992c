use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer};
use url::form_urlencoded;

/// `path?k=v&...` with form encoding; the bare path when there are no pairs.
pub(crate) fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{path}?{query}")
}

/// GRiD is a Django service and expects Python-style booleans.
pub(crate) fn py_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

pub(crate) fn require(value: &str, message: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::GridError::validation(message));
    }
    Ok(())
}

/// Django serializes empty model fields as `null`; decode them as the zero value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

pub(crate) fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

/// The `filename` advertised by a `Content-Disposition` header, reduced to its
/// final path component. `filename*` (RFC 5987) wins over `filename`.
pub(crate) fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut rest = value.trim();
    let kind_end = rest.find(';').unwrap_or(rest.len());
    let kind = rest[..kind_end].trim();
    if kind.is_empty() || kind.contains(['=', '"', ' ']) {
        return None;
    }
    rest = &rest[kind_end..];

    let mut plain: Option<String> = None;
    let mut extended: Option<String> = None;

    while let Some(stripped) = rest.strip_prefix(';') {
        if stripped.trim().is_empty() {
            rest = "";
            break;
        }
        let (name, value, tail) = parse_param(stripped)?;
        match name.to_ascii_lowercase().as_str() {
            "filename" => plain = Some(value),
            "filename*" => extended = decode_ext_value(&value),
            _ => {}
        }
        rest = tail.trim_start();
    }
    if !rest.is_empty() {
        return None;
    }

    let name = extended.or(plain)?;
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

fn parse_param(input: &str) -> Option<(String, String, &str)> {
    let input = input.trim_start();
    let eq = input.find('=')?;
    let name = input[..eq].trim();
    if name.is_empty() || name.contains([';', '"', ' ']) {
        return None;
    }
    let after = input[eq + 1..].trim_start();

    if let Some(quoted) = after.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => value.push(chars.next()?.1),
                '"' => return Some((name.to_string(), value, &quoted[idx + 1..])),
                other => value.push(other),
            }
        }
        return None;
    }

    let end = after.find(';').unwrap_or(after.len());
    let value = after[..end].trim();
    if value.is_empty() || value.contains(['"', ' ']) {
        return None;
    }
    Some((name.to_string(), value.to_string(), &after[end..]))
}

/// `charset'lang'percent-encoded`; only UTF-8 and ASCII charsets are accepted.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?.to_ascii_lowercase();
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    if charset != "utf-8" && charset != "us-ascii" {
        return None;
    }

    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
