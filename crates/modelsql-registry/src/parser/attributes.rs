//! Attribute decoding for definition elements.

use modelsql_params::param_spec::{parse_bound, parse_bounds};
use modelsql_params::{DefaultKind, ParamSpec, ParamType};
use quick_xml::events::BytesStart;
use rustc_hash::FxHashMap;

/// Unescaped attributes of an element, keyed by local name.
pub(super) fn attribute_map(element: &BytesStart<'_>) -> Result<FxHashMap<String, String>, String> {
    let mut map = FxHashMap::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        map.insert(key, value.trim().to_string());
    }
    Ok(map)
}

/// Non-blank attribute value.
pub(super) fn text(attrs: &FxHashMap<String, String>, key: &str) -> Option<String> {
    attrs.get(key).filter(|v| !v.is_empty()).cloned()
}

pub(super) fn flag(attrs: &FxHashMap<String, String>, key: &str) -> Result<bool, String> {
    match attrs.get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(format!("'{key}' must be true or false, found '{other}'")),
    }
}

pub(super) fn integer(attrs: &FxHashMap<String, String>, key: &str) -> Result<Option<i64>, String> {
    parse_bound::<i64>(attrs.get(key).map(String::as_str).unwrap_or_default())
        .map_err(|e| format!("'{key}' {e}"))
}

/// Build a parameter contract from a `<parameter>` element's attributes.
pub(super) fn parameter(attrs: &FxHashMap<String, String>) -> Result<ParamSpec, String> {
    let name = text(attrs, "name").ok_or("parameter has no name")?;
    let mut spec = ParamSpec::new(name);

    if let Some(keyword) = text(attrs, "type") {
        let param_type = ParamType::from_keyword(&keyword)
            .ok_or_else(|| format!("unknown parameter type '{keyword}'"))?;
        spec.param_type = Some(param_type);
    }
    spec.required = flag(attrs, "required")?;

    if let Some(len) = text(attrs, "len") {
        (spec.min_len, spec.max_len) = parse_bounds::<usize>(&len).map_err(|e| format!("len {e}"))?;
    }
    if let Some(range) = text(attrs, "range") {
        (spec.min_value, spec.max_value) =
            parse_bounds::<f64>(&range).map_err(|e| format!("range {e}"))?;
    }
    if let Some(v) = attrs.get("minlen") {
        spec.min_len = parse_bound(v).map_err(|e| format!("minlen {e}"))?;
    }
    if let Some(v) = attrs.get("maxlen") {
        spec.max_len = parse_bound(v).map_err(|e| format!("maxlen {e}"))?;
    }
    if let Some(v) = attrs.get("minvalue") {
        spec.min_value = parse_bound(v).map_err(|e| format!("minvalue {e}"))?;
    }
    if let Some(v) = attrs.get("maxvalue") {
        spec.max_value = parse_bound(v).map_err(|e| format!("maxvalue {e}"))?;
    }

    spec.default = DefaultKind::parse(attrs.get("default").map(String::as_str).unwrap_or_default())?;
    spec.return_to_caller = flag(attrs, "return")?;
    Ok(spec)
}
