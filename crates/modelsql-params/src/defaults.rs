//! Default synthesis and the per-command parameter pass.

use modelsql_core::errors::ParamError;
use modelsql_core::types::ParamMap;
use serde_json::Value as JsonValue;

use crate::idgen::IdGenerator;
use crate::named::NamedValues;
use crate::param_spec::{DefaultKind, ParamSpec};
use crate::validate::validate_value;

/// Where synthesized defaults come from.
#[derive(Clone, Copy)]
pub struct DefaultSources<'a> {
    pub ids: &'a IdGenerator,
    pub named: &'a NamedValues,
}

impl DefaultSources<'static> {
    /// Process-wide id generator and named value table.
    pub fn global() -> Self {
        Self {
            ids: IdGenerator::global(),
            named: NamedValues::global(),
        }
    }
}

/// Fill in defaults and validate `params` against `specs`, in declaration order.
///
/// A parameter that is absent (missing or null) and has a default kind gets a
/// synthesized value, which is not validated. Every other declared parameter
/// is validated; the first failure aborts the pass. Returns the synthesized
/// values flagged `return`.
pub fn resolve_params(
    specs: &[ParamSpec],
    params: &mut ParamMap,
    sources: DefaultSources<'_>,
) -> Result<ParamMap, ParamError> {
    let mut returned = ParamMap::new();

    for spec in specs {
        let absent = params.get(&spec.name).map_or(true, JsonValue::is_null);
        if absent && !spec.default.is_none() {
            let value = synthesize(spec, sources)?;
            if spec.return_to_caller {
                returned.insert(spec.name.clone(), value.clone());
            }
            params.insert(spec.name.clone(), value);
            continue;
        }
        validate_value(spec, params.get(&spec.name))?;
    }

    Ok(returned)
}

/// Produce the default value of `spec`.
pub fn synthesize(spec: &ParamSpec, sources: DefaultSources<'_>) -> Result<JsonValue, ParamError> {
    let value = match &spec.default {
        DefaultKind::None => JsonValue::Null,
        DefaultKind::Uuid => JsonValue::String(sources.ids.next_short_id()),
        DefaultKind::IntId => JsonValue::from(sources.ids.next_id()),
        DefaultKind::NowDate => {
            JsonValue::String(chrono::Local::now().format("%Y-%m-%d").to_string())
        }
        DefaultKind::NowDateTime => {
            JsonValue::String(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
        }
        DefaultKind::NowUnix => JsonValue::from(chrono::Utc::now().timestamp()),
        DefaultKind::Custom { name, args } => sources.named.resolve(&spec.name, name, args)?,
    };
    Ok(value)
}
