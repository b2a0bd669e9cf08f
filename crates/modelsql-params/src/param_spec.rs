//! Declared parameter contracts, as read from definition documents.

use std::fmt;
use std::str::FromStr;

/// Declared type of a parameter. Absent type means no validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Date,
    DateTime,
    Email,
    Blob,
}

impl ParamType {
    /// Parse a `type` attribute. Case-insensitive.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            "email" => Some(Self::Email),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Blob => "blob",
        }
    }
}

/// Server-side value synthesized when the caller omits the parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultKind {
    #[default]
    None,
    /// Base-36 unique id string.
    Uuid,
    /// Unique id as an integer.
    IntId,
    /// `YYYY-MM-DD`, local time.
    NowDate,
    /// `YYYY-MM-DD HH:MM:SS`, local time.
    NowDateTime,
    /// Unix seconds.
    NowUnix,
    /// Entry of the named value table, called with literal arguments.
    Custom { name: String, args: Vec<String> },
}

impl DefaultKind {
    /// Parse a `default` attribute: a keyword, `name` or `name(arg, ...)`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "" => return Ok(Self::None),
            "uuid" => return Ok(Self::Uuid),
            "intid" => return Ok(Self::IntId),
            "nowdate" => return Ok(Self::NowDate),
            "now" => return Ok(Self::NowDateTime),
            "nowunix" => return Ok(Self::NowUnix),
            _ => {}
        }

        let (name, args) = match text.find('(') {
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| format!("default '{text}' is missing a closing ')'"))?;
                let args = if inner.trim().is_empty() {
                    Vec::new()
                } else {
                    inner.split(',').map(|a| a.trim().to_string()).collect()
                };
                (text[..open].trim(), args)
            }
            None => (text, Vec::new()),
        };

        if !crate::named::is_valid_name(name) {
            return Err(format!("default '{text}' does not name a valid identifier"));
        }
        Ok(Self::Custom {
            name: name.to_string(),
            args,
        })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Contract of one named parameter of a command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: Option<ParamType>,
    pub required: bool,
    /// Length bounds in characters.
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    /// Inclusive numeric bounds.
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub default: DefaultKind,
    /// Report a synthesized default back to the caller.
    pub return_to_caller: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_len(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_default(mut self, default: DefaultKind, return_to_caller: bool) -> Self {
        self.default = default;
        self.return_to_caller = return_to_caller;
        self
    }
}

/// Parse a `min:max` shorthand. Either side may be empty.
pub fn parse_bounds<T>(text: &str) -> Result<(Option<T>, Option<T>), String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let (min, max) = text
        .split_once(':')
        .ok_or_else(|| format!("'{text}' is not of the form min:max"))?;
    Ok((parse_bound(min)?, parse_bound(max)?))
}

/// Parse a single optional bound; blank means unbounded.
pub fn parse_bound<T>(text: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<T>()
        .map(Some)
        .map_err(|e| format!("'{text}': {e}"))
}

/// Human-readable `[min, max]` for error messages.
pub(crate) fn describe_bounds<T: fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    let side = |b: Option<T>| b.map(|v| v.to_string()).unwrap_or_default();
    format!("[{}:{}]", side(min), side(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_keywords() {
        assert_eq!(ParamType::from_keyword("DateTime"), Some(ParamType::DateTime));
        assert_eq!(ParamType::from_keyword("uuid"), None);
    }

    #[test]
    fn test_default_keywords() {
        assert_eq!(DefaultKind::parse("").unwrap(), DefaultKind::None);
        assert_eq!(DefaultKind::parse("UUID").unwrap(), DefaultKind::Uuid);
        assert_eq!(DefaultKind::parse("now").unwrap(), DefaultKind::NowDateTime);
        assert_eq!(DefaultKind::parse("nowunix").unwrap(), DefaultKind::NowUnix);
    }

    #[test]
    fn test_custom_default_with_args() {
        assert_eq!(
            DefaultKind::parse("prefixed(ord, 2)").unwrap(),
            DefaultKind::Custom {
                name: "prefixed".into(),
                args: vec!["ord".into(), "2".into()],
            }
        );
        assert_eq!(
            DefaultKind::parse("tenant()").unwrap(),
            DefaultKind::Custom {
                name: "tenant".into(),
                args: vec![],
            }
        );
        assert!(DefaultKind::parse("bad name").is_err());
        assert!(DefaultKind::parse("open(1").is_err());
    }

    #[test]
    fn test_bounds_shorthand() {
        assert_eq!(parse_bounds::<usize>("3:6").unwrap(), (Some(3), Some(6)));
        assert_eq!(parse_bounds::<usize>(":6").unwrap(), (None, Some(6)));
        assert_eq!(parse_bounds::<f64>("10:").unwrap(), (Some(10.0), None));
        assert!(parse_bounds::<usize>("6").is_err());
        assert!(parse_bounds::<usize>("a:b").is_err());
    }

    #[test]
    fn test_describe_bounds() {
        assert_eq!(describe_bounds(Some(3), None), "[3:]");
        assert_eq!(describe_bounds::<f64>(Some(1.5), Some(2.0)), "[1.5:2]");
    }
}
