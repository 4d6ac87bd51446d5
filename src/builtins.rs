//! Expression built-ins (spec §4.B): the `format`, `isIp`, `isHostname`,
//! `isUri`, `isUriRef`, `isEmail`, `isHostAndPort`, `isIpPrefix`, `unique`,
//! `isNan`, `isInf` predicates, backed by [`crate::address`] and wired
//! into the expression runtime's global function set so both predefined
//! rules and user-authored `cel` constraints can call them by name.

use std::collections::HashSet;
use std::sync::Arc;

use cel_interpreter::extractors::This;
use cel_interpreter::{Context, Value as CelValue};

use crate::address;

pub fn is_email(s: &str) -> bool {
    address::is_valid_email(s)
}

pub fn is_hostname(s: &str) -> bool {
    address::is_valid_hostname(s)
}

pub fn is_ip(s: &str, version: u8) -> bool {
    address::is_valid_ip(s, version)
}

pub fn is_ip_prefix(s: &str, version: u8, strict: bool) -> bool {
    address::is_valid_ip_prefix(s, version, strict)
}

pub fn is_uri(s: &str) -> bool {
    address::is_valid_uri(s)
}

pub fn is_uri_ref(s: &str) -> bool {
    address::is_valid_uri_reference(s)
}

pub fn is_host_and_port(s: &str, port_required: bool) -> bool {
    address::is_valid_host_and_port(s, port_required)
}

pub fn is_nan(f: f64) -> bool {
    f.is_nan()
}

pub fn starts_with(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

pub fn ends_with(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// `true` if every element of `items` is distinct. Elements compare by
/// their `Debug` rendering since `cel_interpreter::Value` has no blanket
/// `Eq`/`Hash` impl; this is exact for every scalar the CEL runtime can
/// produce and never false-merges two differently-typed values.
pub fn unique(items: &[CelValue]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|v| seen.insert(format!("{v:?}")))
}

/// `sprintf`-style formatting: `%s` renders a value's CEL string
/// conversion, `%d` an integer, `%v` any value via `Debug`, `%%` a
/// literal percent sign. Unmatched extra args are ignored; a missing arg
/// for a placeholder renders as `%!(MISSING)`.
pub fn format(pattern: &str, args: &[CelValue]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut args = args.iter();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') | Some('d') | Some('v') => match args.next() {
                Some(v) => out.push_str(&format_arg(v)),
                None => out.push_str("%!(MISSING)"),
            },
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

fn format_arg(v: &CelValue) -> String {
    match v {
        CelValue::String(s) => s.as_str().to_string(),
        CelValue::Int(i) => i.to_string(),
        CelValue::UInt(u) => u.to_string(),
        CelValue::Float(f) => f.to_string(),
        CelValue::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

pub fn is_inf(f: f64, sign: i32) -> bool {
    if !f.is_infinite() {
        return false;
    }
    match sign.cmp(&0) {
        std::cmp::Ordering::Greater => f.is_sign_positive(),
        std::cmp::Ordering::Less => f.is_sign_negative(),
        std::cmp::Ordering::Equal => true,
    }
}

/// Registers the predicate built-ins into an expression `Context` under
/// the names `cel` constraints call them by. Structured rule predicates
/// (the `ScalarRules` boolean flags) call the plain functions above
/// directly rather than round-tripping through the expression runtime.
pub fn register(ctx: &mut Context) {
    ctx.add_function("isEmail", |This(s): This<Arc<String>>| -> bool {
        is_email(&s)
    });
    ctx.add_function("isHostname", |This(s): This<Arc<String>>| -> bool {
        is_hostname(&s)
    });
    ctx.add_function("isUri", |This(s): This<Arc<String>>| -> bool { is_uri(&s) });
    ctx.add_function("isUriRef", |This(s): This<Arc<String>>| -> bool {
        is_uri_ref(&s)
    });
    ctx.add_function("isIp", |This(s): This<Arc<String>>| -> bool { is_ip(&s, 0) });
    ctx.add_function(
        "isIp",
        |This(s): This<Arc<String>>, version: i64| -> bool { is_ip(&s, version as u8) },
    );
    ctx.add_function(
        "isIpPrefix",
        |This(s): This<Arc<String>>| -> bool { is_ip_prefix(&s, 0, false) },
    );
    ctx.add_function(
        "isHostAndPort",
        |This(s): This<Arc<String>>, port_required: bool| -> bool {
            is_host_and_port(&s, port_required)
        },
    );
    ctx.add_function("isNan", |This(f): This<f64>| -> bool { is_nan(f) });
    ctx.add_function(
        "isInf",
        |This(f): This<f64>, sign: i64| -> bool { is_inf(f, sign as i32) },
    );
    ctx.add_function(
        "startsWith",
        |This(s): This<Arc<String>>, prefix: Arc<String>| -> bool { starts_with(&s, &prefix) },
    );
    ctx.add_function(
        "endsWith",
        |This(s): This<Arc<String>>, suffix: Arc<String>| -> bool { ends_with(&s, &suffix) },
    );
    ctx.add_function("unique", |This(items): This<Arc<Vec<CelValue>>>| -> bool {
        unique(&items)
    });
    ctx.add_function(
        "format",
        |This(pattern): This<Arc<String>>, args: Arc<Vec<CelValue>>| -> String {
            format(&pattern, &args)
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_inf_respects_sign() {
        assert!(is_inf(f64::INFINITY, 1));
        assert!(!is_inf(f64::INFINITY, -1));
        assert!(is_inf(f64::NEG_INFINITY, -1));
        assert!(is_inf(f64::INFINITY, 0));
    }

    #[test]
    fn is_nan_detects_nan_only() {
        assert!(is_nan(f64::NAN));
        assert!(!is_nan(1.0));
    }

    #[test]
    fn unique_detects_duplicates() {
        let distinct = vec![CelValue::Int(1), CelValue::Int(2), CelValue::Int(3)];
        assert!(unique(&distinct));
        let dup = vec![CelValue::Int(1), CelValue::Int(1)];
        assert!(!unique(&dup));
    }

    #[test]
    fn format_substitutes_placeholders() {
        let args = vec![CelValue::String(Arc::new("world".to_string())), CelValue::Int(7)];
        assert_eq!(format("hello %s, %d%%", &args), "hello world, 7%");
    }

    #[test]
    fn format_reports_missing_arg() {
        assert_eq!(format("%s", &[]), "%!(MISSING)");
    }
}
