//! Helpers for pulling plain values out of D-Bus variants.

use std::collections::HashMap;

use zbus::zvariant::Value;

/// Strip nested `v` wrappers.
pub(crate) fn unwrap<'a, 'v>(value: &'a Value<'v>) -> &'a Value<'v> {
    match value {
        Value::Value(inner) => unwrap(inner),
        other => other,
    }
}

pub(crate) fn boolean(value: &Value<'_>) -> Option<bool> {
    match unwrap(value) {
        Value::Bool(flag) => Some(*flag),
        _ => None,
    }
}

pub(crate) fn string(value: &Value<'_>) -> Option<String> {
    match unwrap(value) {
        Value::Str(text) => Some(text.as_str().to_owned()),
        Value::ObjectPath(path) => Some(path.as_str().to_owned()),
        _ => None,
    }
}

/// Any unsigned or non-negative signed integer, widened.
pub(crate) fn uint(value: &Value<'_>) -> Option<u64> {
    match unwrap(value) {
        Value::U8(n) => Some(u64::from(*n)),
        Value::U16(n) => Some(u64::from(*n)),
        Value::U32(n) => Some(u64::from(*n)),
        Value::U64(n) => Some(*n),
        Value::I16(n) => u64::try_from(*n).ok(),
        Value::I32(n) => u64::try_from(*n).ok(),
        Value::I64(n) => u64::try_from(*n).ok(),
        _ => None,
    }
}

pub(crate) fn strings(value: &Value<'_>) -> Option<Vec<String>> {
    let inner = unwrap(value).try_clone().ok()?;
    Vec::<String>::try_from(inner).ok()
}

pub(crate) fn byte_map(value: &Value<'_>) -> Option<HashMap<String, u8>> {
    let inner = unwrap(value).try_clone().ok()?;
    HashMap::<String, u8>::try_from(inner).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_variants_are_unwrapped() {
        let wrapped = Value::Value(Box::new(Value::Value(Box::new(Value::Bool(true)))));
        assert_eq!(boolean(&wrapped), Some(true));
    }

    #[test]
    fn integers_widen_and_reject_negatives() {
        assert_eq!(uint(&Value::U8(7)), Some(7));
        assert_eq!(uint(&Value::U16(512)), Some(512));
        assert_eq!(uint(&Value::I32(-1)), None);
        assert_eq!(uint(&Value::from("7")), None);
    }

    #[test]
    fn string_arrays() {
        let value = Value::from(vec!["org.ofono.SimManager", "org.ofono.Modem"]);
        assert_eq!(
            strings(&value),
            Some(vec![
                "org.ofono.SimManager".to_owned(),
                "org.ofono.Modem".to_owned()
            ])
        );
    }
}
