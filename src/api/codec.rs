//! JSON <-> typed value mapping for the HTTP surface.
//!
//! Incoming JSON is stored under the most specific typed representation the
//! typed view knows, so in-process callers reading through `TypedView` see
//! the same values HTTP clients wrote.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{AnyValue, StringMap, TypedView, ValueMap, ValueMapList};

/// Stores a JSON value under `key`.
///
/// - string → `String`
/// - integer → `i64`
/// - array of strings → `Vec<String>`
/// - array of objects → `ValueMapList`
/// - object of strings → `StringMap`
/// - any other object → `ValueMap`
/// - anything else → raw `Value`
pub fn store_json(view: &TypedView, key: &str, value: Value, ttl: Duration) {
    match value {
        Value::String(s) => view.set_string(key, s, ttl),
        Value::Number(n) => match n.as_i64() {
            Some(i) => view.set_int(key, i, ttl),
            None => view.store().set(key, Value::Number(n), ttl),
        },
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let strings = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            view.set_string_list(key, strings, ttl);
        }
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let maps: ValueMapList = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map.into_iter().collect()),
                    _ => None,
                })
                .collect();
            view.set_value_map_list(key, maps, ttl);
        }
        Value::Object(map) if map.values().all(Value::is_string) => {
            let strings: StringMap = map
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect();
            view.set_string_map(key, strings, ttl);
        }
        Value::Object(map) => view.set_value_map(key, map.into_iter().collect(), ttl),
        other => view.store().set(key, other, ttl),
    }
}

/// Renders a stored value as JSON, or `None` when it holds a type the HTTP
/// surface does not know.
pub fn render_json(value: &AnyValue) -> Option<Value> {
    render_as::<String>(value)
        .or_else(|| render_as::<i64>(value))
        .or_else(|| render_as::<StringMap>(value))
        .or_else(|| render_as::<ValueMap>(value))
        .or_else(|| render_as::<ValueMapList>(value))
        .or_else(|| render_as::<Vec<String>>(value))
        .or_else(|| render_as::<Value>(value))
}

fn render_as<T>(value: &AnyValue) -> Option<Value>
where
    T: Serialize + 'static,
{
    value
        .downcast_ref::<T>()
        .and_then(|typed| serde_json::to_value(typed).ok())
}
