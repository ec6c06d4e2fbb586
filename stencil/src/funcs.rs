//! Function namespace types and the optional helper set.
//!
//! Functions are called from templates with named arguments:
//!
//! ```text
//! {{ plural(num=items | length, singular="item", plural="items", zero="nothing") }}
//! {% if in_array(needle=role, haystack=roles) %}…{% endif %}
//! ```
//!
//! Arity and argument types are checked at call time; a bad call surfaces as
//! an execution error of the template that made it.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tera::{Function, Value};

use crate::flash::Flashes;

/// Name → callable. Registering an existing name replaces it.
pub type FuncMap = HashMap<String, Arc<dyn Function>>;

/// Boxes a function for insertion into a [`FuncMap`].
pub fn func<F: Function + 'static>(f: F) -> Arc<dyn Function> {
    Arc::new(f)
}

/// The opt-in helper set: `plural`, `in_array`, `now`.
///
/// String helpers (`lower`, `upper`, `title`, `trim`, `split`, `join`) are
/// built into Tera as filters.
pub fn all_funcs() -> FuncMap {
    let mut map = FuncMap::new();
    map.insert("plural".to_string(), func(plural));
    map.insert("in_array".to_string(), func(in_array));
    map.insert("now".to_string(), func(now));
    map
}

fn arg<T: DeserializeOwned>(
    args: &HashMap<String, Value>,
    func: &str,
    key: &str,
) -> tera::Result<Option<T>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => tera::from_value(v.clone()).map(Some).map_err(|_| {
            tera::Error::msg(format!("function `{func}` received an invalid `{key}` argument: {v}"))
        }),
    }
}

fn required<T: DeserializeOwned>(
    args: &HashMap<String, Value>,
    func: &str,
    key: &str,
) -> tera::Result<T> {
    arg(args, func, key)?
        .ok_or_else(|| tera::Error::msg(format!("function `{func}` requires a `{key}` argument")))
}

/// `"<num> <word>"`, picking `zero` for 0 and `plural` for anything but 1
/// when those forms are given.
pub fn plural(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let num: i64 = required(args, "plural", "num")?;
    let singular: String = required(args, "plural", "singular")?;
    let plural: String = arg(args, "plural", "plural")?.unwrap_or_default();
    let zero: String = arg(args, "plural", "zero")?.unwrap_or_default();

    let word = if num == 0 && !zero.is_empty() {
        zero
    } else if num != 1 && !plural.is_empty() {
        plural
    } else {
        singular
    };
    Ok(Value::String(format!("{num} {word}")))
}

/// Whether `haystack` is an array containing `needle`. Non-arrays are `false`.
pub fn in_array(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let needle: Value = required(args, "in_array", "needle")?;
    let found = match args.get("haystack") {
        Some(Value::Array(items)) => items.contains(&needle),
        _ => false,
    };
    Ok(Value::Bool(found))
}

/// Current local time, RFC 3339 unless a strftime `format` is given.
pub fn now(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let now = chrono::Local::now();
    let Some(format) = arg::<String>(args, "now", "format")? else {
        return Ok(Value::String(now.to_rfc3339()));
    };
    let mut out = String::new();
    write!(out, "{}", now.format(&format))
        .map_err(|_| tera::Error::msg(format!("function `now` received an invalid format: {format}")))?;
    Ok(Value::String(out))
}

/// Stand-in for the layout hook; only a layout render provides the body.
pub(crate) fn hook_stub(hook: &str) -> Arc<dyn Function> {
    let hook = hook.to_string();
    func(move |_: &HashMap<String, Value>| -> tera::Result<Value> {
        Err(tera::Error::msg(format!(
            "{hook} called unexpectedly; embed the body with {{{{ {hook} }}}} in a layout"
        )))
    })
}

/// `flash(category="error")` takes one category; `flash()` takes all.
pub(crate) fn flash_func(flashes: Flashes) -> Arc<dyn Function> {
    func(move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let category: String = arg(args, "flash", "category")?.unwrap_or_default();
        let msgs = if category.is_empty() {
            flashes.all()
        } else {
            flashes.get(&category)
        };
        Ok(tera::to_value(msgs)?)
    })
}
