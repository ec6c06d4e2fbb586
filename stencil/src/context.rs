//! Conversion of caller data into a Tera context.

use serde::Serialize;
use serde_json::Value;

use crate::error::RenderError;

/// Serializes `data` into a [`tera::Context`].
///
/// Objects contribute one variable per key; `null` (e.g. `()` or `None`)
/// yields an empty context. Anything else is rejected, since Tera has no way
/// to address a bare scalar or array.
pub fn to_context<T: Serialize + ?Sized>(data: &T) -> Result<tera::Context, RenderError> {
    let mut ctx = tera::Context::new();
    match serde_json::to_value(data)? {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                ctx.insert(key, &value);
            }
        }
        Value::Bool(_) => return Err(RenderError::InvalidData("a boolean")),
        Value::Number(_) => return Err(RenderError::InvalidData("a number")),
        Value::String(_) => return Err(RenderError::InvalidData("a string")),
        Value::Array(_) => return Err(RenderError::InvalidData("an array")),
    }
    Ok(ctx)
}
