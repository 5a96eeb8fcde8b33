//! Data steps: `transform.merge` and `echo`.

use serde_json::Value;

use super::{require_params, resolve_params};
use crate::config::merger::deep_merge;
use crate::error::Result;
use crate::steps::Step;

/// Deep-merge (interpolated) params into the input object.
///
/// A `null` input is treated as an empty object.
pub(crate) fn build_merge(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "transform.merge", params, &[])?;
    let params = params.clone();
    Ok(Step::from_fn(name, move |input, ctx| {
        let params = params.clone();
        async move {
            let overlay: Value = resolve_params(&params, &input, &ctx)?;
            let base = if input.is_null() {
                Value::Object(Default::default())
            } else {
                input
            };
            if !base.is_object() {
                anyhow::bail!("transform.merge expects an object input");
            }
            Ok(deep_merge(&base, &overlay))
        }
    }))
}

/// Pass the input through unchanged.
pub(crate) fn build_echo(name: &str, _params: &Value) -> Result<Step> {
    Ok(Step::from_fn(name, |input, _ctx| async move { Ok(input) }))
}
