//! Manifest rendering
//!
//! Templates use minijinja syntax (`{{ }}`, `{% %}`) with undefined values
//! treated as errors. The render context is the serialized `TenantConfig`;
//! unset spec fields are absent from it.

use minijinja::{Environment, UndefinedBehavior, Value};
use tracing::debug;

use super::config::TenantConfig;
use super::filters;
use super::source::DocumentSource;
use crate::error::{TenantError, TenantResult};

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);

    env.add_filter("gi", filters::gi);
    env.add_filter("mi", filters::mi);
    env.add_filter("milli", filters::milli);
    env.add_filter("quote", filters::quote);

    env
}

/// Render `template` with `config`.
pub fn render(template: &str, config: &TenantConfig) -> TenantResult<String> {
    let env = environment();
    let rendered = env.render_str(template, Value::from_serialize(config))?;
    Ok(rendered)
}

/// Fetch the template at `path` and render it with `config`.
pub async fn generate(
    path: &str,
    source: &dyn DocumentSource,
    config: &TenantConfig,
) -> TenantResult<Vec<u8>> {
    let raw = source.read(path).await?;
    let template = String::from_utf8(raw)
        .map_err(|e| TenantError::DecodeError(format!("{}: {}", path, e)))?;

    let rendered = render(&template, config)?;

    debug!(username = %config.username, path = %path, bytes = rendered.len(), "Rendered manifest");
    Ok(rendered.into_bytes())
}
