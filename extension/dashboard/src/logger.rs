use anyhow::{Context, Result};
use web_sys::window;

pub const LOG_LEVEL_KEY: &str = "dashboard_log";

/// Enables console logging if a level is stored under [`LOG_LEVEL_KEY`].
///
/// An unset key leaves logging off. A value that is not a log level is an error.
pub fn try_init() -> Result<()> {
    let local_storage = map_err_to_anyhow!(window()
        .context("failed to access window object")?
        .local_storage())?
    .context("no local storage available")?;

    let level = match map_err_to_anyhow!(local_storage.get_item(LOG_LEVEL_KEY))? {
        Some(level) => level
            .parse::<log::Level>()
            .with_context(|| format!("invalid `{}` log level '{}'", LOG_LEVEL_KEY, level))?,
        None => return Ok(()),
    };

    wasm_logger::init(wasm_logger::Config::new(level));

    Ok(())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn unknown_level_is_rejected() {
        let local_storage = window().unwrap().local_storage().unwrap().unwrap();
        local_storage.set_item(LOG_LEVEL_KEY, "loud").unwrap();

        let result = try_init();

        local_storage.remove_item(LOG_LEVEL_KEY).unwrap();
        assert!(result.is_err());
    }

    #[wasm_bindgen_test]
    fn missing_level_leaves_logging_off() {
        let local_storage = window().unwrap().local_storage().unwrap().unwrap();
        local_storage.remove_item(LOG_LEVEL_KEY).unwrap();

        assert!(try_init().is_ok());
    }
}
