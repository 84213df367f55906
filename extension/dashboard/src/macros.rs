#[macro_export]
macro_rules! map_err_to_anyhow {
    ($e:expr) => {
        match $e {
            Ok(i) => Ok(i),
            Err(e) => Err(::anyhow::anyhow!(
                "{}",
                e.as_string()
                    .unwrap_or_else(|| "no error message".to_string())
            )),
        }
    };
}

#[macro_export]
macro_rules! map_err_from_anyhow {
    ($e:expr) => {
        match $e {
            Ok(i) => Ok(i),
            Err(e) => Err(JsValue::from_str(&format!("{:#}", e))),
        }
    };
}

// https://veykril.github.io/tlborm/decl-macros/patterns/repetition-replacement.html
macro_rules! replace_expr {
    ($_t:tt $sub:ident) => {
        $sub
    };
}

/// Exposes an async function on `window` that resolves to the JSON form of its result.
///
/// Arguments are decoded from their JS representation with serde, a failing body rejects the
/// promise with the `{:#}` rendering of the error.
#[macro_export]
macro_rules! impl_window {
    ($window: ident, async fn $fn_name:ident( $( $arg_name: ident: $arg_type: ty ),* ) -> $return_type: ty $body: block) => {{
        let handler = Closure::wrap(Box::new(|$($arg_name: JsValue),*| {
            let future = async move {
                $(
                    let $arg_name = $arg_name
                        .into_serde::<$arg_type>()
                        .with_context(|| format!("invalid argument `{}`", stringify!($arg_name)))?;
                )*

                $body
            };

            let future = future
                .map(|result: $return_type| -> anyhow::Result<JsValue> {
                    let ok = result?;
                    log::debug!("successfully invoked {}", stringify!($fn_name));

                    JsValue::from_serde(&ok).context("failed to serialize result")
                })
                .map_err(|e: anyhow::Error| JsValue::from_str(&format!("{:#}", e)));

            future_to_promise(future)
        }) as Box<dyn Fn($(replace_expr!($arg_name JsValue)),*) -> Promise>);

        map_err_to_anyhow!(js_sys::Reflect::set(
            &$window,
            &JsValue::from_str(stringify!($fn_name)),
            &handler.into_js_value(),
        ))
        .with_context(|| format!("failed to expose {} on window", stringify!($fn_name)))
    }};
}
