use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    pin::pin,
    sync::Once,
};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use futures_util::{FutureExt, future::poll_fn};

use crate::{
    config::AppConfig,
    error::{ServerError, status_text_response},
    middleware::headers::set_security_headers,
};

thread_local! {
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
    // Set while this thread is polling a request inside `recover_panic`.
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// install_panic_hook
///
/// Chains a hook in front of the current one that records the backtrace of the panicking
/// thread, so `recover_panic` can log where the panic happened instead of where it was
/// caught. Panics that `recover_panic` will catch are not passed on to the previous hook;
/// they are logged once, through `tracing`. Safe to call more than once.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.get() {
                let trace = Backtrace::force_capture().to_string();
                PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            } else {
                previous(info);
            }
        }));
    });
}

/// recover_panic
///
/// The outermost layer of every route. A panic anywhere below it is answered with a 500 and
/// `Connection: close`; a handler error carrying a `ServerError` is logged here with the
/// request's method and URI. In debug mode the client also gets the message and trace.
pub async fn recover_panic(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let mut guarded = pin!(AssertUnwindSafe(next.run(request)).catch_unwind());
    let outcome = poll_fn(|cx| {
        let outer = CONTAINED.replace(true);
        let poll = guarded.as_mut().poll(cx);
        CONTAINED.set(outer);
        poll
    })
    .await;

    match outcome {
        Ok(mut response) => {
            let Some(err) = response.extensions_mut().remove::<ServerError>() else {
                return response;
            };
            tracing::error!(%method, %uri, trace = %err.trace, "{}", err.message);
            if config.debug {
                response = with_debug_body(response, &err);
            }
            response
        }
        Err(payload) => {
            let trace = PANIC_TRACE
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(|| Backtrace::force_capture().to_string());
            let err = ServerError {
                message: panic_message(payload.as_ref()),
                trace,
            };
            tracing::error!(%method, %uri, trace = %err.trace, "panic: {}", err.message);

            let mut response = status_text_response(StatusCode::INTERNAL_SERVER_ERROR);
            if config.debug {
                response = with_debug_body(response, &err);
            }
            let headers = response.headers_mut();
            set_security_headers(headers);
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
            response
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Keeps status and headers, swaps the body for `message\ntrace`.
fn with_debug_body(response: Response, err: &ServerError) -> Response {
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    let body = Body::from(format!("{}\n{}", err.message, err.trace));
    Response::from_parts(parts, body)
}
