// src/server/assets.rs

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use mime_guess::mime;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, warn};

use super::{CLIENT_PATH, EVENTS_PATH, ServerState};

static BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("static regex"));

const CLIENT_SCRIPT: &str = r#"(function () {
  var source = new EventSource("__EVENTS__");
  source.addEventListener("reload", function () {
    window.location.reload();
  });
  source.addEventListener("css", function () {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var stamp = Date.now();
    for (var i = 0; i < links.length; i++) {
      var url = new URL(links[i].href, window.location.href);
      url.searchParams.set("sitepipe", stamp);
      links[i].href = url.toString();
    }
  });
})();
"#;

pub(crate) async fn client_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_SCRIPT.replace("__EVENTS__", EVENTS_PATH),
    )
        .into_response()
}

/// Serve a file under the server root. `/` maps to the configured index and
/// directories map to their `index.html`. HTML gets the client script.
pub(crate) async fn serve_static(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let request_path = uri.path();
    let relative = if request_path == "/" {
        state.index.trim_start_matches('/').to_string()
    } else {
        match decode_path(request_path.trim_start_matches('/')) {
            Some(decoded) => decoded,
            None => return not_found(),
        }
    };

    let Some(mut path) = resolve(&state.root, &relative) else {
        debug!(path = %request_path, "rejected request path");
        return not_found();
    };
    if path.is_dir() {
        path = path.join("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = content_type_for(&path);
            let body = if content_type.starts_with("text/html") {
                inject_client(&String::from_utf8_lossy(&bytes)).into_bytes()
            } else {
                bytes
            };
            (
                [
                    (header::CONTENT_TYPE, content_type.as_str()),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response()
        }
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            debug!(?path, "no such file");
            not_found()
        }
        Err(err) => {
            warn!(?path, error = %err, "failed to read file");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

/// Insert the client script tag before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match BODY_CLOSE.find_iter(html).last() {
        Some(found) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..found.start()]);
            out.push_str(&tag);
            out.push_str(&html[found.start()..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

/// Join a request path onto `root`, refusing anything that escapes it.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(path)
}

/// Percent-decode a request path; invalid UTF-8 is rejected.
fn decode_path(input: &str) -> Option<String> {
    percent_decode_str(input)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Content type for `path`; text types carry a UTF-8 charset.
fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let is_text = mime.type_() == mime::TEXT
        || mime.subtype() == mime::JAVASCRIPT
        || mime.subtype() == mime::JSON;
    if is_text && mime.get_param(mime::CHARSET).is_none() {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}
