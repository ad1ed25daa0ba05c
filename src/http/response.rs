//! Canned response emission.
//!
//! # Responsibilities
//! - Merge global and per-rule headers
//! - Set the resolved status
//! - Attach a literal body, a streamed file, or nothing
//!
//! # Design Decisions
//! - Per-rule headers replace global headers of the same name, keeping all values
//! - Literal body wins over file
//! - An unreadable file is reported, the status and headers still go out

use std::path::Path;

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::TryStreamExt;
use tokio_util::io::ReaderStream;

use crate::observability::metrics;
use crate::routing::ResponseDefinition;

/// Build the response for a resolved definition.
pub async fn emit(global_headers: &HeaderMap, definition: &ResponseDefinition) -> Response {
    let mut headers = HeaderMap::new();
    apply_headers(&mut headers, global_headers);
    apply_headers(&mut headers, &definition.headers);

    let body = if let Some(body) = &definition.body {
        Body::from(body.clone())
    } else if let Some(path) = &definition.file {
        file_body(path).await
    } else {
        Body::empty()
    };

    let mut response = Response::new(body);
    *response.status_mut() = definition.status;
    *response.headers_mut() = headers;
    response
}

/// Replace every header named in `layer`, appending all of its values.
fn apply_headers(target: &mut HeaderMap, layer: &HeaderMap) {
    for name in layer.keys() {
        target.remove(name);
        for value in layer.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

async fn file_body(path: &Path) -> Body {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(error) => {
            metrics::record_file_error();
            tracing::error!(
                path = %path.display(),
                error = %error,
                "Failed to open response file, sending empty body"
            );
            return Body::empty();
        }
    };

    let path = path.to_path_buf();
    let stream = ReaderStream::new(file).inspect_err(move |error| {
        metrics::record_file_error();
        tracing::error!(
            path = %path.display(),
            error = %error,
            "Failed while streaming response file"
        );
    });
    Body::from_stream(stream)
}
