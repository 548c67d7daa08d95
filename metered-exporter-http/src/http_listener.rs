use std::fmt::Write as _;

use http_body_util::Full;
use hyper::{
    body::{Bytes, Incoming},
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    server::conn::http1::Builder as HyperHttpBuilder,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use metered::Metrics;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tracing::{debug, error, trace, warn};

pub(crate) const NOT_FOUND_BODY: &str =
    "<!doctype html><html><body>Resource not found</body></html>";

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_HTML: &str = "text/html";
const CONTENT_TYPE_TEXT: &str = "text/plain";

pub(crate) struct HttpListeningExporter {
    metrics: Metrics,
}

impl HttpListeningExporter {
    pub(crate) fn new(metrics: Metrics) -> Self {
        HttpListeningExporter { metrics }
    }

    /// Serves connections until `shutdown` fires or its sender is dropped.
    pub(crate) async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => self.process_stream(stream),
                    Err(e) => {
                        warn!("Error accepting connection. Ignoring request. Error: {:?}", e);
                    }
                },
            }
        }

        debug!("metrics listener shutting down");
    }

    fn process_stream(&self, stream: TcpStream) {
        let metrics = self.metrics.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let metrics = metrics.clone();
            async move { Ok::<_, hyper::Error>(handle_http_request(&metrics, &req)) }
        });

        tokio::task::spawn(async move {
            if let Err(err) =
                HyperHttpBuilder::new().serve_connection(TokioIo::new(stream), service).await
            {
                error!("Error serving connection. Error: {:?}", err);
            };
        });
    }
}

pub(crate) fn handle_http_request<B>(metrics: &Metrics, req: &Request<B>) -> Response<Full<Bytes>> {
    trace!(method = %req.method(), path = req.uri().path(), "serving request");

    if req.method() != Method::GET {
        return not_found();
    }

    match req.uri().path() {
        "/" if accepts_html(req) => respond(StatusCode::OK, CONTENT_TYPE_HTML, index_page(metrics)),
        "/" | "/metrics" => render_json(metrics),
        "/ping" => respond(StatusCode::OK, CONTENT_TYPE_TEXT, "pong"),
        _ => not_found(),
    }
}

fn accepts_html<B>(req: &Request<B>) -> bool {
    req.headers()
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(CONTENT_TYPE_HTML))
}

fn render_json(metrics: &Metrics) -> Response<Full<Bytes>> {
    match metrics.to_json() {
        Ok(json) => respond(StatusCode::OK, CONTENT_TYPE_JSON, json),
        Err(e) => {
            error!(error = %e, "failed to render metrics snapshot");
            respond(StatusCode::INTERNAL_SERVER_ERROR, CONTENT_TYPE_TEXT, "")
        }
    }
}

fn not_found() -> Response<Full<Bytes>> {
    respond(StatusCode::NOT_FOUND, CONTENT_TYPE_HTML, NOT_FOUND_BODY)
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn index_page(metrics: &Metrics) -> String {
    let mut page = String::from(
        "<!doctype html><html><head><title>Metrics</title></head><body>\
         <h1>Metrics</h1><ul>\
         <li><a href=\"/metrics\">/metrics</a> - all metrics as JSON</li>\
         <li><a href=\"/ping\">/ping</a> - liveness check</li>\
         </ul><h2>Registered metrics</h2><ul>",
    );
    for (name, metric) in metrics.all_sorted() {
        let _ = write!(page, "<li>{} ({})</li>", escape_html(&name.to_string()), metric.kind());
    }
    page.push_str("</ul></body></html>");
    page
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, handle_http_request, NOT_FOUND_BODY};
    use hyper::{header::CONTENT_TYPE, Method, Request, StatusCode};
    use metered::Metrics;

    fn request(method: Method, path: &str, accept: Option<&str>) -> Request<()> {
        let builder = Request::builder().method(method).uri(path);
        let builder = match accept {
            Some(accept) => builder.header("accept", accept),
            None => builder,
        };
        builder.body(()).unwrap()
    }

    fn content_type(response: &hyper::Response<http_body_util::Full<hyper::body::Bytes>>) -> &str {
        response.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_routes() {
        let metrics = Metrics::new();

        let ping = handle_http_request(&metrics, &request(Method::GET, "/ping", None));
        assert_eq!(ping.status(), StatusCode::OK);
        assert_eq!(content_type(&ping), "text/plain");

        let json = handle_http_request(&metrics, &request(Method::GET, "/metrics", None));
        assert_eq!(json.status(), StatusCode::OK);
        assert_eq!(content_type(&json), "application/json");

        let root = handle_http_request(&metrics, &request(Method::GET, "/", None));
        assert_eq!(content_type(&root), "application/json");

        let html = handle_http_request(
            &metrics,
            &request(Method::GET, "/", Some("text/html,application/xhtml+xml")),
        );
        assert_eq!(html.status(), StatusCode::OK);
        assert_eq!(content_type(&html), "text/html");
    }

    #[test]
    fn test_not_found() {
        let metrics = Metrics::new();
        for req in [
            request(Method::GET, "/nope", None),
            request(Method::POST, "/metrics", None),
            request(Method::DELETE, "/ping", None),
        ] {
            let response = handle_http_request(&metrics, &req);
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(content_type(&response), "text/html");
        }
        assert!(NOT_FOUND_BODY.contains("Resource not found"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
