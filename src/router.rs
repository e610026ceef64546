use tracing::{debug, warn};

use crate::request::{Method, Request};
use crate::resource::{MediaType, Resource};
use crate::response::{Response, Status};

const GREET_SEGMENT: &str = "greet";

/// Routes a decoded request to the root page, the greet resource, or 404.
///
/// Pure function of the request and the configured resource; only `GET` is
/// served and anything unrecognized falls back to [`Response::not_found`].
pub fn handle(req: &Request, resource: &Resource) -> Response {
    match (req.method(), req.target()) {
        (Method::Get, "/") => root(resource),
        (Method::Get, target) => {
            greet(target, req.header("accept"), resource).unwrap_or_else(Response::not_found)
        }
        (method, target) => {
            debug!(%method, target, "unsupported method.");
            Response::not_found()
        }
    }
}

/// Picks the greet representation from an `Accept` header.
///
/// XML is chosen only when `application/xml` is present and
/// `application/json` is absent. Everything else, including a missing
/// header, gets JSON.
pub fn negotiate(accept: Option<&str>) -> MediaType {
    let accept = accept.unwrap_or_default().to_ascii_lowercase();
    if accept.contains(MediaType::Xml.mime()) && !accept.contains(MediaType::Json.mime()) {
        MediaType::Xml
    } else {
        MediaType::Json
    }
}

fn root(resource: &Resource) -> Response {
    let html = format!(
        "<html><body><h1>Halo, dunia! Aku {}</h1></body></html>",
        resource.name
    );
    Response::builder()
        .with_status(Status::OK)
        .as_html()
        .with_body(html)
}

fn greet(target: &str, accept: Option<&str>, resource: &Resource) -> Option<Response> {
    let target = target.split('#').next().unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let mut segments = path.strip_prefix('/').unwrap_or(path).split('/');
    if segments.next() != Some(GREET_SEGMENT) || segments.next() != Some(resource.id.as_str()) {
        debug!(path, "no route matched.");
        return None;
    }

    let caller = get_query_param(query, "name");
    let caller = caller.as_deref().map(|name| name.trim_matches('"'));
    let media = negotiate(accept);
    let body = match resource.greet(caller).render(media) {
        Ok(body) => body,
        Err(error) => {
            warn!(%error, "failed to render greeting.");
            return None;
        }
    };
    Some(
        Response::builder()
            .with_status(Status::OK)
            .with_content_type(media.mime())
            .with_body(body),
    )
}

/// First value of `key` in a form-urlencoded query string.
fn get_query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
