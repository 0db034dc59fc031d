// ABOUTME: Post-deploy HTTP check against a URL exposed by the stack.
// ABOUTME: Polls until the response body contains the expected text.

use http_body_util::BodyExt;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::{Stack, UrlCheckerConfig, interpolate, resolve_env_map};
use crate::poll::{PollError, Poller, Step};

use super::error::DeployError;

/// Poll the stack's `url_checker` until the body contains the expected text.
///
/// Request failures count as "not yet" and are retried until the check's
/// timeout; the last failure is reported if it never passes.
pub async fn check_url(stack: &Stack, checker: &UrlCheckerConfig) -> Result<(), DeployError> {
    let env = resolve_env_map(&stack.env)?;
    let url = interpolate(&checker.check_url, &env)?;
    let expect = interpolate(&checker.expect, &env)?;

    let uri: Uri = url.parse().map_err(|e| DeployError::Misconfigured {
        stack: stack.name.clone(),
        reason: format!("invalid check_url {url:?}: {e}"),
    })?;
    if uri.scheme_str() != Some("http") || uri.host().is_none() {
        return Err(DeployError::Misconfigured {
            stack: stack.name.clone(),
            reason: format!("check_url {url:?} must be an http:// URL with a host"),
        });
    }

    tracing::info!(stack = %stack.name, %url, "checking url");
    let last_problem = Mutex::new(String::from("no response yet"));
    let poller = Poller::new(checker.interval).timeout(checker.timeout);

    let checked = poller
        .until(&format!("checking {url}"), |_| {
            let (uri, expect, last_problem) = (&uri, &expect, &last_problem);
            async move {
                let problem = match fetch(uri, checker.request_timeout).await {
                    Ok(body) if body.contains(expect.as_str()) => return Ok(Step::Done(())),
                    Ok(body) => format!("body did not contain {expect:?} (got {} bytes)", body.len()),
                    Err(e) => e,
                };
                tracing::debug!(%uri, %problem, "url not ready");
                *last_problem.lock() = problem;
                Ok::<_, DeployError>(Step::Pending)
            }
        })
        .await;

    match checked {
        Ok(()) => {
            tracing::info!(stack = %stack.name, %url, "url check passed");
            Ok(())
        }
        Err(DeployError::Poll(PollError::TimedOut { .. })) => Err(DeployError::UrlCheck {
            stack: stack.name.clone(),
            reason: last_problem.into_inner(),
        }),
        Err(e) => Err(e),
    }
}

/// GET the uri over plain HTTP/1 and return the body as text.
async fn fetch(uri: &Uri, request_timeout: Duration) -> Result<String, String> {
    tokio::time::timeout(request_timeout, fetch_inner(uri))
        .await
        .map_err(|_| format!("request timed out after {}s", request_timeout.as_secs()))?
}

async fn fetch_inner(uri: &Uri) -> Result<String, String> {
    let host = uri.host().ok_or_else(|| format!("{uri} has no host"))?;
    let port = uri.port_u16().unwrap_or(80);

    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| format!("failed to connect to {host}:{port}: {e}"))?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| format!("HTTP handshake failed: {e}"))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("url check connection error: {}", e);
        }
    });

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let authority = uri.authority().map(|a| a.as_str()).unwrap_or(host);
    let req = hyper::Request::builder()
        .uri(path)
        .header("Host", authority)
        .body(http_body_util::Empty::<bytes::Bytes>::new())
        .map_err(|e| format!("failed to build request: {e}"))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("failed to read response: {e}"))?
        .to_bytes();

    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
