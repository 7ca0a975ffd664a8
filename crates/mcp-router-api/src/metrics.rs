//! Router metrics in Prometheus text exposition format.
//!
//! Counters and histograms are kept in label-keyed maps behind short-lived
//! locks; rendering walks them in sorted label order so the output is
//! stable between scrapes.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use mcp_router_core::{BackendId, CallOutcome, Catalog};
use mcp_router_gateway::{FailoverError, RefreshReport};
use parking_lot::Mutex;

use crate::state::AppState;

/// Content type of the exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Upper bounds (ms) of the HTTP duration histogram buckets
pub const HTTP_DURATION_BUCKETS_MS: [f64; 9] =
    [10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0];

/// `tool` label for names neither backend advertises
pub const UNKNOWN_TOOL: &str = "unknown";

/// `method` label for anything outside [`STANDARD_METHODS`]
pub const OTHER_METHOD: &str = "OTHER";

const STANDARD_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct HttpLabels {
    route: String,
    method: String,
    status: u16,
}

#[derive(Debug, Default)]
struct HttpSeries {
    requests: u64,
    /// Non-cumulative counts per bucket; overflow is `requests - sum(buckets)`
    buckets: [u64; HTTP_DURATION_BUCKETS_MS.len()],
    sum_ms: f64,
}

impl HttpSeries {
    fn observe(&mut self, ms: f64) {
        self.requests += 1;
        self.sum_ms += ms;
        if let Some(idx) = HTTP_DURATION_BUCKETS_MS.iter().position(|&b| ms <= b) {
            self.buckets[idx] += 1;
        }
    }
}

/// Registry of every metric the router exports
#[derive(Debug, Default)]
pub struct Metrics {
    http: Mutex<BTreeMap<HttpLabels, HttpSeries>>,
    tool_calls: Mutex<BTreeMap<String, u64>>,
    /// (backend, outcome) -> count
    backend_calls: Mutex<BTreeMap<(&'static str, &'static str), u64>>,
    /// (from, to) -> count
    failovers: Mutex<BTreeMap<(&'static str, &'static str), u64>>,
    catalog_tools: Mutex<BTreeMap<&'static str, usize>>,
    refresh_failures: Mutex<BTreeMap<&'static str, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished HTTP request
    pub fn record_http(&self, route: &str, method: &str, status: u16, elapsed: Duration) {
        let method = if STANDARD_METHODS.contains(&method) {
            method
        } else {
            OTHER_METHOD
        };
        let labels = HttpLabels {
            route: route.to_string(),
            method: method.to_string(),
            status,
        };
        self.http
            .lock()
            .entry(labels)
            .or_default()
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Record a tool call request, before it is routed.
    ///
    /// Names absent from both halves of `catalog` share the
    /// [`UNKNOWN_TOOL`] series so callers cannot mint new label values.
    pub fn record_tool_call(&self, tool: &str, catalog: &Catalog) {
        let known = BackendId::ALL
            .into_iter()
            .any(|backend| catalog.contains(backend, tool));
        let label = if known { tool } else { UNKNOWN_TOOL };
        *self.tool_calls.lock().entry(label.to_string()).or_insert(0) += 1;
    }

    /// Record the backend attempts behind a successful routed call
    pub fn record_outcome(&self, outcome: &CallOutcome) {
        if let Some(failover) = &outcome.failover {
            self.backend_call(failover.from, false);
            self.failover(failover.from, outcome.backend);
        }
        self.backend_call(outcome.backend, true);
    }

    /// Record the backend attempts behind a routed call that failed everywhere
    pub fn record_failure(&self, err: &FailoverError) {
        self.backend_call(err.primary.backend, false);
        self.failover(err.primary.backend, err.fallback.backend);
        self.backend_call(err.fallback.backend, false);
    }

    /// Record one catalog refresh round
    pub fn record_refresh(&self, report: &RefreshReport, catalog: &Catalog) {
        let mut tools = self.catalog_tools.lock();
        let mut failures = self.refresh_failures.lock();
        for backend in BackendId::ALL {
            tools.insert(backend.as_str(), catalog.tools(backend).len());
            let entry = failures.entry(backend.as_str()).or_insert(0);
            if report.get(backend).is_err() {
                *entry += 1;
            }
        }
    }

    fn backend_call(&self, backend: BackendId, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        *self
            .backend_calls
            .lock()
            .entry((backend.as_str(), outcome))
            .or_insert(0) += 1;
    }

    fn failover(&self, from: BackendId, to: BackendId) {
        *self
            .failovers
            .lock()
            .entry((from.as_str(), to.as_str()))
            .or_insert(0) += 1;
    }

    /// Export as Prometheus format
    pub fn render(&self) -> String {
        let mut out = String::new();

        header(&mut out, "http_requests_total", "Total HTTP requests", "counter");
        let http = self.http.lock();
        for (labels, series) in http.iter() {
            let _ = writeln!(
                out,
                "http_requests_total{{{}}} {}",
                http_labels(labels),
                series.requests
            );
        }
        out.push('\n');

        header(
            &mut out,
            "http_request_duration_ms",
            "HTTP request duration in ms",
            "histogram",
        );
        for (labels, series) in http.iter() {
            let base = http_labels(labels);
            let mut cumulative = 0;
            for (bound, count) in HTTP_DURATION_BUCKETS_MS.iter().zip(series.buckets) {
                cumulative += count;
                let _ = writeln!(
                    out,
                    "http_request_duration_ms_bucket{{{},le=\"{}\"}} {}",
                    base, bound, cumulative
                );
            }
            let _ = writeln!(
                out,
                "http_request_duration_ms_bucket{{{},le=\"+Inf\"}} {}",
                base, series.requests
            );
            let _ = writeln!(out, "http_request_duration_ms_sum{{{}}} {}", base, series.sum_ms);
            let _ = writeln!(
                out,
                "http_request_duration_ms_count{{{}}} {}",
                base, series.requests
            );
        }
        drop(http);
        out.push('\n');

        header(&mut out, "mcp_tool_calls_total", "Total MCP tool calls", "counter");
        for (tool, n) in self.tool_calls.lock().iter() {
            let _ = writeln!(out, "mcp_tool_calls_total{{tool=\"{}\"}} {}", escape(tool), n);
        }
        out.push('\n');

        header(
            &mut out,
            "mcp_backend_calls_total",
            "Backend call attempts by outcome",
            "counter",
        );
        for ((backend, outcome), n) in self.backend_calls.lock().iter() {
            let _ = writeln!(
                out,
                "mcp_backend_calls_total{{backend=\"{}\",outcome=\"{}\"}} {}",
                backend, outcome, n
            );
        }
        out.push('\n');

        header(
            &mut out,
            "mcp_failovers_total",
            "Calls retried on the alternate backend",
            "counter",
        );
        for ((from, to), n) in self.failovers.lock().iter() {
            let _ = writeln!(
                out,
                "mcp_failovers_total{{from=\"{}\",to=\"{}\"}} {}",
                from, to, n
            );
        }
        out.push('\n');

        header(
            &mut out,
            "mcp_catalog_tools",
            "Tools advertised per backend in the current catalog",
            "gauge",
        );
        for (backend, n) in self.catalog_tools.lock().iter() {
            let _ = writeln!(out, "mcp_catalog_tools{{backend=\"{}\"}} {}", backend, n);
        }
        out.push('\n');

        header(
            &mut out,
            "mcp_catalog_refresh_failures_total",
            "Failed catalog listings per backend",
            "counter",
        );
        for (backend, n) in self.refresh_failures.lock().iter() {
            let _ = writeln!(
                out,
                "mcp_catalog_refresh_failures_total{{backend=\"{}\"}} {}",
                backend, n
            );
        }

        out
    }
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn http_labels(labels: &HttpLabels) -> String {
    format!(
        "route=\"{}\",method=\"{}\",status=\"{}\"",
        escape(&labels.route),
        escape(&labels.method),
        labels.status
    )
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Axum middleware recording count and latency per matched route
pub async fn track_http(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    state
        .metrics()
        .record_http(&route, &method, response.status().as_u16(), started.elapsed());
    response
}
