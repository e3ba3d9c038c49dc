//! MCP (Model Context Protocol) server for crawl-topology.
//!
//! Exposes every report derivation in `ops` as an MCP tool so that AI
//! assistants (Claude Desktop, Cursor, etc.) can invoke them over stdio
//! JSON-RPC. The server keeps one `ReportView`: consecutive calls with the
//! same report reuse its cached derivations.
//!
//! Start with: `crawl-topology --mcp`

use std::sync::{Arc, Mutex};

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::ops;
use crate::session::ReportView;

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportParams {
    /// Crawl report: an object with a `pages` array (and optionally
    /// `jobId` and `linkAnalysis`), or a bare array of pages.
    pub report: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThresholdParams {
    /// Crawl report JSON.
    pub report: Value,
    /// Minimum similarity percentage, 0-100 (default: 40).
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OverlapParams {
    /// Crawl report JSON.
    pub report: Value,
    /// URL of the first page.
    pub url_a: String,
    /// URL of the second page.
    pub url_b: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HighlightParams {
    /// Crawl report JSON.
    pub report: Value,
    /// Page whose text is returned.
    pub url: String,
    /// Page it is compared against.
    pub other: String,
    /// Number of shared phrases to mark (default: 10).
    pub phrases: Option<usize>,
    /// Number of shared words to mark (default: 20).
    pub words: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Crawl report JSON.
    pub report: Value,
    /// Keyword or multi-word phrase. Empty asks for a term.
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdviseParams {
    /// Crawl report JSON.
    pub report: Value,
    /// Only this URL (default: every URL in the link analysis).
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KeywordsParams {
    /// Crawl report JSON.
    pub report: Value,
    /// Number of keywords to return (default: 20).
    pub top: Option<usize>,
    /// Only this page's keywords.
    pub url: Option<String>,
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn json_text(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server struct: the tool router plus the session's report view.
#[derive(Clone)]
pub struct CrawlTopologyMcp {
    session: Arc<Mutex<ReportView>>,
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
}

impl Default for CrawlTopologyMcp {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl CrawlTopologyMcp {
    /// Load `report` into the session view and run `op` against it on the
    /// blocking pool.
    async fn with_report<F>(&self, report: Value, op: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&mut ReportView) -> Result<Value, AnalyticsError> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        let result = tokio::task::spawn_blocking(move || {
            // a panic mid-derivation leaves only caches behind; keep serving
            let mut view = session.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            ops::reload(&mut view, &report);
            op(&mut view)
        })
        .await
        .map_err(|e| McpError::internal_error(format!("task join error: {e}"), None))?
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }
}

#[tool_router]
impl CrawlTopologyMcp {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(ReportView::new(Default::default(), config))),
            tool_router: Self::tool_router(),
        }
    }

    // ── duplicates ──────────────────────────────────────────────────────

    #[tool(
        name = "duplicates",
        description = "Group pages the crawler flagged as exact duplicates. Pages are grouped by the sorted union of their URL and `duplicateUrls`. Returns each group's key, member URLs, and page summaries (url, title, wordCount, statusCode)."
    )]
    async fn duplicates(&self, params: Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.with_report(p.report, |view| Ok(ops::op_duplicates(view)))
            .await
    }

    // ── similar_pages ───────────────────────────────────────────────────

    #[tool(
        name = "similar_pages",
        description = "List near-duplicate page pairs from the crawler's similarity scores, strongest first. Each unordered pair appears once with urlA < urlB, its similarity percentage, and a level (exact >= 95, high >= 80, moderate >= 60, low)."
    )]
    async fn similar_pages(
        &self,
        params: Parameters<ThresholdParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let threshold = p.threshold;
        self.with_report(p.report, move |view| ops::op_similar(view, threshold))
            .await
    }

    // ── similarity_clusters ─────────────────────────────────────────────

    #[tool(
        name = "similarity_clusters",
        description = "Merge similar page pairs into connected clusters (transitive). Returns each cluster's URLs, its strongest similarity, and level."
    )]
    async fn similarity_clusters(
        &self,
        params: Parameters<ThresholdParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let threshold = p.threshold;
        self.with_report(p.report, move |view| ops::op_clusters(view, threshold))
            .await
    }

    // ── overlap ─────────────────────────────────────────────────────────

    #[tool(
        name = "overlap",
        description = "Shared content of two pages: common words (with the smaller of the two counts), common 2-4 word phrases (longest first, at most 20), and the total common word count."
    )]
    async fn overlap(&self, params: Parameters<OverlapParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let (a, b) = (p.url_a, p.url_b);
        self.with_report(p.report, move |view| ops::op_overlap(view, &a, &b))
            .await
    }

    // ── highlight ───────────────────────────────────────────────────────

    #[tool(
        name = "highlight",
        description = "Return a page's text with the phrases and words it shares with another page wrapped in <mark> tags. Phrases are marked first, longest first; words never nest inside a marked phrase."
    )]
    async fn highlight(
        &self,
        params: Parameters<HighlightParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let (url, other, phrases, words) = (p.url, p.other, p.phrases, p.words);
        self.with_report(p.report, move |view| {
            ops::op_highlight(view, &url, &other, phrases, words)
        })
        .await
    }

    // ── search ──────────────────────────────────────────────────────────

    #[tool(
        name = "search",
        description = "Case-insensitive keyword or phrase search over full page text. A single word matches on word boundaries; several words match as a literal phrase. Returns pages with a non-zero count, most occurrences first, with density as a percentage of word count."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let term = p.term;
        self.with_report(p.report, move |view| Ok(ops::op_search(view, &term)))
            .await
    }

    // ── score ───────────────────────────────────────────────────────────

    #[tool(
        name = "score",
        description = "Site performance score (0-100) and letter grade from aggregated findings (heavy images, slow assets, slow sections, slow components, render-blocking resources), with a status per issue category and the distribution of per-page grades."
    )]
    async fn score(&self, params: Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.with_report(p.report, |view| Ok(ops::op_score(view)))
            .await
    }

    // ── advise ──────────────────────────────────────────────────────────

    #[tool(
        name = "advise",
        description = "Link-structure recommendations from the crawler's link analysis: orphan pages, weak backlinks, missing or excessive outgoing links, low-power linking pages. Pages with no issue get a single confirmation."
    )]
    async fn advise(&self, params: Parameters<AdviseParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let url = p.url;
        self.with_report(p.report, move |view| Ok(ops::op_advise(view, url.as_deref())))
            .await
    }

    // ── keywords ────────────────────────────────────────────────────────

    #[tool(
        name = "keywords",
        description = "Rank upstream keyword analysis. Without `url`: keywords merged across pages by total count. With `url`: that page's keywords by tf-idf."
    )]
    async fn keywords(
        &self,
        params: Parameters<KeywordsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let (top, url) = (p.top, p.url);
        self.with_report(p.report, move |view| {
            ops::op_keywords(view, top, url.as_deref())
        })
        .await
    }

    // ── summary ─────────────────────────────────────────────────────────

    #[tool(
        name = "summary",
        description = "One-shot overview: page count, duplicate groups, similar pairs, site performance, orphan and hub pages, and page power distribution."
    )]
    async fn summary(&self, params: Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.with_report(p.report, |view| Ok(ops::op_summary(view)))
            .await
    }
}

// ── ServerHandler glue ──────────────────────────────────────────────────────

impl ServerHandler for CrawlTopologyMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Crawl report analytics. Tools: duplicates, similar_pages, \
                 similarity_clusters, overlap, highlight, search, score, advise, \
                 keywords, summary. Every tool takes the crawl report JSON as \
                 `report`; repeated calls with the same report reuse cached results."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "crawl-topology".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Crawl Topology".into()),
                description: Some(
                    "Duplicate clusters, content overlap, keyword search, and grading for crawl reports"
                        .into(),
                ),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio() -> Result<(), Box<dyn std::error::Error>> {
    let server = CrawlTopologyMcp::default();
    tracing::info!("serving MCP on stdio");
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        eprintln!("MCP serve error: {e}");
    })?;
    service.waiting().await?;
    Ok(())
}
