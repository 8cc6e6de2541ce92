//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes trend analysis over stdio so AI assistants can query it. The
//! server wraps the same core library the CLI commands use; each `#[tool]`
//! method delegates to core functions.
//!
//! Two kinds of tools exist:
//!
//! - Stateless tools (`analyze_trends`, `classify_text`, `model_scores`)
//!   work on the cards passed in the call.
//! - `refresh_trends` fetches cards from the configured API and commits the
//!   result through a [`RefreshCoordinator`]; `latest_trends` returns the
//!   last committed snapshot. Overlapping refreshes are resolved by
//!   generation, so a superseded refresh never replaces a newer one.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use trendlens_core::models::adjust;
use trendlens_core::{
    AnalysisOptions, Classifier, Config, ContentItem, FallbackPolicy, MatchMode,
    RefreshCoordinator, TrendSnapshot, WindowDays, build_snapshot, items_from_json,
};

use crate::fetch::CardsClient;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `analyze_trends` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct AnalyzeTrendsParams {
    /// Cards as JSON: an array, or an object with a `data` or `items` array.
    pub cards: String,
    /// Comparison window in days: 7, 30 or 90.
    pub window_days: Option<u32>,
    /// Only analyze this taxonomy.
    pub taxonomy: Option<String>,
    /// Reference time (RFC 3339). Defaults to now.
    pub now: Option<String>,
    /// Require keywords to stand alone rather than match inside words.
    #[serde(default)]
    pub word_boundary: bool,
    /// Fill taxonomies with no matches with flagged sample data.
    #[serde(default)]
    pub sample_data: bool,
}

/// Parameters for the `classify_text` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct ClassifyTextParams {
    /// Text to classify.
    pub text: String,
    /// Only use this taxonomy.
    pub taxonomy: Option<String>,
    /// Require keywords to stand alone rather than match inside words.
    #[serde(default)]
    pub word_boundary: bool,
}

/// Parameters for the `model_scores` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct ModelScoresParams {
    /// Cards as JSON used to count mentions. Omit for base scores.
    pub cards: Option<String>,
}

/// Parameters for the `refresh_trends` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct RefreshTrendsParams {
    /// Comparison window in days: 7, 30 or 90.
    pub window_days: Option<u32>,
    /// Number of cards to request.
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct RefreshOutcome {
    generation: u64,
    committed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_failed: Option<String>,
    snapshot: TrendSnapshot,
}

/// MCP server exposing trend analysis to AI assistants.
#[derive(Clone)]
pub struct TrendServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    config: Arc<Config>,
    coordinator: Arc<RefreshCoordinator>,
    max_input: Option<usize>,
}

impl Default for TrendServer {
    fn default() -> Self {
        Self::new(Config::default(), None)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_window(days: Option<u32>, default: WindowDays) -> Result<WindowDays, McpError> {
    days.map_or(Ok(default), |d| {
        WindowDays::try_from(d).map_err(|e| McpError::invalid_params(e.to_string(), None))
    })
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, McpError> {
    match now {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| McpError::invalid_params(format!("invalid `now` ({raw}): {e}"), None)),
    }
}

#[tool_router]
impl TrendServer {
    /// Create a server over the given configuration.
    pub fn new(config: Config, max_input: Option<usize>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
            coordinator: Arc::new(RefreshCoordinator::new()),
            max_input,
        }
    }

    fn decode_cards(&self, cards: &str) -> Result<Vec<ContentItem>, McpError> {
        if let Some(max) = self.max_input
            && cards.len() > max
        {
            return Err(McpError::invalid_params(
                format!("input too large: {} bytes (limit: {max} bytes)", cards.len()),
                None,
            ));
        }
        items_from_json(cards).map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    fn match_mode(&self, word_boundary: bool) -> MatchMode {
        if word_boundary {
            MatchMode::WordBoundary
        } else {
            self.config.match_mode.unwrap_or_default()
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "taxonomies": self.config.taxonomy_registry().names(),
            "window_days": self.config.window().days(),
        });

        if params.format == "json" {
            return to_json(&info);
        }
        let text = format!(
            "{} v{}\n{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION"),
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Analyze cards supplied in the call.
    #[tool(
        description = "Rank technology categories by activity in cards you supply. Returns per-taxonomy records with current and previous counts, growth, trend direction and a 7-day histogram, plus model scores."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn analyze_trends(
        &self,
        Parameters(params): Parameters<AnalyzeTrendsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "analyze_trends",
            window = ?params.window_days,
            taxonomy = ?params.taxonomy,
            "executing MCP tool"
        );

        let items = self.decode_cards(&params.cards)?;
        let registry = self.config.taxonomy_registry();
        let taxonomies = registry
            .select(params.taxonomy.as_deref())
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let mut opts = self.config.analysis_options(parse_now(params.now.as_deref())?);
        opts.window = parse_window(params.window_days, opts.window)?;
        opts.match_mode = self.match_mode(params.word_boundary);
        if params.sample_data {
            opts.fallback = FallbackPolicy::Sample;
        }

        let snapshot = build_snapshot(&items, &taxonomies, &self.config.model_registry(), &opts, 0);

        tracing::info!(
            tool = "analyze_trends",
            items = items.len(),
            sample_data = snapshot.has_sample_data(),
            "MCP tool completed"
        );
        to_json(&snapshot)
    }

    /// Classify a piece of text.
    #[tool(description = "List the categories a piece of text falls into, per taxonomy.")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn classify_text(
        &self,
        Parameters(params): Parameters<ClassifyTextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "classify_text", taxonomy = ?params.taxonomy, "executing MCP tool");

        let registry = self.config.taxonomy_registry();
        let taxonomies = registry
            .select(params.taxonomy.as_deref())
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let text = params.text.to_lowercase();
        let mode = self.match_mode(params.word_boundary);

        let result: BTreeMap<&str, Vec<String>> = taxonomies
            .iter()
            .map(|t| {
                let keys = Classifier::new(t, mode).classify_text(&text);
                (t.name.as_str(), keys.into_iter().collect())
            })
            .collect();

        tracing::info!(tool = "classify_text", "MCP tool completed");
        to_json(&result)
    }

    /// Model scores, optionally adjusted by mentions in supplied cards.
    #[tool(
        description = "List models by capability with popularity adjusted by how many of the supplied cards mention them."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn model_scores(
        &self,
        Parameters(params): Parameters<ModelScoresParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "model_scores", "executing MCP tool");

        let items = match params.cards.as_deref() {
            Some(cards) => self.decode_cards(cards)?,
            None => Vec::new(),
        };
        let models = adjust(&self.config.model_registry(), &items);

        tracing::info!(tool = "model_scores", models = models.len(), "MCP tool completed");
        to_json(&models)
    }

    /// Fetch cards from the API and commit a new snapshot.
    #[tool(
        description = "Fetch the latest cards from the configured API, analyze them and store the result. A fetch failure yields an empty analysis and is reported in `load_failed`."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    async fn refresh_trends(
        &self,
        Parameters(params): Parameters<RefreshTrendsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "refresh_trends", window = ?params.window_days, "executing MCP tool");

        // Only an accepted request may supersede a refresh in flight.
        let mut opts: AnalysisOptions = self.config.analysis_options(Utc::now());
        opts.window = parse_window(params.window_days, opts.window)?;
        let limit = params.limit.unwrap_or_else(|| self.config.item_limit());
        let client = CardsClient::new(self.config.api_base_url(), &self.config.fetch)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let ticket = self.coordinator.begin();
        let (items, load_failed) = match client.fetch_items(limit).await {
            Ok(items) => (items, None),
            Err(e) => {
                tracing::error!(tool = "refresh_trends", error = %e, "cards fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let registry = self.config.taxonomy_registry();
        let taxonomies: Vec<_> = registry.all().iter().collect();
        let snapshot = build_snapshot(
            &items,
            &taxonomies,
            &self.config.model_registry(),
            &opts,
            ticket.generation(),
        );
        let committed = self.coordinator.commit(ticket, snapshot.clone());

        tracing::info!(
            tool = "refresh_trends",
            generation = ticket.generation(),
            committed,
            "MCP tool completed"
        );
        to_json(&RefreshOutcome {
            generation: ticket.generation(),
            committed,
            load_failed,
            snapshot,
        })
    }

    /// The last committed snapshot.
    #[tool(description = "Return the snapshot stored by the most recent successful refresh_trends call.")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn latest_trends(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "latest_trends", "executing MCP tool");
        match self.coordinator.latest() {
            Some(snapshot) => to_json(snapshot.as_ref()),
            None => Ok(CallToolResult::success(vec![Content::text(
                "no refresh has completed yet; call refresh_trends first",
            )])),
        }
    }
}

#[tool_handler]
impl ServerHandler for TrendServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use analyze_trends on cards you have, or refresh_trends then latest_trends to analyze the configured cards API.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
