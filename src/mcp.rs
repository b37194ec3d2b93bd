//! MCP front end for the documentation cache.
//!
//! Exposes the cache operations as MCP tools and renders their results as
//! plain text for the client.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use whistle_docs_mcp::config::DocsConfig;
//! use whistle_docs_mcp::docs_cache::DocsCache;
//! use whistle_docs_mcp::mcp::DocsServer;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(DocsCache::from_config(&DocsConfig::default())?);
//!     let _server = DocsServer::new(cache);
//!     Ok(())
//! }
//! ```

use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities};
use rmcp::{ServerHandler, model::ServerInfo, tool};
use rmcp::model::{Content, IntoContents};
use std::fmt;
use std::sync::Arc;

use crate::docs_cache::{DocsCache, DocsError};
use crate::search::SearchResult;
use crate::section::DocSection;

/// All cached sections, rendered as a listing of `{ id, title, url }`.
#[derive(Debug, Clone)]
pub struct SectionListing(pub Vec<DocSection>);

/// A single section, or the id that could not be found.
#[derive(Debug, Clone)]
pub enum SectionPage {
    Found(DocSection),
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct SearchHits {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub section_count: usize,
}

impl fmt::Display for SectionListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No documentation sections are available.");
        }
        write!(f, "Found {} documentation sections:", self.0.len())?;
        for section in &self.0 {
            write!(f, "\n- {} ({}): {}", section.title, section.id, section.url)?;
        }
        Ok(())
    }
}

impl fmt::Display for SectionPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionPage::Found(section) => write!(
                f,
                "# {}\n\nSource: {}\n\n{}",
                section.title, section.url, section.content
            ),
            SectionPage::NotFound(id) => write!(
                f,
                "Section '{}' not found. Use list_sections to see the available ids.",
                id
            ),
        }
    }
}

impl fmt::Display for SearchHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.results.is_empty() {
            return write!(f, "No results for \"{}\".", self.query);
        }
        write!(f, "Found {} results for \"{}\":", self.results.len(), self.query)?;
        for (i, hit) in self.results.iter().enumerate() {
            write!(
                f,
                "\n\n{}. {}\n   {}\n   {}",
                i + 1,
                hit.section_title,
                hit.url,
                hit.matched_content
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Documentation cache refreshed: {} sections loaded.",
            self.section_count
        )
    }
}

impl IntoContents for SectionListing {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

impl IntoContents for SectionPage {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

impl IntoContents for SearchHits {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

impl IntoContents for RefreshSummary {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

/// Implements conversion from DocsError to MCP Contents.
impl IntoContents for DocsError {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(format!(
            "Whistle documentation is unavailable: {}",
            self
        ))]
    }
}

/// MCP service answering documentation queries from a shared [`DocsCache`].
#[derive(Clone)]
pub struct DocsServer {
    cache: Arc<DocsCache>,
}

#[tool(tool_box)]
impl DocsServer {
    pub fn new(cache: Arc<DocsCache>) -> Self {
        Self { cache }
    }

    #[tool(description = "List all Whistle documentation sections with their ids, titles and URLs")]
    pub async fn list_sections(&self) -> Result<SectionListing, DocsError> {
        let sections = self.cache.get_all_sections().await?;
        Ok(SectionListing(sections))
    }

    #[tool(description = "Get the full text of one Whistle documentation section")]
    pub async fn get_section(
        &self,
        #[tool(param)]
        #[schemars(description = "Section id as returned by list_sections, e.g. 'rules'")]
        section_id: String,
    ) -> Result<SectionPage, DocsError> {
        let page = match self.cache.get_section(&section_id).await? {
            Some(section) => SectionPage::Found(section),
            None => SectionPage::NotFound(section_id),
        };
        Ok(page)
    }

    #[tool(description = "Search the Whistle documentation for a keyword (case-insensitive)")]
    pub async fn search_docs(
        &self,
        #[tool(param)]
        #[schemars(description = "Text to look for in section titles and content")]
        query: String,
    ) -> Result<SearchHits, DocsError> {
        let results = self.cache.search(&query).await?;
        Ok(SearchHits { query, results })
    }

    #[tool(description = "Discard the cached documentation and crawl the site again")]
    pub async fn refresh_docs(&self) -> Result<RefreshSummary, DocsError> {
        self.cache.refresh_cache().await?;
        let status = self.cache.status().await;
        tracing::info!("Documentation cache refreshed with {} sections", status.section_count);
        Ok(RefreshSummary {
            section_count: status.section_count,
        })
    }
}

#[tool(tool_box)]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides the documentation of the Whistle web debugging proxy. \
                Use 'list_sections' to browse, 'get_section' to read a section by id, \
                'search_docs' to find sections mentioning a keyword and 'refresh_docs' \
                to force a fresh crawl. Documentation is cached for an hour."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocsConfig;
    use mockito::{Mock, Server, ServerGuard};
    use tempfile::{TempDir, tempdir};

    async fn mock_site() -> (ServerGuard, Vec<Mock>) {
        let mut server = Server::new_async().await;
        let index = server
            .mock("GET", "/whistle/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><body><div class="sidebar">
                <a href="/whistle/rules.html">Rules</a>
                <a href="/whistle/plugins.html">Plugins</a>
                </div></body></html>"#,
            )
            .create_async()
            .await;
        let rules = server
            .mock("GET", "/whistle/rules.html")
            .with_status(200)
            .with_body(r#"<div class="markdown-section">Rules map hosts to targets.</div>"#)
            .create_async()
            .await;
        let plugins = server
            .mock("GET", "/whistle/plugins.html")
            .with_status(200)
            .with_body(r#"<div class="markdown-section">Write custom plugins in Node.js.</div>"#)
            .create_async()
            .await;
        (server, vec![index, rules, plugins])
    }

    fn setup_test_server(base_url: String) -> (DocsServer, TempDir) {
        let temp_dir = tempdir().unwrap();
        let config = DocsConfig {
            base_url,
            cache_dir: temp_dir.path().to_path_buf(),
            ..DocsConfig::default()
        };
        let cache = Arc::new(DocsCache::from_config(&config).unwrap());
        (DocsServer::new(cache), temp_dir)
    }

    #[tokio::test]
    async fn test_list_sections() {
        let (site, _mocks) = mock_site().await;
        let (server, _dir) = setup_test_server(format!("{}/whistle/", site.url()));

        let text = server.list_sections().await.unwrap().to_string();

        assert!(text.starts_with("Found 2 documentation sections:"));
        assert!(text.contains("- Rules (rules): "));
        assert!(text.contains("/whistle/plugins.html"));
    }

    #[tokio::test]
    async fn test_get_section_found_and_missing() {
        let (site, _mocks) = mock_site().await;
        let (server, _dir) = setup_test_server(format!("{}/whistle/", site.url()));

        let found = server.get_section("rules".to_string()).await.unwrap();
        let text = found.to_string();
        assert!(text.starts_with("# Rules\n\nSource: "));
        assert!(text.ends_with("Rules map hosts to targets."));

        let missing = server.get_section("nope".to_string()).await.unwrap();
        assert!(matches!(missing, SectionPage::NotFound(ref id) if id == "nope"));
        assert!(missing.to_string().contains("'nope' not found"));
    }

    #[tokio::test]
    async fn test_search_docs() {
        let (site, _mocks) = mock_site().await;
        let (server, _dir) = setup_test_server(format!("{}/whistle/", site.url()));

        let hits = server.search_docs("PLUGIN".to_string()).await.unwrap();
        assert_eq!(hits.results.len(), 1);
        let text = hits.to_string();
        assert!(text.contains("1. Plugins"));
        assert!(text.contains("custom plugins"));

        let none = server.search_docs("kubernetes".to_string()).await.unwrap();
        assert_eq!(none.to_string(), "No results for \"kubernetes\".");
    }

    #[tokio::test]
    async fn test_refresh_docs() {
        let (site, _mocks) = mock_site().await;
        let (server, _dir) = setup_test_server(format!("{}/whistle/", site.url()));

        let summary = server.refresh_docs().await.unwrap();
        assert_eq!(summary.section_count, 2);
        assert!(summary.to_string().contains("2 sections loaded"));
    }

    #[tokio::test]
    async fn test_unreachable_site_reports_error() {
        let mut site = Server::new_async().await;
        let _index = site
            .mock("GET", "/whistle/")
            .with_status(503)
            .create_async()
            .await;
        let (server, _dir) = setup_test_server(format!("{}/whistle/", site.url()));

        let err = server.list_sections().await.unwrap_err();
        let contents = err.into_contents();
        let text = &contents[0].as_text().unwrap().text;
        assert!(text.starts_with("Whistle documentation is unavailable"));
        assert!(text.contains("503"));
    }
}
