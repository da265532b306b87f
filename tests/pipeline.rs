use std::path::{Path, PathBuf};

use site2md::config::{RunConfig, parse_path_pattern, parse_selector_list};
use site2md::crawler::{
    CrawlError, CrawlerConfig, FetchReport, FetchRequest, FetchedPage, SiteFetcher, Storage,
};
use site2md::pipeline::{Converter, Pipeline, RunState, Workspace};
use site2md::processor::ConversionConfig;
use url::Url;

/// Serves a fixed set of pages, honoring the request's link filter
struct FakeFetcher {
    pages: Vec<(&'static str, &'static str)>,
}

impl SiteFetcher for FakeFetcher {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<FetchReport, CrawlError> {
        let storage = Storage::new();
        let mut report = FetchReport::default();

        for (url, html) in &self.pages {
            let is_start = *url == request.start.url().as_str();
            if !is_start && !request.filter.accept(url) {
                report.rejected += 1;
                continue;
            }

            let parsed = Url::parse(url)?;
            let path = storage.workspace_path_for_url(request.filter.base_domain(), &parsed)?;
            storage
                .write_text(&request.workspace.join(&path), html)
                .await?;
            report.pages.push(FetchedPage {
                url: url.to_string(),
                path,
                depth: if is_start { 0 } else { 1 },
            });
        }

        Ok(report)
    }
}

/// Writes one page and then gives up
struct FailingFetcher;

impl SiteFetcher for FailingFetcher {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<FetchReport, CrawlError> {
        Storage::new()
            .write_text(&request.workspace.join("partial.html"), "<main>x</main>")
            .await?;
        Err(CrawlError::Other("connection reset".to_string()))
    }
}

fn docs_config(output: &Path) -> RunConfig {
    let crawler = CrawlerConfig::builder()
        .delay_ms(0)
        .path_pattern(parse_path_pattern(Some("^/docs/.*")).unwrap())
        .build();
    let conversion = ConversionConfig::builder()
        .selector("main")
        .ignore_selectors(parse_selector_list("script,style"))
        .build();
    RunConfig::new("https://example.com/docs/", output, crawler, conversion).unwrap()
}

fn docs_site() -> FakeFetcher {
    FakeFetcher {
        pages: vec![
            (
                "https://example.com/docs/",
                r#"<html><body><nav>menu</nav><main><h1>Docs</h1><p>See <a href="/docs/a">A</a>.</p><script>track()</script></main></body></html>"#,
            ),
            (
                "https://example.com/docs/a",
                r#"<html><body><main><h2>Install</h2><pre><code class="language-sh">cargo install site2md</code></pre></main></body></html>"#,
            ),
            (
                "https://example.com/docs/b",
                "<html><body><div>No main here</div></body></html>",
            ),
            (
                "https://example.com/blog/post",
                "<html><body><main><p>Blog</p></main></body></html>",
            ),
            (
                "https://other.com/docs/x",
                "<html><body><main><p>Elsewhere</p></main></body></html>",
            ),
        ],
    }
}

#[tokio::test]
async fn test_crawl_writes_filtered_markdown_tree() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let workspace = Workspace::within(dir.path().join("ws")).unwrap();
    let workspace_path = workspace.path().to_path_buf();

    let mut pipeline = Pipeline::new(docs_config(&output), docs_site());
    let report = pipeline.run(workspace).await.unwrap();

    assert_eq!(pipeline.state(), RunState::Done);
    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.links_rejected, 2);
    assert_eq!(
        report.converted,
        vec![PathBuf::from("docs/a.md"), PathBuf::from("docs/index.md")]
    );
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].url, "https://example.com/docs/b");

    let index = std::fs::read_to_string(output.join("docs/index.md")).unwrap();
    assert!(index.starts_with("# Docs"));
    assert!(index.contains("[A](/docs/a)"));
    assert!(!index.contains("menu"));
    assert!(!index.contains("track()"));

    let install = std::fs::read_to_string(output.join("docs/a.md")).unwrap();
    assert!(install.starts_with("## Install"));
    assert!(install.contains("```"));
    assert!(install.contains("cargo install site2md"));
    assert!(!output.join("blog").exists());
    assert!(!output.join("other.com").exists());
    assert!(!output.join("docs/b.md").exists());
    assert!(!workspace_path.exists());
}

#[tokio::test]
async fn test_workspace_directory_with_content_survives_run() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("precious.txt"), "keep me").unwrap();

    let output = project.join("out");
    let mut pipeline = Pipeline::new(docs_config(&output), docs_site());
    pipeline
        .run(Workspace::within(&project).unwrap())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(project.join("precious.txt")).unwrap(),
        "keep me"
    );
    assert!(output.join("docs/index.md").exists());

    let mut left: Vec<String> = std::fs::read_dir(&project)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["out", "precious.txt"]);
}

#[tokio::test]
async fn test_convert_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pages");
    let storage = Storage::new();
    storage
        .write_text(
            &input.join("docs/index.html"),
            r#"<main><h1>Guide</h1><ul><li>one</li><li>two <em>more</em></li></ul><table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table></main>"#,
        )
        .await
        .unwrap();

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let conversion = docs_config(&first).conversion;
    Converter::new(conversion.clone(), &first)
        .convert_workspace(&input)
        .await
        .unwrap();
    Converter::new(conversion, &second)
        .convert_workspace(&input)
        .await
        .unwrap();

    let a = std::fs::read(first.join("docs/index.md")).unwrap();
    let b = std::fs::read(second.join("docs/index.md")).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_workspace_removed_after_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let workspace = Workspace::within(dir.path().join("ws")).unwrap();
    let workspace_path = workspace.path().to_path_buf();

    let mut pipeline = Pipeline::new(docs_config(&output), FailingFetcher);
    let result = pipeline.run(workspace).await;

    assert!(result.is_err());
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(!workspace_path.exists());
    assert!(!output.exists());
}

#[test]
fn test_invalid_configuration_is_rejected_before_fetching() {
    assert!(parse_path_pattern(Some("([")).is_err());
    assert!(
        RunConfig::new(
            "ftp://example.com/",
            "out",
            CrawlerConfig::default(),
            ConversionConfig::default(),
        )
        .is_err()
    );
    assert!(
        RunConfig::new(
            "https://example.com/",
            "out",
            CrawlerConfig::default(),
            ConversionConfig::builder().selector("main[").build(),
        )
        .is_err()
    );
}
