//! End-to-end behaviour of live diagrams on a page

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use vellum::LiveDiagrams;
use vellum_diagrams::{MockEngine, PassOutcome, PassReport, RenderSettings};
use vellum_page::{shared, Page, SharedPage};

const FLOW: &str = "graph TD; A-->B;";
const PIE: &str = "pie title Pets\n\"Dogs\" : 3";
const SEQUENCE: &str = "sequenceDiagram\nAlice->>Bob: Hi";

fn page_with(sources: &[&str]) -> Page {
    let mut page = Page::from_markdown("# Architecture\n\nSome prose before the diagrams.\n");
    let body = page.body();
    for source in sources {
        page.append_code_block(body, Some("mermaid"), source).unwrap();
        page.append_html(body, "<p>More prose.</p>").unwrap();
    }
    page
}

async fn activate(page: &SharedPage, engine: &Arc<MockEngine>) -> (LiveDiagrams, PassReport) {
    LiveDiagrams::activate(page.clone(), engine.clone(), RenderSettings::default())
        .await
        .unwrap()
}

async fn set_theme(page: &SharedPage, theme: &str) {
    let mut page = page.write().await;
    let root = page.root();
    page.set_attribute(root, "data-theme", theme).unwrap();
}

async fn container_html(page: &SharedPage, live: &LiveDiagrams) -> Vec<String> {
    let diagrams = live.diagrams().await;
    let page = page.read().await;
    diagrams
        .iter()
        .map(|diagram| page.inner_html(diagram.container).unwrap())
        .collect()
}

async fn next_report(reports: &mut broadcast::Receiver<PassReport>) -> PassReport {
    tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .expect("no pass report within 5s")
        .unwrap()
}

async fn next_completed(reports: &mut broadcast::Receiver<PassReport>) -> PassReport {
    loop {
        let report = next_report(reports).await;
        if report.outcome == PassOutcome::Completed {
            return report;
        }
    }
}

fn without_ids(markup: &str) -> String {
    let mut out = String::new();
    let mut rest = markup;
    while let Some(start) = rest.find("id=\"") {
        out.push_str(&rest[..start + 4]);
        rest = &rest[start + 4..];
        let end = rest.find('"').unwrap_or(rest.len());
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

#[tokio::test]
async fn test_every_block_is_registered_with_its_source() {
    let page = shared(page_with(&[FLOW, PIE, SEQUENCE]));
    let engine = Arc::new(MockEngine::new());
    let (live, report) = activate(&page, &engine).await;

    assert_eq!(report.total, 3);
    let diagrams = live.diagrams().await;
    assert_eq!(diagrams.len(), 3);
    for (diagram, expected) in diagrams.iter().zip([FLOW, PIE, SEQUENCE]) {
        let source = live.controller().lookup(diagram.container).await.unwrap();
        assert_eq!(source.as_str(), expected);
    }

    live.shutdown().await;
}

#[tokio::test]
async fn test_light_page_renders_light_markup() {
    let page = shared(page_with(&[FLOW]));
    let engine = Arc::new(MockEngine::new());
    let (live, report) = activate(&page, &engine).await;

    assert_eq!(report.theme, Some(vellum_diagrams::Theme::Light));
    let html = container_html(&page, &live).await;
    assert_eq!(
        html[0],
        "<svg id=\"mermaid-0-0\" data-theme=\"default\"><text>graph TD; A--&gt;B;</text></svg>"
    );

    let container = live.diagrams().await[0].container;
    assert_eq!(
        live.controller().lookup(container).await.unwrap().as_str(),
        "graph TD; A-->B;"
    );
    live.shutdown().await;
}

#[tokio::test]
async fn test_dark_preference_without_marker_renders_dark() {
    let page = shared(page_with(&[FLOW]).with_prefers_dark_scheme(true));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;

    assert!(container_html(&page, &live).await[0].contains("data-theme=\"dark\""));
    live.shutdown().await;
}

#[tokio::test]
async fn test_refresh_with_same_theme_is_idempotent() {
    let page = shared(page_with(&[FLOW, PIE]));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;

    let first = container_html(&page, &live).await;
    let report = live.refresh().await;
    assert!(report.is_completed());
    let second = container_html(&page, &live).await;

    let strip = |html: Vec<String>| html.iter().map(|m| without_ids(m)).collect::<Vec<_>>();
    assert_eq!(strip(first), strip(second));
    live.shutdown().await;
}

#[tokio::test]
async fn test_failing_diagram_is_isolated() {
    let page = shared(page_with(&[FLOW, "graph TD; A-->", SEQUENCE]));
    let engine = Arc::new(MockEngine::new().with_failure("graph TD; A-->", "Parse error on line 1"));
    let (live, report) = activate(&page, &engine).await;

    assert_eq!((report.rendered, report.failed), (2, 1));
    let html = container_html(&page, &live).await;
    assert!(html[0].starts_with("<svg id=\"mermaid-0-0\""));
    assert_eq!(
        html[1],
        "<pre class=\"diagram-error\">Diagram render error: Parse error on line 1</pre>"
    );
    assert!(html[2].starts_with("<svg id=\"mermaid-0-2\""));
    live.shutdown().await;
}

#[tokio::test]
async fn test_theme_change_triggers_exactly_one_refresh_without_rescan() {
    let page = shared(page_with(&[FLOW, PIE]));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;
    let mut reports = live.subscribe_reports();
    assert_eq!(engine.initialize_calls().len(), 1);

    // a block added after activation is not picked up by theme refreshes
    {
        let mut page = page.write().await;
        let body = page.body();
        page.append_code_block(body, Some("mermaid"), SEQUENCE).unwrap();
    }

    set_theme(&page, "dark").await;
    let report = next_report(&mut reports).await;
    assert!(report.is_completed());
    assert_eq!(report.total, 2);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(reports.try_recv().is_err());
    assert_eq!(engine.initialize_calls().len(), 2);

    for markup in container_html(&page, &live).await {
        assert!(markup.contains("data-theme=\"dark\""), "{markup}");
    }
    assert_eq!(live.diagrams().await.len(), 2);
    assert_eq!(page.read().await.elements_with_class("language-mermaid").len(), 1);
    live.shutdown().await;
}

#[tokio::test]
async fn test_rapid_theme_flips_leave_only_latest_output() {
    let page = shared(page_with(&[FLOW, PIE, SEQUENCE]));
    let engine = Arc::new(MockEngine::gated());
    engine.release(3);
    let (live, _) = activate(&page, &engine).await;
    let mut reports = live.subscribe_reports();

    for theme in ["dark", "light", "dark", "light", "dark"] {
        set_theme(&page, theme).await;
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.release(64);

    let report = next_completed(&mut reports).await;
    assert_eq!(report.theme, Some(vellum_diagrams::Theme::Dark));
    assert_eq!(report.rendered, 3);

    let prefix = format!("mermaid-{}-", report.epoch);
    for markup in container_html(&page, &live).await {
        assert!(markup.contains("data-theme=\"dark\""), "{markup}");
        assert!(markup.contains(&prefix), "{markup}");
    }

    // no superseded pass wrote anything after the winner
    tokio::time::sleep(Duration::from_millis(20)).await;
    while let Ok(late) = reports.try_recv() {
        assert_eq!(late.outcome, PassOutcome::Superseded);
        assert_eq!(late.rendered + late.failed, 0);
    }
    live.shutdown().await;
}

#[tokio::test]
async fn test_render_ids_are_unique_across_passes() {
    let page = shared(page_with(&[FLOW, PIE]));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;
    live.refresh().await;
    live.refresh().await;

    let ids: Vec<String> = engine.render_calls().into_iter().map(|call| call.id).collect();
    assert_eq!(ids.len(), 6);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 6);
    live.shutdown().await;
}

#[tokio::test]
async fn test_unrelated_attribute_changes_are_ignored() {
    let page = shared(page_with(&[FLOW]));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;
    let mut reports = live.subscribe_reports();

    {
        let mut page = page.write().await;
        let root = page.root();
        let body = page.body();
        page.set_attribute(root, "lang", "en").unwrap();
        page.set_attribute(root, "class", "dark").unwrap();
        page.set_attribute(body, "data-theme", "dark").unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(reports.try_recv().is_err());
    assert_eq!(engine.initialize_calls().len(), 1);
    live.shutdown().await;
}

#[tokio::test]
async fn test_malformed_blocks_are_skipped() {
    let mut page = page_with(&[FLOW]);
    let body = page.body();
    // inline code has no wrapper
    let paragraph = page.append_element(body, "p").unwrap();
    let inline = page.append_element(paragraph, "code").unwrap();
    page.set_attribute(inline, "class", "language-mermaid").unwrap();
    page.append_text(inline, PIE).unwrap();
    // empty block
    page.append_code_block(body, Some("mermaid"), "").unwrap();

    let page = shared(page);
    let engine = Arc::new(MockEngine::new());
    let (live, report) = activate(&page, &engine).await;

    assert_eq!(report.total, 1);
    assert_eq!(live.diagrams().await.len(), 1);
    live.shutdown().await;
}

#[tokio::test]
async fn test_discovered_source_is_escaped_in_page_html() {
    let page = shared(page_with(&[FLOW]));
    let controller = vellum_diagrams::DiagramController::new(
        page.clone(),
        Arc::new(MockEngine::new()),
        RenderSettings::default(),
    )
    .unwrap();
    controller.discover().await;

    let html = page.read().await.to_html();
    assert!(html.contains(
        "<div class=\"mermaid\" data-diagram-index=\"0\">graph TD; A--&gt;B;</div>"
    ));
}

#[tokio::test]
async fn test_shutdown_stops_theme_refreshes() {
    let page = shared(page_with(&[FLOW]));
    let engine = Arc::new(MockEngine::new());
    let (live, _) = activate(&page, &engine).await;
    live.shutdown().await;

    set_theme(&page, "dark").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.initialize_calls().len(), 1);
}
