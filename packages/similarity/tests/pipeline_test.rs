//! End-to-end pipeline scenarios over the mock fetcher.

use std::sync::Arc;

use similarity::testing::{solid_png, split_png, MockFetcher};
use similarity::{run_audit, AuditConfig, SignalKind};

const PORTAL_HTML: &str = r#"<html><head><title>Portal</title></head><body>
    <header><h1>Secure Customer Portal</h1></header>
    <main>
      <p>Welcome to our secure customer portal where your account details are protected at all times.</p>
      <p>Sign in with your registered email address and password to manage payments and statements.</p>
      <img src="/logo.png">
    </main>
    <footer><p>Customer support is available around the clock for every account holder.</p></footer>
</body></html>"#;

const UNRELATED_HTML: &str = r#"<html><head><title>Garden</title></head><body>
    <article>
      <h2>Growing tomatoes in northern climates</h2>
      <ul><li>Start seedlings indoors well before the last expected frost date arrives.</li>
      <li>Harden plants off gradually over a week of increasing outdoor exposure.</li></ul>
    </article>
</body></html>"#;

fn portal_site(root: &str) -> MockFetcher {
    let host_root = root.trim_end_matches('/');
    MockFetcher::new()
        .with_page(format!("{host_root}/"), PORTAL_HTML)
        .with_bytes(
            format!("{host_root}/logo.png"),
            split_png(64, 64),
            "image/png",
        )
}

#[tokio::test]
async fn identical_single_page_sites_score_one() {
    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(
        &config,
        Arc::new(portal_site("https://legit.test")),
        Arc::new(portal_site("https://clone.test")),
    )
    .await
    .unwrap();

    let breakdown = &outcome.breakdown;
    assert_eq!(breakdown.signal(SignalKind::Text).unwrap().score, 1.0);
    assert_eq!(breakdown.signal(SignalKind::Image).unwrap().score, 1.0);
    assert_eq!(breakdown.signal(SignalKind::Structure).unwrap().score, 1.0);
    assert_eq!(breakdown.overall, 1.0);

    // Evidence cites the concrete image pairing.
    assert!(breakdown.evidence.iter().any(|m| {
        m.kind == SignalKind::Image
            && m.base_id == "https://legit.test/logo.png"
            && m.clone_id == "https://clone.test/logo.png"
            && m.similarity == 1.0
    }));
}

#[tokio::test]
async fn clone_without_images_excludes_the_image_signal() {
    let clone_html = PORTAL_HTML.replace(r#"<img src="/logo.png">"#, "");
    let clone_fetcher = MockFetcher::new().with_page("https://clone.test/", clone_html);

    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(
        &config,
        Arc::new(portal_site("https://legit.test")),
        Arc::new(clone_fetcher),
    )
    .await
    .unwrap();

    let breakdown = &outcome.breakdown;
    assert!(breakdown.signal(SignalKind::Image).is_none());

    // Overall is the text/structure weighted average, untouched by the
    // absent image evidence.
    let text = breakdown.signal(SignalKind::Text).unwrap().score;
    let structure = breakdown.signal(SignalKind::Structure).unwrap().score;
    let expected = (text * 0.4 + structure * 0.2) / 0.6;
    assert!((breakdown.overall - expected).abs() < 1e-9);
}

#[tokio::test]
async fn image_timeout_degrades_to_absence_not_failure() {
    let clone_fetcher = MockFetcher::new()
        .with_page("https://clone.test/", PORTAL_HTML)
        .with_timeout("https://clone.test/logo.png");

    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(
        &config,
        Arc::new(portal_site("https://legit.test")),
        Arc::new(clone_fetcher),
    )
    .await
    .unwrap();

    // The timed-out image produced no artefact on the clone side, so the
    // signal has no two-sided evidence; text and structure still scored.
    assert!(outcome.breakdown.signal(SignalKind::Image).is_none());
    assert_eq!(
        outcome.breakdown.signal(SignalKind::Text).unwrap().score,
        1.0
    );
    assert_eq!(outcome.clone.images.len(), 0);
    assert_eq!(outcome.clone.texts.len(), 1);
}

#[tokio::test]
async fn unrelated_sites_score_low() {
    let clone_fetcher = MockFetcher::new().with_page("https://clone.test/", UNRELATED_HTML);

    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(
        &config,
        Arc::new(portal_site("https://legit.test")),
        Arc::new(clone_fetcher),
    )
    .await
    .unwrap();

    // No shared shingles at all; structure overlap is whatever boilerplate
    // html/head/body windows coincide.
    assert!(outcome.breakdown.overall < 0.5);
    assert!(outcome
        .breakdown
        .evidence
        .iter()
        .all(|m| m.kind != SignalKind::Text));
}

#[tokio::test]
async fn multi_page_sites_accumulate_artefacts_per_page() {
    let base = MockFetcher::new()
        .with_page(
            "https://legit.test/",
            r#"<html><body><p>Welcome to our secure customer portal where accounts stay protected.</p>
               <a href="/pricing">pricing</a></body></html>"#,
        )
        .with_page(
            "https://legit.test/pricing",
            "<html><body><p>Transparent monthly pricing with no hidden processing fees ever charged.</p></body></html>",
        );
    let clone = MockFetcher::new()
        .with_page(
            "https://clone.test/",
            r#"<html><body><p>Welcome to our secure customer portal where accounts stay protected.</p>
               <a href="/pricing">pricing</a></body></html>"#,
        )
        .with_page(
            "https://clone.test/pricing",
            "<html><body><p>Transparent monthly pricing with no hidden processing fees ever charged.</p></body></html>",
        );

    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(&config, Arc::new(base), Arc::new(clone))
        .await
        .unwrap();

    assert_eq!(outcome.base.texts.len(), 2);
    assert_eq!(outcome.clone.texts.len(), 2);
    let text = outcome.breakdown.signal(SignalKind::Text).unwrap();
    assert_eq!(text.match_count, 2);
    assert_eq!(text.score, 1.0);

    // Each base page matched its own counterpart, not the other page.
    let pricing_match = outcome
        .breakdown
        .evidence
        .iter()
        .find(|m| m.base_id == "https://legit.test/pricing")
        .unwrap();
    assert_eq!(pricing_match.clone_id, "https://clone.test/pricing");
}

#[tokio::test]
async fn solid_color_logo_still_matches_by_hash() {
    // Flat images all collapse to the same degenerate hash; they should
    // still pair up rather than error out.
    let base = MockFetcher::new()
        .with_page("https://legit.test/", PORTAL_HTML)
        .with_bytes(
            "https://legit.test/logo.png",
            solid_png(32, 32, [0, 82, 155]),
            "image/png",
        );
    let clone = MockFetcher::new()
        .with_page("https://clone.test/", PORTAL_HTML)
        .with_bytes(
            "https://clone.test/logo.png",
            solid_png(32, 32, [0, 82, 155]),
            "image/png",
        );

    let config = AuditConfig::new("https://legit.test/", "https://clone.test/");
    let outcome = run_audit(&config, Arc::new(base), Arc::new(clone))
        .await
        .unwrap();

    assert_eq!(outcome.breakdown.signal(SignalKind::Image).unwrap().score, 1.0);
}
