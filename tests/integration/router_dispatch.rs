//! Integration tests for request routing through page type loaders

use pagetype::{Actor, DispatchOutcome, LoaderState, PageTypeError, RequestContext, SkipReason};

use super::test_utils::seeded_site;

fn render(template: &str) -> Option<DispatchOutcome> {
    Some(DispatchOutcome::Render {
        template: template.to_string(),
    })
}

#[tokio::test]
async fn test_exact_matches_render_their_type() {
    let fixture = seeded_site().await;
    let router = fixture.site.router();

    let expected = [
        ("/", "home"),
        ("/park", "place"),
        ("/news", "blog"),
        ("/events", "event"),
    ];
    for (path, template) in expected {
        let ctx = router.serve(path, None).await.unwrap();
        assert_eq!(ctx.outcome, render(template), "path {}", path);
        assert!(ctx.page.is_some());
        assert_eq!(ctx.remainder, "");
    }
}

#[tokio::test]
async fn test_greedy_type_handles_longest_prefix() {
    let fixture = seeded_site().await;
    let router = fixture.site.router();

    let ctx = router.serve("/events/2024/", None).await.unwrap();
    // No exact match, so the page is the candidate bound by the greedy loader
    let bound = ctx.page.as_ref().unwrap();
    assert_eq!(bound.slug.as_deref(), Some("/events"));
    assert_eq!(bound.fields["_location"]["title"], serde_json::json!("Park"));
    assert_eq!(
        ctx.best_page.as_ref().and_then(|p| p.slug.as_deref()),
        Some("/events")
    );
    assert_eq!(ctx.remainder, "/2024");
    assert_eq!(ctx.outcome, render("eventYear"));

    let ctx = router.serve("/events/someday", None).await.unwrap();
    assert_eq!(ctx.outcome, Some(DispatchOutcome::NotFound));
}

#[tokio::test]
async fn test_non_greedy_prefix_is_not_found() {
    let fixture = seeded_site().await;
    let router = fixture.site.router();

    let ctx = router.serve("/news/2024", None).await.unwrap();
    assert_eq!(
        ctx.best_page.as_ref().map(|p| p.page_type.as_str()),
        Some("blog")
    );
    assert_eq!(ctx.outcome, Some(DispatchOutcome::NotFound));

    let ctx = router.serve("/contact", None).await.unwrap();
    assert_eq!(
        ctx.best_page.as_ref().and_then(|p| p.slug.as_deref()),
        Some("/")
    );
    assert_eq!(ctx.remainder, "/contact");
    assert_eq!(ctx.outcome, Some(DispatchOutcome::NotFound));
}

#[tokio::test]
async fn test_loader_binds_joined_page() {
    let fixture = seeded_site().await;
    let ctx = fixture.site.router().serve("/events", None).await.unwrap();
    let page = ctx.page.unwrap();
    assert_eq!(page.fields["_location"]["title"], serde_json::json!("Park"));
}

#[tokio::test]
async fn test_editor_gets_context_menu() {
    let fixture = seeded_site().await;
    let router = fixture.site.router();

    let ctx = router.serve("/events", None).await.unwrap();
    assert!(ctx.context_menu.is_none());

    let ctx = router
        .serve("/events", Some(Actor::editor("ada")))
        .await
        .unwrap();
    let menu = ctx.context_menu.unwrap();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0].label, "New Event");

    // Types without a custom menu leave the host default in place
    let ctx = router
        .serve("/news", Some(Actor::editor("ada")))
        .await
        .unwrap();
    assert!(ctx.context_menu.is_none());
}

#[tokio::test]
async fn test_dispatch_failure_settles_not_found() {
    let fixture = seeded_site().await;
    let events = fixture.page_type("event");

    let best = fixture
        .site
        .router()
        .serve("/events", None)
        .await
        .unwrap()
        .best_page;

    let mut ctx = RequestContext::new("/events/broken");
    ctx.best_page = best;
    ctx.remainder = "/broken".to_string();
    let err = events.loader(&mut ctx).await.unwrap_err();
    assert!(matches!(err, PageTypeError::Dispatch(_)));
    assert_eq!(ctx.outcome, Some(DispatchOutcome::NotFound));

    let result = fixture.site.router().serve("/events/broken", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_other_types_skip_candidate() {
    let fixture = seeded_site().await;
    let best = fixture
        .site
        .router()
        .serve("/park", None)
        .await
        .unwrap()
        .page;

    for name in ["home", "event", "blog"] {
        let mut ctx = RequestContext::new("/park");
        ctx.page = best.clone();
        ctx.best_page = best.clone();
        let state = fixture.page_type(name).loader(&mut ctx).await.unwrap();
        assert_eq!(state, LoaderState::Skip(SkipReason::OtherType));
        assert!(ctx.outcome.is_none());
    }
}
