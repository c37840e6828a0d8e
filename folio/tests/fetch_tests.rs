mod common;

#[cfg(test)]
mod tests {
    use crate::common::*;
    use folio::cache::{
        CacheStorage, CacheStore, CachedResponse, FetchRequest,
        MemoryCacheStorage, RequestKey,
        http::{HeaderValue, Method, header::ACCEPT},
    };
    use folio::{ControlMessage, FetchDisposition};
    use url::Url;

    fn respond(disposition: FetchDisposition) -> CachedResponse {
        match disposition {
            FetchDisposition::Respond(response) => response,
            FetchDisposition::Passthrough => panic!("expected a response"),
        }
    }

    async fn stored(harness: &Harness, url: &Url) -> Option<CachedResponse> {
        harness
            .storage
            .open(VERSION)
            .await
            .unwrap()
            .lookup(&RequestKey::get(url))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_core_file_hit_skips_network() {
        let harness = installed_harness().await;

        for path in ["/css/style.css", "/js/main.js", "/manifest.json"] {
            let request = FetchRequest::get(url(path));
            let response = respond(harness.router.handle_fetch(&request).await);
            assert_eq!(response.body, body_of(path));
        }
        assert!(harness.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_core_file_miss_goes_to_network_and_stores() {
        let harness = harness();
        let request = FetchRequest::get(url("/js/interactive.js"));

        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, body_of("/js/interactive.js"));
        assert_eq!(harness.network.calls_to(request.url.as_str()), 1);
        assert!(stored(&harness, &request.url).await.is_some());

        // second time it comes from the store
        harness.router.handle_fetch(&request).await;
        assert_eq!(harness.network.calls_to(request.url.as_str()), 1);
    }

    #[tokio::test]
    async fn test_navigation_online_stores_copy() {
        let harness = installed_harness().await;
        let page = url("/chapters/chapter2.html?section=3");
        harness.network.respond_ok(page.as_str(), "fresh chapter 2");

        let request = FetchRequest::navigate(page.clone());
        let response = respond(harness.router.handle_fetch(&request).await);

        assert_eq!(response.body, "fresh chapter 2");
        assert_eq!(
            stored(&harness, &page).await.map(|r| r.body),
            Some("fresh chapter 2".into())
        );
    }

    #[tokio::test]
    async fn test_navigation_by_accept_header() {
        let harness = installed_harness().await;
        harness.network.set_offline(true);

        let request = FetchRequest::get(url("/glossary.html")).with_header(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, body_of("/offline.html"));
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_offline_page() {
        let harness = installed_harness().await;
        harness.network.set_offline(true);

        let request = FetchRequest::navigate(url("/never-visited.html"));
        let response = respond(harness.router.handle_fetch(&request).await);

        let offline = stored(&harness, &url("/offline.html")).await.unwrap();
        assert_eq!(response, offline);
    }

    #[tokio::test]
    async fn test_navigation_offline_prefers_stored_page() {
        let harness = installed_harness().await;
        harness.network.set_offline(true);

        let request = FetchRequest::navigate(url("/about.html"));
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, body_of("/about.html"));
    }

    #[tokio::test]
    async fn test_navigation_error_status_is_returned_as_is() {
        let harness = installed_harness().await;
        let page = url("/missing.html");

        let request = FetchRequest::navigate(page.clone());
        let response = respond(harness.router.handle_fetch(&request).await);

        assert_eq!(response.status, 404);
        assert!(stored(&harness, &page).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_offline_page_gives_503() {
        let harness = harness();
        harness.network.set_offline(true);

        let request = FetchRequest::navigate(url("/index.html"));
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_one_network_fetch() {
        let harness = installed_harness().await;
        harness
            .router
            .handle_message(ControlMessage::ClearCache, None)
            .await;
        assert!(!harness.storage.has(VERSION).await.unwrap());

        let request = FetchRequest::get(url("/css/print.css"));
        let response = respond(harness.router.handle_fetch(&request).await);

        assert_eq!(response.body, body_of("/css/print.css"));
        assert_eq!(harness.network.calls(), vec![request.url.to_string()]);
        assert!(stored(&harness, &request.url).await.is_some());
    }

    #[tokio::test]
    async fn test_chapter_bad_status_falls_back_to_cache() {
        let harness = installed_harness().await;
        let chapter = url("/chapters/chapter1.html");
        harness
            .network
            .respond(chapter.as_str(), CachedResponse::new(500, "oops"));

        let response =
            respond(harness.router.handle_fetch(&FetchRequest::get(chapter)).await);
        assert_eq!(response.body, body_of("/chapters/chapter1.html"));
    }

    #[tokio::test]
    async fn test_chapter_offline_without_copy_serves_offline_page() {
        let harness = installed_harness().await;
        harness.network.set_offline(true);

        let request = FetchRequest::get(url("/chapters/chapter9.html"));
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, body_of("/offline.html"));
    }

    #[tokio::test]
    async fn test_chapter_online_refreshes_copy() {
        let harness = installed_harness().await;
        let chapter = url("/chapters/chapter4.html");
        harness.network.respond_ok(chapter.as_str(), "chapter 4, second edition");

        harness
            .router
            .handle_fetch(&FetchRequest::get(chapter.clone()))
            .await;
        assert_eq!(
            stored(&harness, &chapter).await.map(|r| r.body),
            Some("chapter 4, second edition".into())
        );
    }

    #[tokio::test]
    async fn test_external_resource_offline() {
        let harness = harness();
        let font = Url::parse(
            "https://fonts.googleapis.com/css2?family=Cairo&display=swap",
        )
        .unwrap();
        harness.network.respond_ok(font.as_str(), "font css");

        let request = FetchRequest::get(font.clone());
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, "font css");
        assert!(stored(&harness, &font).await.is_some());

        harness.network.set_offline(true);
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, "font css");

        let other_font =
            Url::parse("https://fonts.googleapis.com/css2?family=Amiri").unwrap();
        let response = respond(
            harness
                .router
                .handle_fetch(&FetchRequest::get(other_font))
                .await,
        );
        assert_eq!(response, CachedResponse::not_found());
    }

    #[tokio::test]
    async fn test_other_stores_same_origin_only() {
        let harness = harness();
        let image = url("/assets/images/diagram.png");
        let cdn = Url::parse("https://cdn.example.com/lib.js").unwrap();
        harness.network.respond_ok(image.as_str(), "png");
        harness.network.respond_ok(cdn.as_str(), "js");

        for target in [&image, &cdn] {
            let request = FetchRequest::get(target.clone());
            respond(harness.router.handle_fetch(&request).await);
        }
        assert!(stored(&harness, &image).await.is_some());
        assert!(stored(&harness, &cdn).await.is_none());

        harness.network.set_offline(true);
        let response = respond(
            harness
                .router
                .handle_fetch(&FetchRequest::get(cdn.clone()))
                .await,
        );
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_core_file_total_failure_gives_empty_404() {
        let harness = harness();
        harness.network.set_offline(true);

        let request = FetchRequest::get(url("/style.css"));
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response, CachedResponse::not_found());
    }

    #[tokio::test]
    async fn test_passthrough_for_non_get_and_non_http() {
        let harness = installed_harness().await;

        let post =
            FetchRequest::get(url("/api/progress")).with_method(Method::POST);
        assert_eq!(
            harness.router.handle_fetch(&post).await,
            FetchDisposition::Passthrough
        );

        let ws = FetchRequest::get(Url::parse("ws://book.test/live").unwrap());
        assert_eq!(
            harness.router.handle_fetch(&ws).await,
            FetchDisposition::Passthrough
        );
        assert!(harness.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_store_still_serves_after_failed_install() {
        let storage = MemoryCacheStorage::new();
        let old = storage.open("programming-book-v1.0.0").await.unwrap();
        old.put(
            &RequestKey::get(&url("/offline.html")),
            CachedResponse::new(200, "old offline page"),
        )
        .await
        .unwrap();
        let network = book_network();
        network.set_offline(true);
        let harness = harness_with(network, storage, VERSION);

        assert!(harness.router.handle_install().await.is_err());
        let request = FetchRequest::navigate(url("/toc.html"));
        let response = respond(harness.router.handle_fetch(&request).await);
        assert_eq!(response.body, "old offline page");
    }
}
