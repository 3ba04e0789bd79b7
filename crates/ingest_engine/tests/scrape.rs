mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::ImageFormat;
use ingest_core::{ImageFailure, ImageRecord, ImageStage, ObjectRole, FORMAT_READ, STREAM_NEWS};
use ingest_engine::{
    content_digest, DerivativeGenerator, EngineEvent, FailureKind, JobProgress, RasterDerivatives,
    ScrapeError, Scraper, Stage,
};
use pretty_assertions::assert_eq;
use support::{article_html, encoded, CallLog, MemoryStore, RecordingSink, StubFetcher};

const PAGE: &str = "https://news.example.com/world/storm";
const IMAGE: &str = "https://cdn.example.com/lead.jpg";

struct Harness {
    log: CallLog,
    store: MemoryStore,
    pages: StubFetcher,
    images: StubFetcher,
}

impl Harness {
    fn new() -> Self {
        support::init_logging();
        let log = CallLog::default();
        let store = MemoryStore::new(log.clone());
        Self {
            pages: StubFetcher::new(log.clone()),
            images: StubFetcher::new(log.clone()).serving_store(store.clone(), support::location()),
            store,
            log,
        }
    }

    fn page(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages = self.pages.serve(url, content_type, body);
        self
    }

    fn image(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.images = self.images.serve(url, content_type, body);
        self
    }

    fn scraper(&self) -> Scraper {
        Scraper::builder(support::config(), Arc::new(self.store.clone()))
            .page_fetcher(Arc::new(self.pages.clone()))
            .image_fetcher(Arc::new(self.images.clone()))
            .build()
    }
}

fn public(key: &str) -> String {
    format!("https://s3-r.amazonaws.com/b/{key}")
}

fn image_stages(events: Vec<EngineEvent>) -> Vec<Stage> {
    let mut stages: Vec<Stage> = Vec::new();
    for event in events {
        if let EngineEvent::Progress(JobProgress { stage, .. }) = event {
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
        }
    }
    stages
}

#[tokio::test]
async fn article_with_opengraph_image_is_fully_ingested() {
    let source = encoded(2000, 1000, ImageFormat::Jpeg);
    let expected_hash =
        content_digest(&RasterDerivatives.resize_original(&source, 1340).unwrap());
    let harness = Harness::new()
        .page(PAGE, "text/html; charset=utf-8", article_html(Some("//cdn.example.com/lead.jpg")))
        .image(IMAGE, "image/jpeg", source);

    let sink = RecordingSink::default();
    let article = harness.scraper().scrape(1, PAGE, &sink).await.unwrap();

    assert_eq!(article.url, PAGE);
    assert_eq!(article.title.as_deref(), Some("Storm hits coast"));
    assert!(article.description.starts_with("Storm hits coast Heavy rain & wind"));
    assert!(!article.description.contains("Menu"));
    assert_eq!(article.format, FORMAT_READ);
    assert_eq!(article.stream, STREAM_NEWS);
    assert!(article.processing);

    let orig_key = format!("{expected_hash}-orig.jpg");
    let thumb_key = format!("{expected_hash}-thumb.JPEG");
    assert_eq!(
        article.images,
        vec![ImageRecord::Available {
            content_type: "image/jpeg".to_string(),
            extension: "jpg".to_string(),
            hash: expected_hash.clone(),
            orig: public(&orig_key),
            thumb: Some(public(&thumb_key)),
        }]
    );

    assert_eq!(harness.store.keys(), vec![orig_key.clone(), thumb_key.clone()]);
    let thumb = harness.store.get(&thumb_key).unwrap();
    assert_eq!(thumb.content_type, "image/jpeg");
    let thumb_img = image::load_from_memory(&thumb.body).unwrap();
    assert_eq!((thumb_img.width(), thumb_img.height()), (400, 224));
    let orig = harness.store.get(&orig_key).unwrap();
    assert_eq!(content_digest(&orig.body), expected_hash);

    assert_eq!(
        image_stages(sink.take()),
        vec![
            Stage::FetchingPage,
            Stage::Extracting,
            Stage::ResolvingImage,
            Stage::Image(ImageStage::Acquiring),
            Stage::Image(ImageStage::Validating),
            Stage::Image(ImageStage::ResizingOriginal),
            Stage::Image(ImageStage::HashingOriginal),
            Stage::Image(ImageStage::UploadingOriginal),
            Stage::Image(ImageStage::GeneratingThumbnail),
            Stage::Image(ImageStage::UploadingThumbnail),
            Stage::Image(ImageStage::Done),
            Stage::Done,
        ]
    );
}

#[tokio::test]
async fn thumbnail_is_cut_from_the_acknowledged_original() {
    let source = encoded(1600, 900, ImageFormat::Png);
    let html = article_html(Some("https://cdn.example.com/lead.png"));
    let harness = Harness::new()
        .page(PAGE, "text/html", html)
        .image("https://cdn.example.com/lead.png", "image/png", source);

    let article = harness
        .scraper()
        .scrape(2, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    let hash = article.images[0].hash().unwrap().to_string();
    let orig_put = harness.log.position(&format!("put {hash}-orig.png")).unwrap();
    let orig_read = harness
        .log
        .position(&format!("fetch {}", public(&format!("{hash}-orig.png"))))
        .unwrap();
    let thumb_put = harness.log.position(&format!("put {hash}-thumb.JPEG")).unwrap();
    assert!(orig_put < orig_read);
    assert!(orig_read < thumb_put);
}

#[tokio::test]
async fn tiny_image_degrades_without_failing_the_article() {
    let harness = Harness::new()
        .page(PAGE, "text/html", article_html(Some(IMAGE)))
        .image(IMAGE, "image/jpeg", encoded(5, 5, ImageFormat::Jpeg));

    let article = harness
        .scraper()
        .scrape(3, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(
        article.images,
        vec![ImageRecord::Unavailable {
            content_type: "image/jpeg".to_string(),
            extension: "jpg".to_string(),
            hash: None,
            reason: ImageFailure::TooSmall {
                width: 5,
                height: 5
            },
        }]
    );
    assert!(harness.store.keys().is_empty());
}

#[tokio::test]
async fn oversized_resize_degrades_without_failing_the_article() {
    let harness = Harness::new()
        .page(PAGE, "text/html", article_html(Some(IMAGE)))
        .image(IMAGE, "image/png", encoded(10, 10_000, ImageFormat::Png));

    let article = harness
        .scraper()
        .scrape(13, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    assert!(matches!(
        &article.images[0],
        ImageRecord::Unavailable {
            reason: ImageFailure::Resize(_),
            hash: None,
            ..
        }
    ));
    assert!(harness.store.keys().is_empty());
}

#[tokio::test]
async fn missing_image_degrades_to_unavailable() {
    let harness = Harness::new().page(PAGE, "text/html", article_html(Some(IMAGE)));

    let article = harness
        .scraper()
        .scrape(4, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    let image = &article.images[0];
    assert!(matches!(
        image,
        ImageRecord::Unavailable {
            reason: ImageFailure::Fetch(_),
            hash: None,
            ..
        }
    ));
    assert_eq!(image.orig(), None);
    assert!(harness.store.keys().is_empty());
}

#[tokio::test]
async fn page_without_candidate_gets_placeholder() {
    let harness = Harness::new().page(PAGE, "text/html", article_html(None));

    let article = harness
        .scraper()
        .scrape(5, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(article.images, vec![ImageRecord::Placeholder]);
    assert_eq!(harness.log.entries(), vec![format!("fetch {PAGE}")]);
}

#[tokio::test]
async fn page_fetch_failure_aborts_before_any_write() {
    let harness = Harness::new();

    let err = harness
        .scraper()
        .scrape(6, PAGE, &RecordingSink::default())
        .await
        .unwrap_err();

    match err {
        ScrapeError::Fetch(fetch) => assert_eq!(fetch.kind, FailureKind::HttpStatus(404)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(harness.store.keys().is_empty());
}

#[tokio::test]
async fn unreadable_page_is_an_extraction_error() {
    let harness = Harness::new().page(
        PAGE,
        "text/html",
        "<html><body><script>x()</script></body></html>",
    );

    let err = harness
        .scraper()
        .scrape(7, PAGE, &RecordingSink::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Extraction(_)));
}

#[tokio::test]
async fn direct_image_url_is_ingested_without_text() {
    let url = "https://cdn.example.com/photos/harbour.png";
    let bytes = encoded(800, 600, ImageFormat::Png);
    let harness = Harness::new()
        .page(url, "image/png", bytes.clone())
        .image(url, "image/png", bytes);

    let article = harness
        .scraper()
        .scrape(8, url, &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(article.title, None);
    assert_eq!(article.content, None);
    assert_eq!(article.description, "");
    let image = &article.images[0];
    let hash = image.hash().unwrap();
    assert_eq!(image.orig(), Some(public(&format!("{hash}-orig.png")).as_str()));
    assert!(image.thumb().is_some());
}

#[tokio::test]
async fn thumbnail_upload_failure_keeps_the_original() {
    let harness = Harness::new()
        .page(PAGE, "text/html", article_html(Some(IMAGE)))
        .image(IMAGE, "image/jpeg", encoded(640, 480, ImageFormat::Jpeg));
    harness.store.fail_keys_ending_with("-thumb.JPEG");

    let article = harness
        .scraper()
        .scrape(9, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    let image = &article.images[0];
    let hash = image.hash().unwrap();
    assert_eq!(image.orig(), Some(public(&format!("{hash}-orig.jpg")).as_str()));
    assert_eq!(image.thumb(), None);
    assert_eq!(harness.store.keys(), vec![format!("{hash}-orig.jpg")]);
}

#[tokio::test]
async fn original_upload_failure_skips_the_thumbnail() {
    let harness = Harness::new()
        .page(PAGE, "text/html", article_html(Some(IMAGE)))
        .image(IMAGE, "image/jpeg", encoded(640, 480, ImageFormat::Jpeg));
    harness.store.fail_keys_ending_with("-orig.jpg");

    let article = harness
        .scraper()
        .scrape(10, PAGE, &RecordingSink::default())
        .await
        .unwrap();

    match &article.images[0] {
        ImageRecord::Unavailable {
            hash: Some(_),
            reason: ImageFailure::Storage { role, .. },
            ..
        } => assert_eq!(*role, ObjectRole::Original),
        other => panic!("unexpected image: {other:?}"),
    }
    assert!(!harness.log.entries().iter().any(|e| e.contains("-thumb.")));
}

#[tokio::test]
async fn scrape_with_hands_over_the_envelope_once() {
    let harness = Harness::new().page(PAGE, "text/html", article_html(None));
    let calls = AtomicUsize::new(0);

    harness
        .scraper()
        .scrape_with(11, PAGE, &RecordingSink::default(), |response| {
            calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(response.data.url, PAGE);
            assert_eq!(response.data.images.len(), 1);
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scrape_with_skips_the_callback_on_failure() {
    let harness = Harness::new();
    let calls = AtomicUsize::new(0);

    let result = harness
        .scraper()
        .scrape_with(12, PAGE, &RecordingSink::default(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
