use std::collections::HashMap;
use std::sync::{Mutex, Once};
use std::time::Duration;

use capture_engine::{
    CaptureError, CaptureProgressSink, CaptureSettings, CaptureStage, DocumentSource,
    NullProgressSink, RenderCapture, SanitizeSettings, TRUNCATION_MARKER,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(agent_logging::initialize_for_tests);
}

fn fast_settings() -> CaptureSettings {
    CaptureSettings {
        framework_timeout: Duration::from_millis(60),
        key_element_timeout: Duration::from_millis(60),
        stabilize_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(5),
        sample_interval: Duration::from_millis(5),
        settle_delay: Duration::from_millis(10),
        stable_samples: 3,
        sanitize: SanitizeSettings::default(),
    }
}

/// A document whose serialized form is replayed frame by frame; the last
/// frame repeats forever.
struct ScriptedDocument {
    frames: Mutex<Vec<String>>,
    marker: bool,
    texts: HashMap<&'static str, &'static str>,
}

impl ScriptedDocument {
    fn new(frames: Vec<&str>) -> Self {
        Self {
            frames: Mutex::new(frames.into_iter().map(String::from).collect()),
            marker: false,
            texts: HashMap::new(),
        }
    }

    fn with_marker(mut self) -> Self {
        self.marker = true;
        self
    }

    fn with_text(mut self, selector: &'static str, text: &'static str) -> Self {
        self.texts.insert(selector, text);
        self
    }
}

#[async_trait::async_trait]
impl DocumentSource for ScriptedDocument {
    async fn serialize(&self) -> Result<String, CaptureError> {
        let mut frames = self.frames.lock().expect("frames lock");
        if frames.len() > 1 {
            Ok(frames.remove(0))
        } else {
            frames
                .first()
                .cloned()
                .ok_or_else(|| CaptureError::Source("no document".into()))
        }
    }

    async fn element_child_count(&self, _selector: &str) -> Result<usize, CaptureError> {
        Ok(0)
    }

    async fn inner_text(&self, selector: &str) -> Result<String, CaptureError> {
        Ok(self.texts.get(selector).copied().unwrap_or("").to_string())
    }

    async fn has_framework_marker(&self) -> Result<bool, CaptureError> {
        Ok(self.marker)
    }
}

struct RecordingSink {
    stages: Mutex<Vec<CaptureStage>>,
}

impl CaptureProgressSink for RecordingSink {
    fn stage_started(&self, stage: CaptureStage) {
        self.stages.lock().expect("stage lock").push(stage);
    }
}

#[tokio::test]
async fn capture_waits_for_stability_then_sanitizes() {
    init_logging();
    let doc = ScriptedDocument::new(vec![
        "<body><p>loading</p></body>",
        "<body><p>loading more</p></body>",
        "<body><main id=\"m\">final content of the page, long enough to matter</main></body>",
    ])
    .with_marker()
    .with_text("main", "final content of the page, long enough to matter");

    let capture = RenderCapture::new(fast_settings());
    let snapshot = capture.capture(&doc, &NullProgressSink).await.unwrap();

    assert_eq!(
        snapshot,
        "<main id=\"m\">final content of the page, long enough to matter</main>"
    );
}

#[tokio::test]
async fn all_stage_timeouts_degrade_to_a_best_effort_snapshot() {
    init_logging();
    // No framework marker, no key element text, and a document that never
    // stabilizes: sizes keep alternating until every budget runs out.
    let mut frames = Vec::new();
    for i in 0..200 {
        frames.push(if i % 2 == 0 {
            "<body><p id=\"a\">tick</p></body>"
        } else {
            "<body><p id=\"a\">tick tock tick</p></body>"
        });
    }
    let doc = ScriptedDocument::new(frames);

    let capture = RenderCapture::new(fast_settings());
    let snapshot = capture.capture(&doc, &NullProgressSink).await.unwrap();

    assert!(snapshot.contains("<p id=\"a\">"), "got: {snapshot}");
}

#[tokio::test]
async fn capture_reports_stages_in_order() {
    init_logging();
    let doc = ScriptedDocument::new(vec!["<body><div id=\"x\">steady</div></body>"]).with_marker();
    let sink = RecordingSink {
        stages: Mutex::new(Vec::new()),
    };

    let capture = RenderCapture::new(fast_settings());
    capture.capture(&doc, &sink).await.unwrap();

    let stages = sink.stages.lock().unwrap().clone();
    assert_eq!(
        stages,
        vec![
            CaptureStage::FrameworkDetection,
            CaptureStage::KeyElement,
            CaptureStage::Stabilization,
            CaptureStage::Snapshot,
        ]
    );
}

#[tokio::test]
async fn oversized_snapshots_are_truncated_with_marker() {
    init_logging();
    let paragraphs: String = (0..2_000)
        .map(|i| format!("<p id=\"p{i}\">row {i} content</p>"))
        .collect();
    let html = format!("<body><div id=\"list\">{paragraphs}</div></body>");
    let frame: &str = &html;
    let doc = ScriptedDocument::new(vec![frame]);

    let settings = fast_settings();
    let max_bytes = settings.sanitize.max_bytes;
    let capture = RenderCapture::new(settings);
    let snapshot = capture.capture(&doc, &NullProgressSink).await.unwrap();

    assert!(snapshot.ends_with(TRUNCATION_MARKER));
    assert!(snapshot.len() <= max_bytes + TRUNCATION_MARKER.len());
}
