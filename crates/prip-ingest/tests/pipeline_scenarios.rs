//! End-to-end ingestion against the memory and local-file backends

use std::sync::Arc;

use prip_ingest::providers::{ContentsProvider, LocalContents, MemoryContents};
use prip_ingest::{Error, InboundDocument, InboundEvent, IngestPipeline, PripConfig, RecordStore};
use tempfile::TempDir;

fn memory_pipeline() -> (IngestPipeline, Arc<MemoryContents>) {
    let memory = Arc::new(MemoryContents::new());
    let pipeline =
        IngestPipeline::new(&PripConfig::default(), RecordStore::new(memory.clone())).unwrap();
    (pipeline, memory)
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let mut document = docx_rs::Docx::new();
    for text in paragraphs {
        document = document
            .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)));
    }

    let mut buffer = std::io::Cursor::new(Vec::new());
    document.build().pack(&mut buffer).unwrap();
    buffer.into_inner()
}

#[tokio::test]
async fn novorossiysk_notice_from_text() {
    let (pipeline, _) = memory_pipeline();
    let text = "ПРИП Новороссийск № 17\n44°37,50' N 37°45,00' E\nНекое описание\nNNNN";

    let record = pipeline.ingest_text(text).await.unwrap();

    assert_eq!(record.title, "ПРИП Новороссийск № 17");
    assert_eq!(record.section, "ПРИП Новороссийск");
    assert_eq!(record.number, Some(17));
    assert!((record.lat - 44.625).abs() < 1e-6);
    assert!((record.lng - 37.75).abs() < 1e-6);
    assert!(!record.full_text.contains("NNNN"));
    assert!(record.full_text.ends_with("Некое описание"));

    let stored = pipeline.store().load().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.entries()[0]["fullText"], record.full_text.as_str());
    assert_eq!(stored.entries()[0]["number"], 17);
}

#[tokio::test]
async fn manual_command_record() {
    let (pipeline, memory) = memory_pipeline();

    let reply = pipeline
        .handle(InboundEvent::message("/add Точка | 55.752 | 37.623 | у реки"))
        .await
        .unwrap();
    assert!(reply.starts_with("✅ Добавлено: Точка"));

    let records = pipeline.store().load().await.unwrap().records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.lat, 55.752);
    assert_eq!(record.lng, 37.623);
    assert_eq!(record.desc, "у реки");
    assert_eq!(record.number, None);
    assert_eq!(record.section, "Other");

    let stored = pipeline.store().load().await.unwrap();
    assert!(stored.entries()[0]["number"].is_null());
    assert_eq!(memory.commits(), vec!["add PRIP: Точка"]);
}

#[tokio::test]
async fn docx_without_coordinates_leaves_collection_unchanged() {
    let existing = r#"[{"title": "earlier", "lat": 1.0, "lng": 2.0}]"#;
    let memory = Arc::new(MemoryContents::with_content(existing));
    let pipeline =
        IngestPipeline::new(&PripConfig::default(), RecordStore::new(memory.clone())).unwrap();

    let document = InboundDocument::new(
        "notice.docx",
        docx(&["ПРИП Новороссийск № 3", "Учения в районе порта, координаты позже"]),
    );
    let err = pipeline.ingest_document(&document).await.unwrap_err();

    assert!(matches!(err, Error::CoordinatesNotFound));
    assert_eq!(memory.snapshot().unwrap(), existing.as_bytes());
    assert!(memory.commits().is_empty());
}

#[tokio::test]
async fn docx_notice_is_appended() {
    let (pipeline, _) = memory_pipeline();
    let reply = pipeline
        .handle(InboundEvent::document(
            "prip.DOCX",
            docx(&[
                "НАВИП № 204",
                "Район 44°30' N 037°50' E",
                "Подводные работы",
                "НННН",
                "Дежурный",
            ]),
        ))
        .await
        .unwrap();

    assert!(reply.contains("НАВИП № 204"));
    assert!(reply.contains("44°30,00' N 37°50,00' E"));

    let record = &pipeline.store().load().await.unwrap().records()[0];
    assert_eq!(record.section, "НАВИП");
    assert_eq!(record.desc, "Район 44°30' N 037°50' E\nПодводные работы");
}

#[tokio::test]
async fn rtf_notice_with_cyrillic_codepage() {
    let (pipeline, _) = memory_pipeline();
    let rtf = concat!(
        r"{\rtf1\ansi\ansicpg1251\deff0{\fonttbl{\f0 Times New Roman;}}",
        r"\pard \'cf\'d0\'c8\'cf \'cd\'ee\'e2\'ee\'f0\'ee\'f1\'f1\'e8\'e9\'f1\'ea № 9\par",
        r"44\'b037,50' N 037\'b045,00' E\par",
        r"NNNN\par}"
    );

    let record = pipeline
        .ingest_document(&InboundDocument::new("prip.rtf", rtf.as_bytes()))
        .await
        .unwrap();

    assert_eq!(record.section, "ПРИП Новороссийск");
    assert_eq!(record.title, "ПРИП Новороссийск № 9");
    assert!((record.lat - 44.625).abs() < 1e-6);
}

#[tokio::test]
async fn sequential_appends_on_local_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("prips.json");
    let local = Arc::new(LocalContents::new(&path));
    let pipeline =
        IngestPipeline::new(&PripConfig::default(), RecordStore::new(local.clone())).unwrap();

    for n in 1..=4 {
        let text = format!("ПРИП № {}\n44°0{}' N 37°00' E", n, n);
        pipeline.ingest_text(&text).await.unwrap();
    }

    let records = pipeline.store().load().await.unwrap().records();
    let numbers: Vec<_> = records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![Some(4), Some(3), Some(2), Some(1)]);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n  {\n    \"id\": "));
}

#[tokio::test]
async fn malformed_remote_content_recovers() {
    let memory = Arc::new(MemoryContents::with_content("<<< merge conflict >>>"));
    let pipeline =
        IngestPipeline::new(&PripConfig::default(), RecordStore::new(memory.clone())).unwrap();

    pipeline
        .ingest_text("ПРИП\n44°37,50' N 37°45,00' E")
        .await
        .unwrap();

    let fetched = memory.fetch().await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&fetched.content).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(1));
}
