//! End-to-end ingestion tests over a temporary store root.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use mailbin_core::{Config, Envelope, Pipeline, STATUS_OK, STATUS_UNPARSEABLE};

fn config(domains: &[&str], discard_unknown: bool) -> Config {
    Config {
        discard_unknown,
        domains: domains.iter().map(ToString::to_string).collect(),
        url: "https://mail.example.com".to_string(),
        ..Config::default()
    }
}

fn envelope(rcpts: &[&str], content: &[u8]) -> Envelope {
    let peer: SocketAddr = "192.0.2.7:41000".parse().unwrap();
    Envelope {
        peer,
        mail_from: "sender@example.com".to_string(),
        rcpt_tos: rcpts.iter().map(ToString::to_string).collect(),
        content: content.to_vec(),
    }
}

/// One plaintext body, one HTML body referencing `cid:xyz`, one inline PNG
/// with `Content-ID: <xyz>`.
const RAW_MESSAGE: &str = concat!(
    "From: Sender <sender@example.com>\r\n",
    "To: rcpt@example.com\r\n",
    "Subject: inline image\r\n",
    "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
    "\r\n",
    "--outer\r\n",
    "Content-Type: text/plain; charset=utf-8\r\n",
    "\r\n",
    "plain version\r\n",
    "--outer\r\n",
    "Content-Type: text/html; charset=utf-8\r\n",
    "\r\n",
    "<p>see <img src=\"cid:xyz\"></p>\r\n",
    "--outer\r\n",
    "Content-Type: image/png; name=\"pixel.png\"\r\n",
    "Content-Transfer-Encoding: base64\r\n",
    "Content-ID: <xyz>\r\n",
    "\r\n",
    "cGl4ZWxieXRlcw==\r\n",
    "--outer--\r\n"
);

#[tokio::test]
async fn ingest_persists_one_record_per_accepted_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&config(&["example.com"], true), dir.path());

    let envelope = envelope(
        &["Rcpt@Example.com", "other@evil.org", "not-an-address"],
        RAW_MESSAGE.as_bytes(),
    );
    assert_eq!(pipeline.ingest(&envelope).await, STATUS_OK);

    // Only the allow-listed recipient got a directory, lowercased.
    let recipients: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(recipients, vec!["rcpt@example.com"]);

    let rcpt_dir = dir.path().join("rcpt@example.com");
    let records: Vec<_> = std::fs::read_dir(&rcpt_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    assert_eq!(records.len(), 1);

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&records[0]).unwrap()).unwrap();

    assert_eq!(json["sender_ip"], "192.0.2.7");
    assert_eq!(json["from"], "Sender <sender@example.com>");
    assert_eq!(json["rcpts"].as_array().unwrap().len(), 3);
    assert_eq!(json["parsed"]["subject"], "inline image");
    assert_eq!(json["parsed"]["body"], "plain version");

    // The inline reference was rewritten for this recipient.
    let millis = records[0].file_stem().unwrap().to_str().unwrap().to_string();
    let htmlbody = json["parsed"]["htmlbody"].as_str().unwrap();
    assert!(!htmlbody.contains("cid:xyz"));
    assert!(htmlbody.contains(&format!("/api/attachment/rcpt@example.com/{millis}-pixel.png")));

    // One attachment descriptor with matching identity and size.
    let details = json["parsed"]["attachments_details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["filename"], "pixel.png");
    assert_eq!(details[0]["cid"], "xyz");
    assert_eq!(details[0]["size"], 10); // len of "pixelbytes"
    let fid = details[0]["id"].as_str().unwrap();
    assert_eq!(
        details[0]["download_url"].as_str().unwrap(),
        format!("https://mail.example.com/api/attachment/rcpt@example.com/{fid}")
    );
    assert_eq!(json["parsed"]["attachments"][0], fid);

    // The blob itself landed under attachments/, decoded.
    let blob = std::fs::read(rcpt_dir.join("attachments").join(fid)).unwrap();
    assert_eq!(blob, b"pixelbytes");
}

#[tokio::test]
async fn ingest_with_zero_accepted_recipients_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&config(&["example.com"], true), dir.path());

    let envelope = envelope(&["other@evil.org"], RAW_MESSAGE.as_bytes());
    assert_eq!(pipeline.ingest(&envelope).await, STATUS_OK);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn ingest_accepts_unknown_domain_when_not_discarding() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&config(&["example.com"], false), dir.path());

    let envelope = envelope(&["other@evil.org"], RAW_MESSAGE.as_bytes());
    assert_eq!(pipeline.ingest(&envelope).await, STATUS_OK);

    assert!(dir.path().join("other@evil.org").is_dir());
}

#[tokio::test]
async fn ingest_keeps_envelope_when_one_attachment_fails_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&config(&["example.com"], true), dir.path());

    let raw = concat!(
        "Subject: broken attachment\r\n",
        "Content-Type: multipart/mixed; boundary=\"b\"\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "body survives\r\n",
        "--b\r\n",
        "Content-Type: image/png; name=\"broken.png\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "!!!not-base64!!!\r\n",
        "--b--\r\n"
    );
    let envelope = envelope(&["rcpt@example.com"], raw.as_bytes());
    assert_eq!(pipeline.ingest(&envelope).await, STATUS_OK);

    let rcpt_dir = dir.path().join("rcpt@example.com");
    let record = std::fs::read_dir(&rcpt_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&record).unwrap()).unwrap();
    assert_eq!(json["parsed"]["body"], "body survives");

    // The undecodable payload is stored raw rather than dropped.
    let details = json["parsed"]["attachments_details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    let fid = details[0]["id"].as_str().unwrap();
    let blob = std::fs::read(rcpt_dir.join("attachments").join(fid)).unwrap();
    assert_eq!(blob, b"!!!not-base64!!!");
}

#[tokio::test]
async fn ingest_rejects_unparseable_payload() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&config(&[], false), dir.path());

    let envelope = envelope(&["rcpt@example.com"], &[0x80, 0xFF, 0x01]);
    assert_eq!(pipeline.ingest(&envelope).await, STATUS_UNPARSEABLE);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn concurrent_ingestion_for_same_new_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(Pipeline::new(&config(&["example.com"], true), dir.path()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let envelope = envelope(&["fresh@example.com"], RAW_MESSAGE.as_bytes());
            pipeline.ingest(&envelope).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), STATUS_OK);
    }

    // The recipient directory exists exactly once and holds at least one
    // record (same-millisecond ingestions may have collided by design).
    assert!(dir.path().join("fresh@example.com").is_dir());
    let records = std::fs::read_dir(dir.path().join("fresh@example.com"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .count();
    assert!(records >= 1);
}
