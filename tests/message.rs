use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine};
use mailer::{
    message::{Encoding, File, MessageSettings},
    FileTemplates, Message, TemplateEngine,
};
use pretty_assertions::assert_eq;
use quoted_printable::ParseMode;

fn formatted(message: &Message) -> String {
    String::from_utf8(message.formatted().unwrap()).unwrap()
}

fn base_message() -> Message {
    Message::new()
        .from("alex@example.com", "Alex")
        .to(["kim@example.org"])
        .subject("Report")
}

#[test]
fn single_part_has_no_boundary() {
    let message = base_message().body("Hello Kim", false);
    let out = formatted(&message);

    assert_eq!(out.matches("Content-Type: text/plain; charset=UTF-8\r\n").count(), 1);
    assert!(!out.contains("multipart/"));
    assert!(out.starts_with("Mime-Version: 1.0\r\nDate: "));
    assert!(out.ends_with("\r\n\r\nHello Kim"));
}

#[test]
fn alternatives_keep_their_order() {
    let mut message = base_message();
    message.set_body("text/plain", "plain");
    message.add_alternative("text/html", "<p>html</p>");
    let out = formatted(&message);

    assert_eq!(out.matches("multipart/alternative").count(), 1);
    let plain = out.find("Content-Type: text/plain").unwrap();
    let html = out.find("Content-Type: text/html").unwrap();
    assert!(plain < html);
    assert!(out.ends_with("--\r\n"));
}

#[test]
fn two_attachments_are_mixed() {
    let mut message = base_message();
    message.attach(File::from_bytes("a.txt", "first"));
    message.attach(File::from_bytes("b.pdf", "second"));
    let out = formatted(&message);

    assert_eq!(out.matches("multipart/mixed").count(), 1);
    assert!(!out.contains("multipart/alternative"));
    assert!(out.contains("Content-Type: text/plain; name=\"a.txt\"\r\n"));
    assert!(out.contains("Content-Type: application/pdf; name=\"b.pdf\"\r\n"));
    assert_eq!(
        out.matches("Content-Transfer-Encoding: base64\r\n").count(),
        2
    );
    assert!(out.contains("Content-Disposition: attachment; filename=\"b.pdf\"\r\n"));
}

#[test]
fn embedded_file_and_attachment_are_mixed() {
    let mut message = base_message();
    message.embed(File::from_bytes("a.png", "a"));
    message.attach(File::from_bytes("b.txt", "b"));
    let out = formatted(&message);

    assert_eq!(out.matches("multipart/mixed").count(), 1);
    assert!(!out.contains("multipart/related"));
    assert!(!out.contains("YQ==Content-Type"));

    let (headers, body) = out.split_once("\r\n\r\n").unwrap();
    let boundary = headers
        .split_once("boundary=")
        .map(|(_, boundary)| boundary.trim_end())
        .unwrap();
    assert_eq!(body.matches(&format!("--{boundary}\r\n")).count(), 2);
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));

    let png = body.find("Content-ID: <a.png>\r\n").unwrap();
    let txt = body.find("Content-Disposition: attachment; filename=\"b.txt\"").unwrap();
    assert!(png < txt);
}

#[test]
fn full_nesting() {
    let mut message = base_message();
    message.set_body("text/plain", "plain");
    message.add_alternative("text/html", "<img src=\"cid:logo.png\">");
    message.embed(File::from_bytes("logo.png", vec![0x89, b'P', b'N', b'G']));
    message.attach(File::from_bytes("notes.txt", "notes"));
    let out = formatted(&message);

    let mixed = out.find("multipart/mixed").unwrap();
    let related = out.find("multipart/related").unwrap();
    let alternative = out.find("multipart/alternative").unwrap();
    assert!(mixed < related && related < alternative);

    assert!(out.contains("Content-ID: <logo.png>\r\n"));
    assert!(out.contains("Content-Disposition: inline; filename=\"logo.png\"\r\n"));
    assert!(out.contains("Content-Disposition: attachment; filename=\"notes.txt\"\r\n"));

    // embedded files close the related part before the attachment
    let logo = out.find("logo.png\"\r\n").unwrap();
    let notes = out.find("notes.txt").unwrap();
    assert!(logo < notes);
}

#[test]
fn base64_lines_decode_to_the_content() {
    let content: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let mut message = base_message();
    message.attach(File::from_bytes("data.bin", content.clone()));
    let out = formatted(&message);

    let (headers, body) = out.split_once("\r\n\r\n").unwrap();
    assert!(headers.contains("Content-Type: application/octet-stream; name=\"data.bin\""));

    let lines: Vec<&str> = body.split("\r\n").collect();
    assert!(lines.len() > 1);
    assert!(lines.iter().all(|line| line.len() <= 76));
    assert_eq!(STANDARD.decode(lines.concat()).unwrap(), content);
}

#[test]
fn attachment_read_at_write_time() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    let name = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let mut message = base_message();
    message.attach(File::from_path(file.path()));
    file.write_all(b"written later").unwrap();
    file.flush().unwrap();

    let out = formatted(&message);
    assert!(out.contains(&format!("filename=\"{name}\"")));
    assert!(out.contains(&STANDARD.encode("written later")));
}

#[test]
fn missing_attachment_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut message = base_message();
    message.attach(File::from_path(dir.path().join("missing.pdf")));

    assert!(message.formatted().is_err());
}

#[test]
fn non_ascii_subject_is_encoded() {
    let message = Message::with_settings(MessageSettings {
        charset: "UTF-8".to_owned(),
        encoding: Encoding::Base64,
    })
    .subject("Grüße");
    let out = formatted(&message);

    let subject = out
        .lines()
        .find_map(|line| line.strip_prefix("Subject: "))
        .unwrap();
    let word = subject
        .strip_prefix("=?UTF-8?b?")
        .and_then(|word| word.strip_suffix("?="))
        .unwrap();
    assert_eq!(STANDARD.decode(word).unwrap(), "Grüße".as_bytes());
    assert!(out.is_ascii());
}

/// Returns the unfolded value of the first `name` header
fn header_value(out: &str, name: &str) -> String {
    let prefix = format!("{name}: ");
    let start = out.find(&prefix).unwrap();
    let mut end = start + out[start..].find("\r\n").unwrap();
    while out[end + 2..].starts_with(' ') {
        end += 2 + out[end + 2..].find("\r\n").unwrap();
    }
    let folded = &out[start..end];
    assert!(
        folded.split("\r\n").all(|line| line.len() <= 76),
        "{folded}"
    );
    folded.replace("\r\n ", " ")[prefix.len()..].to_owned()
}

fn decode_words(value: &str) -> String {
    let mut decoded = Vec::new();
    for word in value.split(' ') {
        let word = word.strip_prefix("=?UTF-8?").unwrap().strip_suffix("?=").unwrap();
        match word.split_at(2) {
            ("b?", content) => decoded.extend(STANDARD.decode(content).unwrap()),
            ("q?", content) => decoded.extend(
                quoted_printable::decode(content.replace('_', " "), ParseMode::Robust).unwrap(),
            ),
            _ => panic!("not an encoded word: {word}"),
        }
    }
    String::from_utf8(decoded).unwrap()
}

#[test]
fn long_non_ascii_subject_is_folded_between_words() {
    let subjects = [
        "é".repeat(50),
        "Prüfbericht für die Qualitätssicherung, Überblick ".repeat(4),
    ];
    for encoding in [Encoding::QuotedPrintable, Encoding::Base64] {
        for subject in &subjects {
            let message = Message::with_settings(MessageSettings {
                charset: "UTF-8".to_owned(),
                encoding,
            })
            .subject(subject);
            let out = formatted(&message);

            let value = header_value(&out, "Subject");
            assert!(value.split(' ').count() > 1);
            assert_eq!(&decode_words(&value), subject);
        }
    }
}

#[test]
fn ascii_subject_is_unchanged() {
    let out = formatted(&base_message());
    assert!(out.contains("\r\nSubject: Report\r\n"));
}

#[test]
fn long_headers_are_folded() {
    let subject = "lorem ipsum dolor sit amet ".repeat(8);
    let subject = subject.trim_end();
    let out = formatted(&Message::new().subject(subject));

    let start = out.find("Subject: ").unwrap();
    let mut end = start + out[start..].find("\r\n").unwrap();
    while out[end + 2..].starts_with(' ') {
        end += 2 + out[end + 2..].find("\r\n").unwrap();
    }
    let folded = &out[start..end];

    assert!(folded.contains("\r\n "));
    assert!(folded.split("\r\n").all(|line| line.len() <= 76));
    assert_eq!(
        folded.replace("\r\n ", " "),
        format!("Subject: {subject}")
    );
}

#[test]
fn bcc_is_not_written() {
    let mut message = base_message();
    message.set_header("Bcc", ["hidden@example.org"]);
    let out = formatted(&message);

    assert!(!out.contains("Bcc"));
    assert_eq!(
        message.recipients().unwrap()[1].to_string(),
        "hidden@example.org"
    );
}

#[test]
fn reset_keeps_settings() {
    let mut message = Message::with_settings(MessageSettings {
        charset: "ISO-8859-1".to_owned(),
        encoding: Encoding::Base64,
    })
    .from("alex@example.com", "")
    .body("Hello", false);
    message.reset();

    assert!(message.headers().is_empty());
    assert!(message.parts().is_empty());
    assert_eq!(message.charset(), "ISO-8859-1");
    assert_eq!(message.encoding(), Encoding::Base64);
    assert!(message.from_address().is_err());
}

#[test]
fn templated_body() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("welcome.html"),
        "<p>Welcome {{ user.name }}</p>",
    )
    .unwrap();
    let templates = FileTemplates::new(dir.path());

    let mut message = base_message();
    let body = message
        .format_html(
            &templates,
            "welcome.html",
            &serde_json::json!({ "user": { "name": "<Kim>" } }),
        )
        .unwrap();
    message.set_body("text/html", body);

    let out = formatted(&message);
    assert!(out.contains("Content-Type: text/html; charset=UTF-8\r\n"));
    assert!(out.ends_with("<p>Welcome &lt;Kim&gt;</p>"));
    assert!(templates.render("missing.html", &()).is_err());
}
