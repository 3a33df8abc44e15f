extern crate mail_compose as mail;

use std::fs;

use mail::{
    default_impl::{simple_context, MemoryTransport},
    html::{HtmlReferenceRewriter, MatcherFinder},
    resolver::{CompositeResolver, EmbeddedResolver, FileResolver},
    Context, Email, MultipartKind,
};

const LOGO_LEN: usize = 5866;

fn embedded_resolver() -> EmbeddedResolver {
    let mut resolver = EmbeddedResolver::new("/");
    resolver.add_dir("./test_resources").unwrap();
    resolver
}

fn embedded_context() -> simple_context::Context {
    simple_context::new(
        "example.com",
        "t3st",
        CompositeResolver::new().with(embedded_resolver()),
    )
    .unwrap()
}

fn is_generated_cid(cid: &str) -> bool {
    cid.len() == 10 && cid.bytes().all(|bch| bch.is_ascii_lowercase())
}

fn cid_in(html: &str) -> &str {
    let start = html.find("src=\"cid:").unwrap() + "src=\"cid:".len();
    let end = start + html[start..].find('"').unwrap();
    &html[start..end]
}

#[test]
fn logo_is_embedded_from_embedded_resources() {
    let ctx = embedded_context();

    let mut email = Email::new(ctx);
    email
        .set_from("sender@example.com")
        .unwrap()
        .add_to("receiver@example.com")
        .unwrap()
        .set_html_msg(r#"<html><body><img src="images/logo.gif"></body></html>"#)
        .unwrap()
        .enable_image_embedding(false)
        .unwrap();

    let built = email.build().unwrap().clone();
    let mail = built.mail();

    // mixed[related[html, logo]]
    assert_eq!(mail.multipart_kind(), Some(MultipartKind::Mixed));
    assert_eq!(mail.sub_bodies().len(), 1);
    let related = &mail.sub_bodies()[0];
    assert_eq!(related.multipart_kind(), Some(MultipartKind::Related));
    assert_eq!(related.sub_bodies().len(), 2);

    let html = related.sub_bodies()[0].resource().unwrap().data().unwrap();
    let html = String::from_utf8(html.buffer().to_vec()).unwrap();
    let cid = cid_in(&html);
    assert!(is_generated_cid(cid), "unexpected cid: {}", cid);
    assert_eq!(
        html,
        format!(r#"<html><body><img src="cid:{}"></body></html>"#, cid)
    );

    let logo = built.find_by_content_id(cid).unwrap();
    assert_eq!(logo.media_type().essence_str(), "image/gif");
    assert_eq!(logo.buffer().len(), LOGO_LEN);
    assert_eq!(email.embeddings().len(), 1);
}

#[test]
fn html_template_is_embedded_from_files() {
    let html = fs::read_to_string("./test_resources/html/mail.html").unwrap();
    let ctx = simple_context::new(
        "example.com",
        "t3st",
        CompositeResolver::new().with(FileResolver::new("./test_resources/html")),
    )
    .unwrap();

    let mut email = Email::new(ctx);
    email
        .set_from("sender@example.com")
        .unwrap()
        .add_to("receiver@example.com")
        .unwrap()
        .set_text_msg("Hello!")
        .unwrap()
        .set_html_msg(&html)
        .unwrap()
        .set_reference_finder(MatcherFinder)
        .unwrap()
        .attach_file("./test_resources/docs/notes.txt")
        .unwrap();

    let built = email.build().unwrap().clone();
    let mail = built.mail();

    // mixed[related[alternative[text, html], logo, script], notes]
    assert_eq!(mail.multipart_kind(), Some(MultipartKind::Mixed));
    assert_eq!(mail.sub_bodies().len(), 2);
    let related = &mail.sub_bodies()[0];
    assert_eq!(related.multipart_kind(), Some(MultipartKind::Related));
    assert_eq!(related.sub_bodies().len(), 3);
    assert_eq!(
        related.sub_bodies()[0].multipart_kind(),
        Some(MultipartKind::Alternative)
    );

    let names = email
        .embeddings()
        .iter()
        .map(|embed| embed.name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["logo.gif", "app.js"]);

    let out = String::from_utf8(built.encode_into_bytes().unwrap()).unwrap();
    assert!(out.contains("src=\"cid:already-embedded\""));
    assert!(out.contains("Content-Disposition: attachment; filename=\"notes.txt\"\r\n"));
    assert!(out.contains("Content-Disposition: inline; filename=\"logo.gif\"\r\n"));
    assert!(out.contains("Content-Type: image/gif\r\nContent-Transfer-Encoding: base64\r\n"));
    assert_not_contains_bare_lf(&out);
}

fn assert_not_contains_bare_lf(out: &str) {
    let bytes = out.as_bytes();
    for (idx, bch) in bytes.iter().enumerate() {
        if *bch == b'\n' {
            assert!(idx > 0 && bytes[idx - 1] == b'\r', "bare LF at {}", idx);
        }
    }
}

#[test]
fn lenient_embedding_keeps_missing_references() {
    let ctx = embedded_context();
    let rewriter = HtmlReferenceRewriter::new(true);
    let mut embeddings = Default::default();

    let html = r#"<img src="images/missing.gif"><img src="images/logo.gif">"#;
    let out = rewriter
        .rewrite(html, ctx.resolver(), &mut embeddings, &ctx)
        .unwrap();

    assert!(out.html.starts_with(r#"<img src="images/missing.gif">"#));
    assert_eq!(out.references.len(), 1);
    assert_eq!(embeddings.len(), 1);

    let strict = HtmlReferenceRewriter::new(false);
    let err = strict
        .rewrite(html, ctx.resolver(), &mut embeddings, &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("images/missing.gif"), "{}", err);
}

#[test]
fn sent_mail_contains_the_logo() {
    let ctx = embedded_context();
    let mut email = Email::new(ctx);
    email
        .set_from("Sender <sender@example.com>")
        .unwrap()
        .add_to("receiver@example.com")
        .unwrap()
        .add_bcc("hidden@example.com")
        .unwrap()
        .set_subject("Logo")
        .unwrap()
        .set_html_msg(r#"<img src="images/logo.gif">"#)
        .unwrap()
        .enable_image_embedding(false)
        .unwrap();

    let transport = MemoryTransport::new();
    let message_id = email.send(&mut transport.clone()).unwrap();

    let sent = transport.sent_mails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message_id, message_id.as_str());
    assert_eq!(sent[0].recipients.len(), 2);
    let out = String::from_utf8(sent[0].bytes.clone()).unwrap();
    assert!(out.contains("Subject: Logo\r\n"));
    assert!(!out.contains("hidden@example.com"));
    assert!(out.contains("Content-Type: multipart/related; boundary="));
}
