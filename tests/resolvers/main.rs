extern crate mail_compose as mail;
extern crate url;

use std::env;

use url::Url;

use mail::{
    default_impl::simple_context,
    embeddings::Embeddings,
    html::HtmlReferenceRewriter,
    resolver::{CompositeResolver, EmbeddedResolver, FileResolver, ResourceResolver, UrlResolver},
    Context,
};

const HTML: &str = r#"<img src="logo.gif"><script src="../js/app.js"></script>"#;

fn resources_url(sub_dir: &str) -> Url {
    let dir = env::current_dir().unwrap().join("test_resources").join(sub_dir);
    Url::from_directory_path(dir).unwrap()
}

#[test]
fn file_resolver_loads_relative_to_its_base() {
    let resolver = FileResolver::new("./test_resources/images");
    let data = resolver.resolve("logo.gif", false).unwrap().unwrap();
    assert_eq!(data.file_name(), Some("logo.gif"));
    assert_eq!(data.media_type().essence_str(), "image/gif");

    let data = resolver.resolve("../js/app.js", false).unwrap().unwrap();
    assert_eq!(data.file_name(), Some("app.js"));
}

#[test]
fn file_resolver_misses() {
    let resolver = FileResolver::new("./test_resources/images");
    assert!(resolver.resolve("nope.gif", true).unwrap().is_none());

    let err = resolver.resolve("nope.gif", false).unwrap_err();
    assert!(err.to_string().contains("nope.gif"), "{}", err);
}

#[test]
fn url_resolver_joins_with_file_base() {
    let resolver = UrlResolver::new(Some(resources_url("images")));
    let data = resolver.resolve("logo.gif", false).unwrap().unwrap();
    assert_eq!(data.file_name(), Some("logo.gif"));
    assert_eq!(data.buffer().len(), 5866);

    assert!(resolver.resolve("cid:logo", false).unwrap().is_none());
}

#[test]
fn url_resolver_without_base_needs_absolute_urls() {
    let resolver = UrlResolver::new(None);
    assert!(resolver.resolve("logo.gif", false).is_err());
    assert!(resolver.resolve("logo.gif", true).unwrap().is_none());

    let url = resources_url("js").join("app.js").unwrap();
    let data = resolver.resolve(url.as_str(), false).unwrap().unwrap();
    assert_eq!(data.file_name(), Some("app.js"));
}

#[test]
fn composite_uses_the_first_resolver_with_data() {
    let resolver = CompositeResolver::new()
        .with(EmbeddedResolver::new("/").with_resource("/logo.gif", b"GIF89a".to_vec()))
        .with(FileResolver::new("./test_resources/images"));

    let data = resolver.resolve("logo.gif", false).unwrap().unwrap();
    assert_eq!(&**data.buffer(), b"GIF89a");

    let data = resolver.resolve("../js/app.js", false).unwrap().unwrap();
    assert_eq!(data.file_name(), Some("app.js"));

    assert!(resolver.resolve("missing.gif", true).unwrap().is_none());
    let err = resolver.resolve("missing.gif", false).unwrap_err();
    assert!(err.to_string().contains("missing.gif"), "{}", err);
}

#[test]
fn rewriting_with_a_url_base() {
    let ctx = simple_context::new(
        "example.com",
        "r3s0lv",
        CompositeResolver::new().with(UrlResolver::new(Some(resources_url("images")))),
    )
    .unwrap();
    let mut embeddings = Embeddings::default();

    let out = HtmlReferenceRewriter::new(false)
        .rewrite(HTML, ctx.resolver(), &mut embeddings, &ctx)
        .unwrap();

    assert_eq!(out.references.len(), 2);
    assert_eq!(out.references[0].original, r#"<img src="logo.gif""#);
    assert_eq!(out.references[1].original, r#"<script src="../js/app.js""#);
    assert_eq!(
        out.html,
        format!(
            r#"<img src="cid:{}"><script src="cid:{}"></script>"#,
            out.references[0].content_id, out.references[1].content_id
        )
    );
    assert_eq!(embeddings.len(), 2);
    assert!(embeddings.get("logo.gif").is_some());
    assert!(embeddings.get("app.js").is_some());
}
