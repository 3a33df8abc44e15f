extern crate mail_compose as mail;

use mail::html::{MatcherFinder, ReferenceFinder, ReferenceShape, RegexFinder};

const CORPUS: &[&str] = &[
    "",
    "no tags at all",
    r#"<img src="a.gif">"#,
    r#"<img src='a.gif'>"#,
    r#"<IMG SRC="a.gif">"#,
    r#"<iMg sRc = "a.gif" >"#,
    r#"<p><img src="a.gif"><img alt="b" src="b.gif"/></p>"#,
    "<img\n  alt=\"logo\"\n  SRC=\"../images/logo.gif\">",
    "<img\tsrc=\"tab.gif\">",
    "<img\r\nsrc\r\n=\r\n'crlf.gif'>",
    r#"<img src="a" src="b">"#,
    r#"<img  src="a"  alt="x"  src="b" >"#,
    r#"<img src="a"><img src="b"><img src="c">"#,
    r#"<imgx y src="a.gif">"#,
    r#"<imgsrc="a.gif">"#,
    r#"<img data-src="a.gif">"#,
    r#"<img srcset="a.gif 1x">"#,
    r#"<img src="">"#,
    r#"<img src=a.gif>"#,
    r#"<img src="a.gif"#,
    r#"<img src="a'b.gif">"#,
    r#"<img alt="x > y" src="a.gif">"#,
    r#"<img alt="x"> src="a.gif">"#,
    r#"<img src="a>b.gif">"#,
    r#"<img <img src="a.gif">"#,
    "<img ",
    "<img src=",
    "<img src =  ",
    r#"< img src="a.gif">"#,
    r#"<script src="app.js"></script>"#,
    r#"<SCRIPT type="text/javascript" SRC='app.js'></SCRIPT>"#,
    r#"<script>var x = "<img src='inline.gif'>";</script>"#,
    r#"<scripts src="a.js"><script src="b.js">"#,
    "<head><script type=\"text/javascript\" src=\"../js/app.js\"></script></head>\n<body><img src=\"cid:x\"></body>",
    r#"<img src="ü.gif"><img alt="ö" src="ä.gif">"#,
    "<img alt=\"a\"\x0Bsrc=\"vt.gif\"\x0C>",
];

fn assert_same(html: &str, shape: ReferenceShape) {
    let by_regex = RegexFinder.find_all(html, shape);
    let by_matcher = MatcherFinder.find_all(html, shape);
    assert_eq!(by_regex, by_matcher, "{:?} in {:?}", shape, html);
}

#[test]
fn finders_agree_on_the_corpus() {
    for html in CORPUS {
        for shape in ReferenceShape::ALL.iter() {
            assert_same(html, *shape);
        }
    }
}

#[test]
fn finders_agree_on_the_concatenated_corpus() {
    let html = CORPUS.join("\n");
    for shape in ReferenceShape::ALL.iter() {
        assert_same(&html, *shape);
    }
}

#[test]
fn finders_agree_on_the_html_template() {
    let html = std::fs::read_to_string("./test_resources/html/mail.html").unwrap();
    for shape in ReferenceShape::ALL.iter() {
        assert_same(&html, *shape);
    }
    let found = MatcherFinder.find_all(&html, ReferenceShape::ImgSrc);
    let values = found.iter().map(|found| found.value(&html)).collect::<Vec<_>>();
    assert_eq!(values, vec!["../images/logo.gif", "cid:already-embedded"]);
}
