// tests/template_compiler.rs

use sitepipe::template::{CompileOptions, TemplateError, compile_file, compile_str};
use sitepipe_test_utils::builders::SiteFixture;

fn pretty(source: &str) -> String {
    compile_str(source, &CompileOptions::default()).unwrap()
}

fn compact(source: &str) -> String {
    let options = CompileOptions {
        pretty: false,
        ..CompileOptions::default()
    };
    compile_str(source, &options).unwrap()
}

fn compile_err(source: &str) -> TemplateError {
    compile_str(source, &CompileOptions::default()).unwrap_err()
}

const PAGE: &str = r#"doctype html
html(lang="en")
  head
    meta(charset="utf-8")
    title Sitepipe
    link(rel="stylesheet" href="/css/main.css")
  body
    #app.container
      h1.title Hello
      p
        | First
        | Second
"#;

#[test]
fn renders_an_indented_document() {
    let expected = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Sitepipe</title>
    <link rel="stylesheet" href="/css/main.css">
  </head>
  <body>
    <div id="app" class="container">
      <h1 class="title">Hello</h1>
      <p>
        First
        Second
      </p>
    </div>
  </body>
</html>
"#;
    assert_eq!(pretty(PAGE), expected);
}

#[test]
fn compact_mode_has_no_whitespace_between_tags() {
    let html = compact(PAGE);
    assert!(!html.contains('\n'));
    assert!(html.starts_with(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>Sitepipe</title>"#
    ));
    assert!(html.ends_with("</p></div></body></html>"));
}

#[test]
fn html_root_gets_the_default_doctype() {
    assert_eq!(
        pretty("html\n  body"),
        "<!DOCTYPE html>\n<html>\n  <body></body>\n</html>\n"
    );
}

#[test]
fn fragments_get_no_doctype() {
    assert_eq!(pretty("p hi"), "<p>hi</p>\n");
}

#[test]
fn void_and_boolean_attributes_follow_the_doctype() {
    assert_eq!(
        compact(r#"input(type="checkbox" checked)"#),
        r#"<input type="checkbox" checked>"#
    );

    let strict = CompileOptions {
        doctype: "strict".to_string(),
        pretty: false,
    };
    assert_eq!(
        compile_str(r#"input(type="checkbox" checked)"#, &strict).unwrap(),
        r#"<input type="checkbox" checked="checked"/>"#
    );
    assert_eq!(compile_str("br", &strict).unwrap(), "<br/>");
}

#[test]
fn declared_doctype_overrides_the_option() {
    let strict = CompileOptions {
        doctype: "strict".to_string(),
        pretty: false,
    };
    assert_eq!(
        compile_str("doctype html\nbr", &strict).unwrap(),
        "<!DOCTYPE html><br>"
    );
}

#[test]
fn explicit_self_closing_tags() {
    assert_eq!(compact("foo/"), "<foo/>");
}

#[test]
fn attribute_values_are_escaped_unless_unbuffered() {
    assert_eq!(
        compact(r#"p(title="a \"b\" & <c>") x"#),
        r#"<p title="a &quot;b&quot; &amp; &lt;c&gt;">x</p>"#
    );
    assert_eq!(
        compact(r#"div(data-x!="<b>")"#),
        r#"<div data-x="<b>"></div>"#
    );
}

#[test]
fn class_and_id_shorthand_merge_with_attributes() {
    assert_eq!(
        compact(r#"a.btn(href="/go", class="primary" data-n=3) Go"#),
        r#"<a class="btn primary" href="/go" data-n="3">Go</a>"#
    );
    assert_eq!(compact("input(disabled=false)"), "<input>");
    assert_eq!(compact(".only"), r#"<div class="only"></div>"#);
}

#[test]
fn comments_render_or_vanish() {
    assert_eq!(pretty("// note\np hi"), "<!-- note -->\n<p>hi</p>\n");
    assert_eq!(pretty("//- hidden\n  still hidden\np hi"), "<p>hi</p>\n");
    assert_eq!(pretty("//\n  block one"), "<!-- block one -->\n");
}

#[test]
fn literal_html_passes_through() {
    assert_eq!(
        pretty("<div class=\"raw\">x</div>"),
        "<div class=\"raw\">x</div>\n"
    );
}

#[test]
fn block_expansion_nests_elements() {
    assert_eq!(
        pretty("ul: li: a(href=\"#\") x"),
        "<ul>\n  <li><a href=\"#\">x</a></li>\n</ul>\n"
    );
}

#[test]
fn text_blocks_keep_their_lines() {
    assert_eq!(
        pretty("p.\n  one\n  two"),
        "<p>\n  one\n  two\n</p>\n"
    );
    assert_eq!(pretty("pre.\n  a\n    b"), "<pre>a\n  b</pre>\n");
}

#[test]
fn code_lines_are_unsupported() {
    match compile_err("p hi\n- var x = 1") {
        TemplateError::Unsupported { line, construct } => {
            assert_eq!(line, 2);
            assert_eq!(construct, "- var x = 1");
        }
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[test]
fn control_flow_and_mixins_are_unsupported() {
    for (source, construct) in [
        ("if user\n  p hi", "if"),
        ("each item in items\n  li= item", "each"),
        ("mixin card\n  .card", "mixin"),
        ("+card", "+card"),
        ("p= title", "= title"),
        ("extends layout", "extends"),
        ("a(href=url) x", "url"),
    ] {
        match compile_err(source) {
            TemplateError::Unsupported {
                construct: found, ..
            } => assert_eq!(found, construct, "source: {source}"),
            other => panic!("expected Unsupported for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn attribute_concatenation_is_unsupported() {
    assert!(matches!(
        compile_err(r#"a(href="/" + path) x"#),
        TemplateError::Unsupported { line: 1, .. }
    ));
}

#[test]
fn interpolation_is_unsupported_wherever_text_appears() {
    for (source, line, construct) in [
        ("p Hello #{user.name}\n", 1, "#{user.name}"),
        ("p\n  | total: #{price * 2}", 2, "#{price * 2}"),
        ("div\n  p.\n    first\n    raw !{html}", 4, "!{html}"),
        ("<p>#{x}</p>", 1, "#{x}"),
        ("a(href=`/u/${id}`) x", 1, "href=`/u/${id}`"),
        ("p #[em hi #{name}]", 1, "#{name}"),
    ] {
        match compile_err(source) {
            TemplateError::Unsupported {
                line: found_line,
                construct: found,
            } => {
                assert_eq!(found_line, line, "source: {source:?}");
                assert_eq!(found, construct, "source: {source:?}");
            }
            other => panic!("expected Unsupported for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn escaped_interpolation_stays_literal() {
    assert_eq!(compact(r"p Price \#{amount}"), "<p>Price #{amount}</p>");
    assert_eq!(compact(r"p \!{raw} and \#[b x]"), "<p>!{raw} and #[b x]</p>");
    assert_eq!(
        compact(r"a(href=`/a/\${id}`) x"),
        r#"<a href="/a/${id}">x</a>"#
    );
    assert_eq!(compact("a(href=`/plain`) x"), r#"<a href="/plain">x</a>"#);
}

#[test]
fn inline_tags_render_in_place() {
    assert_eq!(
        compact("p Click #[strong here] now"),
        "<p>Click <strong>here</strong> now</p>"
    );
    assert_eq!(
        compact(r#"p See #[a(href="/docs" title="it's [here]") the docs]."#),
        r#"<p>See <a href="/docs" title="it's [here]">the docs</a>.</p>"#
    );
    assert_eq!(
        compact("p #[em: b deep] and #[br]"),
        "<p><em><b>deep</b></em> and <br></p>"
    );
    assert_eq!(
        pretty("p\n  | Read\n  | #[a.more(href=\"/m\") more]"),
        "<p>Read<a class=\"more\" href=\"/m\">more</a></p>\n"
    );
}

#[test]
fn malformed_inline_tags_are_syntax_errors() {
    for source in ["p before #[strong never closed", "p #[img oops]", "p\n  | #[]"] {
        assert!(
            matches!(compile_err(source), TemplateError::Syntax { .. }),
            "source: {source:?}"
        );
    }
    assert!(matches!(
        compile_err("<p>#[b x]</p>"),
        TemplateError::Unsupported { line: 1, .. }
    ));
}

#[test]
fn pretty_output_keeps_inline_tags_with_their_text() {
    assert_eq!(
        pretty("p\n  | Hello\n  strong world"),
        "<p>Hello<strong>world</strong></p>\n"
    );
    assert_eq!(
        pretty("div\n  h2 Title\n  | Intro\n  a(href=\"/\") home\n  | after"),
        "<div>\n  <h2>Title</h2>\n  Intro<a href=\"/\">home</a>after\n</div>\n"
    );
    assert_eq!(
        pretty("ul\n  li\n    span.icon\n    | Item"),
        "<ul>\n  <li><span class=\"icon\"></span>Item</li>\n</ul>\n"
    );
}

#[test]
fn mixed_tab_and_space_indentation_is_rejected() {
    match compile_err("div\n\tp tab\n  p space\n") {
        TemplateError::Syntax { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("tabs or spaces"), "{message}");
        }
        other => panic!("expected Syntax, got {other:?}"),
    }

    assert!(matches!(
        compile_err("div\n \tp mixed"),
        TemplateError::Syntax { line: 2, .. }
    ));
    assert_eq!(compact("div\n\tp one\n\tp two"), "<div><p>one</p><p>two</p></div>");
}

#[test]
fn indentation_errors_report_the_line() {
    match compile_err("div\n    p one\n  p two") {
        TemplateError::Syntax { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("inconsistent indentation"), "{message}");
        }
        other => panic!("expected Syntax, got {other:?}"),
    }

    match compile_err("doctype html\n  p hi") {
        TemplateError::Syntax { line, message } => {
            assert_eq!(line, 2);
            assert!(message.contains("unexpected indentation"), "{message}");
        }
        other => panic!("expected Syntax, got {other:?}"),
    }
}

#[test]
fn void_elements_cannot_have_content() {
    for source in ["br\n  p hi", "img hello"] {
        match compile_err(source) {
            TemplateError::Syntax { line: 1, message } => {
                assert!(message.contains("self-closing"), "{message}");
            }
            other => panic!("expected Syntax for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn includes_resolve_relative_to_the_file() {
    let fixture = SiteFixture::new();
    fixture
        .write(
            "src/index.pug",
            "html\n  body\n    include partials/nav\n    include raw.txt\n",
        )
        .write("src/partials/nav.pug", "nav\n  a(href=\"/\") Home\n")
        .write("src/raw.txt", "plain text\n");

    let html = compile_file(&fixture.path("src/index.pug"), &CompileOptions::default()).unwrap();

    assert_eq!(
        html,
        "<!DOCTYPE html>\n<html>\n  <body>\n    <nav><a href=\"/\">Home</a></nav>\n    plain text\n  </body>\n</html>\n"
    );
}

#[test]
fn include_errors_name_the_file() {
    let fixture = SiteFixture::new();
    fixture
        .write("src/missing.pug", "p before\ninclude nope\n")
        .write("src/nested.pug", "include bad\n")
        .write("src/bad.pug", "p ok\n- code\n");

    match compile_file(&fixture.path("src/missing.pug"), &CompileOptions::default()) {
        Err(TemplateError::Include { line, path, .. }) => {
            assert_eq!(line, 2);
            assert!(path.ends_with("nope.pug"), "{path:?}");
        }
        other => panic!("expected Include error, got {other:?}"),
    }

    match compile_file(&fixture.path("src/nested.pug"), &CompileOptions::default()) {
        Err(err @ TemplateError::Included { .. }) => {
            assert_eq!(err.line(), Some(2));
            assert!(err.to_string().contains("bad.pug"), "{err}");
        }
        other => panic!("expected Included error, got {other:?}"),
    }
}

#[test]
fn include_needs_a_file_context() {
    match compile_err("include nav") {
        TemplateError::Syntax { message, .. } => {
            assert!(message.contains("only available"), "{message}");
        }
        other => panic!("expected Syntax, got {other:?}"),
    }
}
