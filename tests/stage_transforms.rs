// tests/stage_transforms.rs

//! Behaviour of the built-in transform stages through the uniform stage
//! interface.

use std::collections::BTreeMap;
use std::path::PathBuf;

use assetflow::pipeline::{FileRecord, Stage};
use assetflow::stages::{
    ConcatStage, CssMinifyStage, CssPrefixStage, FilterStage, HtmlReplaceStage, JsMinifyStage,
    LintStage, RebaseStage, ScssStage, SpriteStage,
};
use assetflow::config::LintRule;

fn record(path: &str, contents: &str) -> FileRecord {
    FileRecord::new(path, contents.as_bytes().to_vec())
}

#[test]
fn concat_joins_in_given_order_into_one_record() {
    let stage = ConcatStage::new("main.js");
    let out = stage
        .apply_set(vec![record("a.js", "first"), record("b.js", "second")])
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, PathBuf::from("main.js"));
    assert_eq!(out[0].contents, b"first\nsecond".to_vec());
}

#[test]
fn concat_of_nothing_is_nothing() {
    let stage = ConcatStage::new("main.js");
    assert!(stage.apply_set(Vec::new()).unwrap().is_empty());
}

#[test]
fn filter_drops_non_matching_records() {
    let stage = FilterStage::new(&["**/*.css"]).unwrap();

    assert!(stage.apply(record("a/style.css", "x")).unwrap().is_some());
    assert!(stage.apply(record("a/readme.md", "x")).unwrap().is_none());
}

#[test]
fn rebase_strips_prefix_and_passes_foreign_paths_through() {
    let stage = RebaseStage::new("src/images");

    let moved = stage.apply(record("src/images/a/b.png", "x")).unwrap().unwrap();
    assert_eq!(moved.path, PathBuf::from("a/b.png"));

    let kept = stage.apply(record("vendor/c.png", "x")).unwrap().unwrap();
    assert_eq!(kept.path, PathBuf::from("vendor/c.png"));
}

#[test]
fn scss_compiles_entrypoints_and_drops_partials() {
    let stage = ScssStage::new(vec![]);

    let out = stage
        .apply(record("src/styles/main.scss", "$c: #112233;\nbody { color: $c; }"))
        .unwrap()
        .unwrap();
    assert_eq!(out.path, PathBuf::from("src/styles/main.css"));
    let css = String::from_utf8(out.contents).unwrap();
    assert!(css.contains("color: #112233"));
    assert_eq!(out.source_map, Some(PathBuf::from("src/styles/main.scss")));

    assert!(stage
        .apply(record("src/styles/_mixins.scss", "@mixin x {}"))
        .unwrap()
        .is_none());
}

#[test]
fn scss_errors_carry_the_compile_failure() {
    let stage = ScssStage::new(vec![]);
    let err = stage
        .apply(record("src/styles/bad.scss", "body { color: }"))
        .unwrap_err();
    assert!(err.to_string().contains("bad.scss"));
}

#[test]
fn css_prefix_inserts_vendor_copies_before_the_standard_declaration() {
    let stage = CssPrefixStage;
    let out = stage
        .apply(record("a.css", "a {\n  user-select: none;\n}\n"))
        .unwrap()
        .unwrap();

    let css = String::from_utf8(out.contents).unwrap();
    let webkit = css.find("-webkit-user-select: none").expect("webkit prefix");
    let standard = css.rfind("\n  user-select: none").expect("standard kept");
    assert!(webkit < standard, "prefixed copies come first: {css}");
}

#[test]
fn css_minify_strips_comments_and_whitespace() {
    let stage = CssMinifyStage;
    let out = stage
        .apply(record(
            "a.css",
            "/* banner */\nbody {\n  color: red;\n  margin: 0;\n}\n",
        ))
        .unwrap()
        .unwrap();

    assert_eq!(
        String::from_utf8(out.contents).unwrap(),
        "body{color:red;margin:0}"
    );
}

#[test]
fn js_minify_strips_comments_but_not_string_contents() {
    let stage = JsMinifyStage;
    let out = stage
        .apply(record(
            "a.js",
            "// leading comment\nlet url = \"http://x/\"; /* gone */\nlet done = 1;\n",
        ))
        .unwrap()
        .unwrap();

    let js = String::from_utf8(out.contents).unwrap();
    assert!(!js.contains("leading comment"));
    assert!(!js.contains("gone"));
    assert!(js.contains("http://x/"), "string contents survive: {js}");
    assert!(js.contains("let done = 1;"));
}

#[test]
fn html_replace_substitutes_known_markers_and_keeps_unknown_blocks() {
    let mut replacements = BTreeMap::new();
    replacements.insert(
        "js".to_string(),
        "<script src=\"../js/main.js\"></script>".to_string(),
    );
    let stage = HtmlReplaceStage::new(replacements);

    let out = stage
        .apply(record(
            "index.html",
            "<body>\
             <!-- build:js --><script src=\"dev.js\"></script><!-- endbuild -->\
             <!-- build:logo --><img src=\"raw.svg\"><!-- endbuild -->\
             </body>",
        ))
        .unwrap()
        .unwrap();

    let html = String::from_utf8(out.contents).unwrap();
    assert!(html.contains("<script src=\"../js/main.js\"></script>"));
    assert!(!html.contains("dev.js"));
    // No replacement configured for `logo`: block kept verbatim.
    assert!(html.contains("<!-- build:logo --><img src=\"raw.svg\"><!-- endbuild -->"));
}

#[test]
fn html_replace_rejects_unterminated_blocks() {
    let stage = HtmlReplaceStage::new(BTreeMap::new());
    let err = stage
        .apply(record("index.html", "<!-- build:js --><script>"))
        .unwrap_err();
    assert!(err.to_string().contains("endbuild"));
}

#[test]
fn lint_passes_clean_sources_and_reports_violations_with_context() {
    let rules = [LintRule {
        name: "no-debugger".to_string(),
        pattern: r"\bdebugger\b".to_string(),
    }];
    let stage = LintStage::new(&rules).unwrap();

    assert!(stage
        .apply(record("src/js/ok.js", "function f() {}\n"))
        .unwrap()
        .is_none());

    let err = stage
        .apply(record("src/js/bad.js", "function f() {\n  debugger;\n}\n"))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("bad.js:2"), "violation names file and line: {msg}");
    assert!(msg.contains("no-debugger"));
}

#[test]
fn sprite_packs_icons_vertically_with_positions() {
    use std::io::Cursor;

    let png = |w: u32, h: u32| {
        let img = image::RgbaImage::new(w, h);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    };

    let stage = SpriteStage::new(
        "src/images/generated/sprite.png",
        "src/styles/generated/sprite.scss",
        "../images/generated/sprite.png",
    );

    let out = stage
        .apply_set(vec![
            FileRecord::new("src/images/icons/home.png", png(4, 3)),
            FileRecord::new("src/images/icons/user.png", png(2, 5)),
        ])
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].path, PathBuf::from("src/images/generated/sprite.png"));
    assert_eq!(out[1].path, PathBuf::from("src/styles/generated/sprite.scss"));

    let sheet = image::load_from_memory(&out[0].contents).unwrap().to_rgba8();
    assert_eq!(sheet.width(), 4, "sheet width is the widest icon");
    assert_eq!(sheet.height(), 8, "sheet height is the sum of icon heights");

    let scss = String::from_utf8(out[1].contents.clone()).unwrap();
    assert!(scss.contains("$icon-home-y: 0;"));
    assert!(scss.contains("$icon-user-y: -3px;"));
    assert!(scss.contains("url(\"../images/generated/sprite.png\")"));
    assert!(scss.contains(".icon-home"));
    assert!(scss.contains(".icon-user"));
}

#[test]
fn sprite_of_no_icons_produces_no_outputs() {
    let stage = SpriteStage::new("a.png", "a.scss", "a.png");
    assert!(stage.apply_set(Vec::new()).unwrap().is_empty());
}
