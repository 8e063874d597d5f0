//! Shared compilers and compiled templates across threads.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use ctrconf_template::{CompiledTemplate, Limits, TemplateCompiler};
use serde::Serialize;

#[derive(Serialize)]
struct Model {
    program: String,
    rewrites: BTreeMap<String, String>,
}

const TEMPLATE: &str = "\
# {{ program }}
{% for pattern, replacement in rewrites | dictsort(case_sensitive=true) %}
{{ pattern | quote }} = {{ replacement | quote }}
{% endfor %}
";

fn model(n: usize) -> Model {
    Model {
        program: format!("worker-{}", n),
        rewrites: (0..n)
            .map(|i| (format!("/p{}/", i), format!("/r{}/", i)))
            .collect(),
    }
}

#[test]
fn concurrent_renders_of_one_compiled_template() {
    let compiled = Arc::new(CompiledTemplate::compile(TEMPLATE, &Limits::default()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let compiled = Arc::clone(&compiled);
            thread::spawn(move || (n, compiled.render(&model(n)).unwrap()))
        })
        .collect();

    for handle in handles {
        let (n, text) = handle.join().unwrap();
        assert!(text.starts_with(&format!("# worker-{}\n", n)));
        assert_eq!(text.lines().count(), n + 1);
    }
}

#[test]
fn concurrent_compiles_share_the_cache() {
    let compiler = Arc::new(TemplateCompiler::default());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let compiler = Arc::clone(&compiler);
            thread::spawn(move || compiler.render(TEMPLATE, &model(n)).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(compiler.cached(), 1);
}

#[test]
fn rendered_output_parses_as_toml() {
    let compiled = CompiledTemplate::compile(TEMPLATE, &Limits::default()).unwrap();
    let mut model = model(0);
    model
        .rewrites
        .insert("quote\"and\\slash".into(), "tab\there".into());
    let text = compiled.render(&model).unwrap();
    let doc: toml::Table = toml::from_str(&text).unwrap();
    assert_eq!(doc["quote\"and\\slash"].as_str(), Some("tab\there"));
}
