use criterion::{black_box, criterion_group, criterion_main, Criterion};
use factgraph::FactModel;
use factgraph_java::JavaFactExtractor;
use factgraph_parser_api::{CompilationUnit, FactExtractor, NoProgress};
use std::path::Path;

const SIMPLE_CLASS: &str = r#"
public class HelloWorld {
    public static void main(String[] args) {
        greet(args.length);
    }

    static void greet(int count) {}
}
"#;

const COMPLEX_CLASS: &str = r#"
package com.example.app;

import java.util.List;

public class ComplexClass extends BaseClass implements Comparable<ComplexClass> {
    private final String name;
    private final int value;
    private int[] counts;

    public ComplexClass(String name, int value) {
        super(name);
        this.name = name;
        this.value = value;
        this.counts = new int[value];
    }

    public String getName() {
        return name;
    }

    public int getValue() {
        return value;
    }

    public void record(int index) {
        counts[index] += 1;
        helper();
    }

    @Override
    public int compareTo(ComplexClass other) {
        return compare(this.value, other.getValue());
    }

    private static int compare(int a, int b) {
        return a - b;
    }

    private void helper() {
        Runnable task = new Runnable() {
            public void run() {
                process(value);
            }
        };
        task.run();
    }

    private void process(int amount) {
        for (int i = 0; i < amount; i++) {
            record(i);
        }
    }
}

class BaseClass {
    protected String label;

    BaseClass(String label) {
        this.label = label;
    }
}
"#;

fn bench_simple_extraction(c: &mut Criterion) {
    let extractor = JavaFactExtractor::new();
    let path = Path::new("HelloWorld.java");

    c.bench_function("extract_simple_class", |b| {
        b.iter(|| {
            let mut model = FactModel::new();
            extractor
                .parse_source(black_box(SIMPLE_CLASS), path, &mut model)
                .unwrap()
        })
    });
}

fn bench_complex_extraction(c: &mut Criterion) {
    let extractor = JavaFactExtractor::new();
    let path = Path::new("ComplexClass.java");

    c.bench_function("extract_complex_class", |b| {
        b.iter(|| {
            let mut model = FactModel::new();
            extractor
                .parse_source(black_box(COMPLEX_CLASS), path, &mut model)
                .unwrap()
        })
    });
}

fn bench_deferred_resolution(c: &mut Criterion) {
    let extractor = JavaFactExtractor::new();
    let units: Vec<CompilationUnit> = (0..32)
        .map(|i| {
            let source = COMPLEX_CLASS
                .replace("ComplexClass", &format!("ComplexClass{i}"))
                .replace("BaseClass", &format!("BaseClass{i}"));
            extractor
                .lower(&source, Path::new(&format!("ComplexClass{i}.java")))
                .unwrap()
        })
        .collect();

    c.bench_function("extract_and_resolve_project", |b| {
        b.iter(|| {
            let mut model = FactModel::new();
            extractor
                .extract_units(black_box(&units), &mut model, &NoProgress)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_simple_extraction,
    bench_complex_extraction,
    bench_deferred_resolution
);
criterion_main!(benches);
