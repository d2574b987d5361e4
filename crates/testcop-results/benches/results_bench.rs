// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use testcop_results::{Parser, StandardParser, Test2JsonParser, flaky_packages};

fn standard_output(packages: usize) -> String {
    let mut out = String::new();
    for idx in 0..packages {
        if idx % 7 == 0 {
            writeln!(out, "--- FAIL: TestThing (0.00s)\n    thing_test.go:12: boom\nFAIL").ok();
            writeln!(out, "FAIL\texample.com/mod/pkg{idx}\t0.{idx:03}s").ok();
        } else {
            writeln!(
                out,
                "ok  \texample.com/mod/pkg{idx}\t0.{idx:03}s\tcoverage: 61.5% of statements"
            )
            .ok();
        }
    }
    out
}

fn test2json_output(packages: usize) -> String {
    let mut out = String::new();
    for idx in 0..packages {
        let action = if idx % 7 == 0 { "fail" } else { "pass" };
        for test in 0..5 {
            writeln!(
                out,
                r#"{{"Action":"run","Package":"example.com/mod/pkg{idx}","Test":"Test{test}"}}"#
            )
            .ok();
            writeln!(
                out,
                r#"{{"Action":"{action}","Package":"example.com/mod/pkg{idx}","Test":"Test{test}","Elapsed":0.01}}"#
            )
            .ok();
        }
        writeln!(
            out,
            r#"{{"Action":"output","Package":"example.com/mod/pkg{idx}","Output":"coverage: 61.5% of statements\n"}}"#
        )
        .ok();
        writeln!(
            out,
            r#"{{"Action":"{action}","Package":"example.com/mod/pkg{idx}","Elapsed":0.05}}"#
        )
        .ok();
    }
    out
}

fn parser_benchmark(c: &mut Criterion) {
    let standard = standard_output(500);
    let json = test2json_output(500);

    c.bench_function("standard_parse_500_packages", |b| {
        b.iter(|| StandardParser::new().parse(black_box(standard.as_bytes())))
    });

    c.bench_function("test2json_parse_500_packages", |b| {
        b.iter(|| {
            Test2JsonParser::new()
                .with_individual_tests(true)
                .parse(black_box(json.as_bytes()))
        })
    });

    let runs = vec![standard.clone(), standard_output(400), standard];
    c.bench_function("flaky_3_runs", |b| {
        b.iter(|| flaky_packages(&StandardParser::new(), black_box(&runs)))
    });
}

criterion_group!(benches, parser_benchmark);
criterion_main!(benches);
