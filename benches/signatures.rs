//! Benchmarks for signature encoding and parsing.
//!
//! Tests the hot paths a module writer exercises at bake time:
//! - Method signature encoding (simple, instance, generic)
//! - Local variable signature encoding
//! - Round-trip parsing of encoded blobs

extern crate dotforge;

use criterion::{criterion_group, criterion_main, Criterion};
use dotforge::metadata::signatures::{
    encode_local_var_signature, encode_method_signature, parse_method_signature,
    SignatureLocalVariable, SignatureLocalVariables, SignatureMethod, SignatureParameter,
    TypeSignature,
};
use std::hint::black_box;

/// Benchmark encoding a simple static method.
/// Signature: int Add(int a, int b)
fn bench_encode_method_signature_simple(c: &mut Criterion) {
    let signature = SignatureMethod {
        return_type: SignatureParameter::by_value(TypeSignature::I4),
        params: vec![
            SignatureParameter::by_value(TypeSignature::I4),
            SignatureParameter::by_value(TypeSignature::I4),
        ],
        ..Default::default()
    };

    c.bench_function("sig_encode_method_simple", |b| {
        b.iter(|| {
            let blob = encode_method_signature(black_box(&signature)).unwrap();
            black_box(blob)
        });
    });
}

/// Benchmark encoding a generic instance method.
/// Signature: instance !!0 Choose<T, U>(!!0, !!1, bool)
fn bench_encode_method_signature_generic(c: &mut Criterion) {
    let signature = SignatureMethod {
        has_this: true,
        param_count_generic: 2,
        return_type: SignatureParameter::by_value(TypeSignature::GenericParamMethod(0)),
        params: vec![
            SignatureParameter::by_value(TypeSignature::GenericParamMethod(0)),
            SignatureParameter::by_value(TypeSignature::GenericParamMethod(1)),
            SignatureParameter::by_value(TypeSignature::Boolean),
        ],
        ..Default::default()
    };

    c.bench_function("sig_encode_method_generic", |b| {
        b.iter(|| {
            let blob = encode_method_signature(black_box(&signature)).unwrap();
            black_box(blob)
        });
    });
}

/// Benchmark encoding a local variable signature with a pinned local.
fn bench_encode_local_var_signature(c: &mut Criterion) {
    let signature = SignatureLocalVariables {
        locals: vec![
            SignatureLocalVariable {
                base: TypeSignature::I4,
                ..Default::default()
            },
            SignatureLocalVariable {
                is_pinned: true,
                base: TypeSignature::String,
                ..Default::default()
            },
        ],
    };

    c.bench_function("sig_encode_local_vars", |b| {
        b.iter(|| {
            let blob = encode_local_var_signature(black_box(&signature)).unwrap();
            black_box(blob)
        });
    });
}

/// Benchmark parsing an instance method signature.
/// Signature: int Instance.Method(string, ref int[])
fn bench_parse_method_signature(c: &mut Criterion) {
    // HASTHIS, 2 params, I4 return, STRING, BYREF SZARRAY I4
    let blob = [0x20, 0x02, 0x08, 0x0E, 0x10, 0x1D, 0x08];

    c.bench_function("sig_parse_method_instance", |b| {
        b.iter(|| {
            let sig = parse_method_signature(black_box(&blob)).unwrap();
            black_box(sig)
        });
    });
}

criterion_group!(
    benches,
    bench_encode_method_signature_simple,
    bench_encode_method_signature_generic,
    bench_encode_local_var_signature,
    bench_parse_method_signature,
);
criterion_main!(benches);
