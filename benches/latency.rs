//! Latency benchmarks for the per-authorization signing path.
//!
//! Run with: `cargo bench --bench latency`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use alloy_primitives::{address, Address, Bytes, U256};
use layerr_core::signing::{
    build_digest, oracle_attestation_digest, verify, DomainShape, Eip712Domain, LocalKeySigner,
    StructEncoder, HARDHAT_CHAIN_ID,
};
use layerr_core::typed_data::TypedDataDocument;
use layerr_core::types::{CallAuthorization, MintParameters, MintToken, PaymentToken, TypedStruct};
use layerr_core::TypeSchemaRegistry;

const SIGNER_KEY: &str = "0x6969696969696969696969696969696969696969696969696969696969696969";
const MINTER: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
const TOKEN: Address = address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9");

/// Mint parameters with `token_count` ERC1155 entries.
fn generate_mint_parameters(token_count: u64) -> MintParameters {
    let mut builder = MintParameters::builder()
        .payment_token(PaymentToken::native(
            address!("617F2E2fD72FD9D5503197092aC168c91465E7f2"),
            U256::from(100_000u64),
        ))
        .end_time(4_000_000_000);
    for token_id in 0..token_count {
        builder = builder.mint_token(MintToken::erc1155(TOKEN, U256::from(token_id)));
    }
    builder.build()
}

/// Benchmark struct hashing as the number of nested tokens grows.
fn bench_hash_struct(c: &mut Criterion) {
    let registry = TypeSchemaRegistry::layerr().unwrap();
    let encoder = StructEncoder::new(&registry);
    let mut group = c.benchmark_group("hash_struct");

    for token_count in [1u64, 3, 10, 50].iter() {
        let value = generate_mint_parameters(*token_count).to_struct_value();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("mint_parameters", token_count),
            &value,
            |b, value| b.iter(|| black_box(encoder.hash_struct(value).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark digest composition, signing and recovery of one authorization.
fn bench_sign_verify(c: &mut Criterion) {
    let registry = TypeSchemaRegistry::layerr().unwrap();
    let signer = LocalKeySigner::from_hex(SIGNER_KEY).unwrap();
    let domain = Eip712Domain::layerr_minter(HARDHAT_CHAIN_ID, MINTER);
    let params = generate_mint_parameters(3);
    let digest = build_digest(&registry, &domain, &params).unwrap();
    let signature = signer.sign_typed(&digest).unwrap().to_bytes();

    let mut group = c.benchmark_group("sign_verify");
    group.throughput(Throughput::Elements(1));

    group.bench_function("domain_separator", |b| {
        b.iter(|| black_box(domain.separator()))
    });

    group.bench_function("build_digest", |b| {
        b.iter(|| black_box(build_digest(&registry, &domain, &params).unwrap()))
    });

    group.bench_function("sign", |b| {
        b.iter(|| black_box(signer.sign_typed(&digest).unwrap()))
    });

    group.bench_function("verify", |b| {
        b.iter(|| black_box(verify(&digest, &signature, signer.address()).unwrap()))
    });

    group.bench_function("oracle_attestation_digest", |b| {
        b.iter(|| black_box(oracle_attestation_digest(MINTER, &signature)))
    });

    group.finish();
}

/// Benchmark parsing and validating a received typed-data document.
fn bench_typed_data_document(c: &mut Criterion) {
    let registry = TypeSchemaRegistry::layerr().unwrap();
    let call = CallAuthorization::new(
        U256::ZERO,
        address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        U256::from(1_000_000_000_000_000_000u64),
        Bytes::new(),
        U256::from(100_000u64),
    );
    let wallet = address!("B7f8BC63BbcaD18155201308C8f3540b07f84F5e");

    let mut group = c.benchmark_group("typed_data_document");
    for shape in [DomainShape::ChainBound, DomainShape::ChainLess] {
        let domain = match shape {
            DomainShape::ChainBound => Eip712Domain::layerr_wallet(HARDHAT_CHAIN_ID, wallet),
            DomainShape::ChainLess => Eip712Domain::layerr_wallet_chainless(wallet),
        };
        let json = TypedDataDocument::from_authorization(&registry, &domain, &call)
            .unwrap()
            .to_json()
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("parse_and_digest", format!("{:?}", shape)),
            &json,
            |b, json| {
                b.iter(|| {
                    let document = TypedDataDocument::from_json(json).unwrap();
                    black_box(document.digest().unwrap())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_struct,
    bench_sign_verify,
    bench_typed_data_document,
);

criterion_main!(benches);
