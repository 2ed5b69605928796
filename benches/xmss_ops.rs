//! Key generation, signing and verification costs for small XMSS and XMSS-MT keys.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use xmss_state::crypto::hash::HashAlgorithm;
use xmss_state::keystate;
use xmss_state::xmss::{XMSSKeypair, XMSSParams};
use xmss_state::xmssmt::{XMSSMTKeypair, XMSSMTParams};

const SEED: [u8; 32] = [0x5a; 32];
const MESSAGE: &[u8] = b"benchmark message";

fn bench_keygen(c: &mut Criterion) {
    let mut group = c.benchmark_group("keygen");
    group.sample_size(10);

    for height in [4u32, 6, 8] {
        let params = XMSSParams::new(height, 16, HashAlgorithm::Sha256).unwrap();
        group.bench_with_input(BenchmarkId::new("xmss", height), &params, |b, params| {
            b.iter(|| black_box(XMSSKeypair::generate_from_seed(params, &SEED).unwrap()))
        });
    }

    let mt_params = XMSSMTParams::new(8, 2, 16, HashAlgorithm::Sha256).unwrap();
    group.bench_function("xmssmt_8_2", |b| {
        b.iter(|| black_box(XMSSMTKeypair::generate_from_seed(&mt_params, &SEED).unwrap()))
    });

    group.finish();
}

fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("sign");

    let params = XMSSParams::new(6, 16, HashAlgorithm::Sha256).unwrap();
    let fresh = XMSSKeypair::generate_from_seed(&params, &SEED).unwrap();
    let state = keystate::export_private(fresh.private_key());

    group.bench_function("xmss_h6", |b| {
        b.iter_batched(
            || {
                let restored = keystate::import_private(&state, &params).unwrap();
                XMSSKeypair::restore(&params, restored, None).unwrap()
            },
            |mut keypair| black_box(keypair.sign(MESSAGE).unwrap()),
            BatchSize::LargeInput,
        )
    });

    for w in [4u32, 16, 256] {
        let params = XMSSParams::new(2, w, HashAlgorithm::Sha256).unwrap();
        let fresh = XMSSKeypair::generate_from_seed(&params, &SEED).unwrap();
        let state = keystate::export_private(fresh.private_key());
        group.bench_with_input(BenchmarkId::new("winternitz", w), &params, |b, params| {
            b.iter_batched(
                || {
                    let restored = keystate::import_private(&state, params).unwrap();
                    XMSSKeypair::restore(params, restored, None).unwrap()
                },
                |mut keypair| black_box(keypair.sign(MESSAGE).unwrap()),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    let params = XMSSParams::new(6, 16, HashAlgorithm::Sha256).unwrap();
    let mut keypair = XMSSKeypair::generate_from_seed(&params, &SEED).unwrap();
    let signature = keypair.sign(MESSAGE).unwrap();
    group.bench_function("xmss_h6", |b| {
        b.iter(|| black_box(keypair.public_key().verify(black_box(MESSAGE), &signature)))
    });

    let mt_params = XMSSMTParams::new(8, 2, 16, HashAlgorithm::Sha256).unwrap();
    let mut mt_keypair = XMSSMTKeypair::generate_from_seed(&mt_params, &SEED).unwrap();
    let mt_signature = mt_keypair.sign(MESSAGE).unwrap();
    group.bench_function("xmssmt_8_2", |b| {
        b.iter(|| black_box(mt_keypair.public_key().verify(black_box(MESSAGE), &mt_signature)))
    });

    group.finish();
}

criterion_group!(benches, bench_keygen, bench_sign, bench_verify);
criterion_main!(benches);
