//! Performance benchmarks for token verification
//!
//! Measures signature checks, key lookups through the cache and a full
//! authentication attempt with a warm key cache.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use jwt_auth::auth::{
    ClaimMapping, EncodedToken, KeyFetcher, KeyOrigin, KeyProvider, RequestParts,
    SecurityConfig, StaticRoleResolver, TokenSource, TokenVerifier, VerificationKey,
};
use jwt_auth::cache::{CacheKey, CacheProvider, InMemoryCache};
use jwt_auth::JwtAuthenticationProvider;
use serde_json::json;
use tokio::runtime::Runtime;
use url::Url;

const SECRET: &str = "benchmark-secret-0123456789abcdef";

struct StaticFetcher;

#[async_trait]
impl KeyFetcher for StaticFetcher {
    async fn fetch(&self, _url: &Url) -> jwt_auth::auth::Result<Vec<u8>> {
        Ok(SECRET.as_bytes().to_vec())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(role_count: usize) -> String {
    let roles: Vec<String> = (0..role_count).map(|i| format!("group_{i}")).collect();
    let claims = json!({
        "sub": "bench-user",
        "exp": now_secs() + 3600,
        "groups": roles,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn hs256_config() -> SecurityConfig {
    SecurityConfig::new(vec![Algorithm::HS256]).with_key(SECRET)
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");
    let verifier = TokenVerifier::new(&hs256_config());
    let key = VerificationKey::new(SECRET, KeyOrigin::Static);

    for roles in [0, 10, 100] {
        let token = EncodedToken::new(create_token(roles));
        group.throughput(Throughput::Bytes(token.len() as u64));
        group.bench_with_input(BenchmarkId::new("hs256", roles), &token, |b, token| {
            b.iter(|| {
                let _ = black_box(verifier.verify(token, &key));
            });
        });
    }

    let garbage = EncodedToken::new("not.a.token");
    group.bench_function("malformed", |b| {
        b.iter(|| {
            let _ = black_box(verifier.verify(&garbage, &key));
        });
    });

    group.finish();
}

fn bench_key_lookup(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("key_lookup");

    let config = SecurityConfig::new(vec![Algorithm::HS256])
        .with_key_url(Url::parse("https://issuer.example.com/key").unwrap());

    let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
    let provider = KeyProvider::new(&config, Arc::clone(&cache), Arc::new(StaticFetcher));

    // Warm the cache
    rt.block_on(async {
        provider.public_key().await.unwrap();
    });

    group.bench_function("cached", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(provider.public_key().await);
        });
    });

    let static_provider = KeyProvider::new(&hs256_config(), cache, Arc::new(StaticFetcher));
    group.bench_function("static", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(static_provider.public_key().await);
        });
    });

    group.bench_function("cache_key", |b| {
        let url = Url::parse("https://issuer.example.com/.well-known/jwks.json").unwrap();
        b.iter(|| black_box(CacheKey::verification_key(&url)));
    });

    group.finish();
}

fn bench_authenticate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("authenticate");
    group.measurement_time(Duration::from_secs(5));

    let config = SecurityConfig::new(vec![Algorithm::HS256])
        .with_key_url(Url::parse("https://issuer.example.com/key").unwrap())
        .with_token_sources(vec![TokenSource::header("X-Jwt"), TokenSource::cookie("jwt")]);

    let mapping = ClaimMapping::new("groups")
        .with_role("group_0", "Bench:Reader")
        .with_role("group_1", "Bench:Writer");
    let provider = JwtAuthenticationProvider::new(
        &config,
        mapping,
        Arc::new(InMemoryCache::new()),
        Arc::new(StaticFetcher),
        Arc::new(StaticRoleResolver::new(["Bench:Reader", "Bench:Writer"])),
    )
    .unwrap();

    let header_request = RequestParts::new().with_header("X-Jwt", create_token(2));
    let cookie_request = RequestParts::new().with_cookie("jwt", create_token(2));
    let empty_request = RequestParts::new();

    rt.block_on(async {
        provider.authenticate_request(&header_request).await.unwrap();
    });

    group.bench_function("header", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(provider.authenticate_request(&header_request).await);
        });
    });

    group.bench_function("cookie_fallback", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(provider.authenticate_request(&cookie_request).await);
        });
    });

    group.bench_function("no_credentials", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(provider.authenticate_request(&empty_request).await);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_verify, bench_key_lookup, bench_authenticate);
criterion_main!(benches);
