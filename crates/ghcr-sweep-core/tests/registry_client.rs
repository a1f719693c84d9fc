//! Registry manifest client and full sweep against mock endpoints

use chrono::Utc;
use ghcr_sweep_core::registry::{MANIFEST_ACCEPT, registry_bearer};
use ghcr_sweep_core::{
    GitHubPackages, ManifestSource, RegistryClient, SweepConfig, SweepError, sweep,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFESTS: &str = "/v2/acme/operator/manifests";

fn config(server: &MockServer) -> SweepConfig {
    let mut config = SweepConfig::new("acme", "operator", "ghp_test");
    config.api_url = server.uri();
    config.registry_url = server.uri();
    config
}

fn index_body(subs: &[&str]) -> serde_json::Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": subs.iter().map(|d| json!({
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "digest": d,
            "size": 512,
            "platform": { "architecture": "amd64", "os": "linux" }
        })).collect::<Vec<_>>()
    })
}

fn leaf_body() -> serde_json::Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": { "mediaType": "application/vnd.oci.image.config.v1+json", "digest": "sha256:cfg", "size": 2 },
        "layers": []
    })
}

fn manifest_response(digest: &str, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Docker-Content-Digest", digest)
        .set_body_json(body)
}

#[tokio::test]
async fn test_fetch_index_uses_header_digest() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/v1", MANIFESTS)))
        .and(header(
            "authorization",
            format!("Bearer {}", registry_bearer("ghp_test")).as_str(),
        ))
        .respond_with(manifest_response(
            "sha256:AAA",
            index_body(&["sha256:BBB", "sha256:CCC"]),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClient::new(&config(&server)).unwrap();
    let manifest = client.fetch_manifest("v1").await.unwrap().unwrap();

    assert_eq!(manifest.digest, "sha256:AAA");

    let requests = server.received_requests().await.unwrap();
    let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap();
    assert_eq!(accept, MANIFEST_ACCEPT);
    assert_eq!(
        manifest.digests().collect::<Vec<_>>(),
        vec!["sha256:AAA", "sha256:BBB", "sha256:CCC"]
    );
}

#[tokio::test]
async fn test_fetch_missing_and_failing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/gone", MANIFESTS)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/flaky", MANIFESTS)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/headless", MANIFESTS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(leaf_body()))
        .mount(&server)
        .await;

    let client = RegistryClient::new(&config(&server)).unwrap();
    assert!(client.fetch_manifest("gone").await.unwrap().is_none());
    assert!(matches!(
        client.fetch_manifest("flaky").await.unwrap_err(),
        SweepError::ManifestFetch { status: 503, .. }
    ));
    assert!(matches!(
        client.fetch_manifest("headless").await.unwrap_err(),
        SweepError::MissingDigestHeader { .. }
    ));
}

#[tokio::test]
async fn test_sweep_against_mock_endpoints() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let recent = now.to_rfc3339();

    Mock::given(method("GET"))
        .and(path("/orgs/acme/packages/container/operator/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "name": "sha256:AAA", "created_at": recent,
                "metadata": { "container": { "tags": ["latest"] } }
            },
            {
                "id": 2, "name": "sha256:BBB", "created_at": recent,
                "metadata": { "container": { "tags": [] } }
            },
            {
                "id": 3, "name": "sha256:DDD", "created_at": "2020-01-01T00:00:00Z",
                "description": "Helm chart for acme operator",
                "metadata": { "container": { "tags": ["snapshot"] } }
            },
            {
                "id": 4, "name": "sha256:EEE", "created_at": "2020-01-01T00:00:00Z",
                "metadata": { "container": { "tags": ["sha256-DDD"] } }
            },
            {
                "id": 5, "name": "sha256:OLD", "created_at": "2020-01-01T00:00:00Z",
                "metadata": { "container": { "tags": ["0.1.0"] } }
            },
            {
                "id": 6, "name": "sha256:ORPHAN", "created_at": "2020-01-01T00:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/latest", MANIFESTS)))
        .respond_with(manifest_response("sha256:AAA", index_body(&["sha256:BBB"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/snapshot", MANIFESTS)))
        .respond_with(manifest_response("sha256:DDD", leaf_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/sha256-DDD", MANIFESTS)))
        .respond_with(manifest_response("sha256:EEE", leaf_body()))
        .expect(1)
        .mount(&server)
        .await;

    for id in [5, 6] {
        Mock::given(method("DELETE"))
            .and(path(format!(
                "/orgs/acme/packages/container/operator/versions/{}",
                id
            )))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = config(&server);
    config.dry_run = false;
    let api = GitHubPackages::new(&config).unwrap();
    let registry = RegistryClient::new(&config).unwrap();

    let outcome = sweep::run(&config, &api, &registry, now).await.unwrap();

    assert!(outcome.live.helm.contains("snapshot"));
    assert!(outcome.live.images.contains("latest"));
    assert!(outcome.resolution.is_complete());
    assert_eq!(outcome.report.total, 6);
    assert_eq!(outcome.report.kept, 4);
    assert_eq!(outcome.report.deleted, 2);
    assert_eq!(outcome.report.failed, 0);

    let deleted: Vec<u64> = outcome.report.deletions.iter().map(|d| d.id).collect();
    assert_eq!(deleted, vec![5, 6]);
}
