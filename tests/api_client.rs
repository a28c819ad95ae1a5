use kubermatic_acc::{ApiError, KubermaticClient, NodeDeploymentId};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ND_PATH: &str = "/api/v1/projects/proj1/dc/hamburg/clusters/clu1/nodedeployments/nd1";

fn nd_id() -> NodeDeploymentId {
    "proj1:hamburg:clu1:nd1".parse().unwrap()
}

fn client(server: &MockServer) -> KubermaticClient {
    KubermaticClient::new(server.uri(), "test_token".to_string()).unwrap()
}

fn openstack_nd() -> serde_json::Value {
    serde_json::json!({
        "id": "nd1",
        "name": "tf-acc-test-abc",
        "creationTimestamp": "2020-06-10T12:00:00Z",
        "spec": {
            "replicas": 1,
            "template": {
                "cloud": {"openstack": {"flavor": "m1.small", "image": "Ubuntu Bionic"}},
                "operatingSystem": {"ubuntu": {"distUpgradeOnBoot": false}},
                "versions": {"kubelet": "1.16.10"}
            }
        },
        "status": {}
    })
}

#[tokio::test]
async fn test_get_node_deployment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ND_PATH))
        .and(header("authorization", "Bearer test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openstack_nd()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let nd = client(&mock_server)
        .get_node_deployment(&nd_id())
        .await
        .unwrap();

    assert_eq!(nd.id, "nd1");
    assert_eq!(nd.spec.as_ref().unwrap().replicas, Some(1));
    let openstack = nd.openstack().unwrap();
    assert_eq!(openstack.flavor.as_deref(), Some("m1.small"));
    assert!(!openstack.use_floating_ip);
    assert_eq!(openstack.root_disk_size_gb, 0);
    assert_eq!(
        nd.template().unwrap().versions.as_ref().unwrap().kubelet,
        "1.16.10"
    );
}

#[tokio::test]
async fn test_get_node_deployment_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ND_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "nodedeployment \"nd1\" not found"}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .get_node_deployment(&nd_id())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "node deployment not found: 'proj1:hamburg:clu1:nd1'"
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ND_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": 401, "message": "invalid bearer token"}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .get_node_deployment(&nd_id())
        .await
        .unwrap_err();

    match err {
        ApiError::Auth { message } => assert_eq!(message, "invalid bearer token"),
        other => panic!("expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_without_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ND_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .get_node_deployment(&nd_id())
        .await
        .unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Bad Gateway");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .get_node_deployment(&nd_id())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Decode {
            resource: "node deployment",
            ..
        }
    ));
}

#[tokio::test]
async fn test_patch_node_deployment_uses_merge_patch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(ND_PATH))
        .and(header("content-type", "application/merge-patch+json"))
        .and(body_json(serde_json::json!({"spec": {"replicas": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "nd1",
            "name": "tf-acc-test-abc",
            "spec": {"replicas": 2}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let patched = client(&mock_server)
        .patch_node_deployment(&nd_id(), &serde_json::json!({"spec": {"replicas": 2}}))
        .await
        .unwrap();

    assert_eq!(patched.id, "nd1");
    assert_eq!(patched.spec.unwrap().replicas, Some(2));
}

#[tokio::test]
async fn test_delete_node_deployment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(ND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .delete_node_deployment(&nd_id())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_node_deployments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/api/v1/projects/proj1/dc/hamburg/clusters/clu1/nodedeployments",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([
                openstack_nd(),
                {"id": "nd2", "name": "second"}
            ])),
        )
        .mount(&mock_server)
        .await;

    let list = client(&mock_server)
        .list_node_deployments(&nd_id().cluster())
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[1].id, "nd2");
}

#[tokio::test]
async fn test_get_and_delete_project() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects/proj-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "proj-xyz",
            "name": "tf-acc-test-abc",
            "status": "Active"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/proj-xyz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let fetched = client.get_project("proj-xyz").await.unwrap();
    assert_eq!(fetched.name, "tf-acc-test-abc");
    assert_eq!(fetched.status.as_deref(), Some("Active"));

    client.delete_project(&fetched.id).await.unwrap();
}

#[tokio::test]
async fn test_get_cluster() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects/proj1/dc/hamburg/clusters/clu1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "clu1",
            "name": "tf-acc-test-abc",
            "spec": {"version": "1.17.6", "cloud": {"dc": "os-hamburg"}}
        })))
        .mount(&mock_server)
        .await;

    let cluster = client(&mock_server)
        .get_cluster(&nd_id().cluster())
        .await
        .unwrap();

    assert_eq!(cluster.id, "clu1");
    let spec = cluster.spec.unwrap();
    assert_eq!(spec.version.as_deref(), Some("1.17.6"));
    assert_eq!(spec.cloud.unwrap().datacenter, "os-hamburg");
}
