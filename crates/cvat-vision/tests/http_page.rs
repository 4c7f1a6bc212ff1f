use cvat_vision::{HttpPage, Loader, LoaderConfig, ScriptRegistry, VisionError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> LoaderConfig {
    LoaderConfig {
        backend_api: format!("{}/api", server.uri()),
        poll_interval: Duration::from_millis(20),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

#[tokio::test]
async fn loads_script_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/opencv.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/* opencv */"))
        .expect(1)
        .mount(&server)
        .await;

    let page = Arc::new(HttpPage::new(ScriptRegistry::builtin()));
    let loader = Loader::new(config(&server), page.clone()).unwrap();
    loader.initialize().await.unwrap();

    assert!(loader.is_initialized());
    let scripts = page.scripts().await;
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].path(), "/assets/opencv.js");
    let contours = loader.contours().unwrap();
    assert_eq!(contours.approx_poly(vec![[0.0, 0.0]], 1.0, true).unwrap().len(), 1);
}

#[tokio::test]
async fn missing_script_is_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/opencv.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let page = Arc::new(HttpPage::new(ScriptRegistry::builtin()));
    let loader = Loader::new(config(&server), page.clone()).unwrap();
    let err = loader.initialize().await.unwrap_err();

    assert!(matches!(err, VisionError::FetchFailure { url } if url.ends_with("/assets/opencv.js")));
    assert!(page.scripts().await.is_empty());
    assert!(!loader.is_initialized());
}

#[tokio::test]
async fn unknown_script_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/custom.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("// nothing"))
        .mount(&server)
        .await;

    let config = LoaderConfig {
        library: "custom".into(),
        timeout: Duration::from_millis(200),
        ..config(&server)
    };
    let loader = Loader::http(config).unwrap();
    let err = loader.initialize().await.unwrap_err();
    assert_eq!(
        err,
        VisionError::InitializationTimeout {
            waited: Duration::from_millis(200)
        }
    );
}
