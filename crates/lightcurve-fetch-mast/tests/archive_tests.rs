mod common;

use lightcurve_fetch::{Archive, ArchiveError, TargetId};
use lightcurve_fetch_mast::{MastArchive, MastArchiveConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LLC_URI: &str = "mast:KEPLER/url/missions/kepler/lightcurves/0007/000757450/kplr000757450-2009166043257_llc.fits";

fn config_for(server: &MockServer) -> MastArchiveConfig {
    MastArchiveConfig {
        api_base_url: Some(server.uri()),
        ..Default::default()
    }
}

fn envelope(data: serde_json::Value) -> serde_json::Value {
    json!({ "status": "COMPLETE", "msg": "", "data": data })
}

async fn mount_search(server: &MockServer, data: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .and(body_string_contains("Mast.Caom.Filtered"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(data)))
        .mount(server)
        .await;
}

async fn mount_products(server: &MockServer, data: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .and(body_string_contains("Mast.Caom.Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(data)))
        .mount(server)
        .await;
}

fn kepler_products() -> serde_json::Value {
    json!([
        {
            "obsID": "9000030556",
            "dataURI": "mast:KEPLER/url/missions/kepler/target_pixel_files/0007/000757450/kplr000757450-2009166043257_lpd-targ.fits.gz",
            "productFilename": "kplr000757450-2009166043257_lpd-targ.fits.gz",
            "productSubGroupDescription": "LPD",
            "productType": "SCIENCE"
        },
        {
            "obsID": "9000030556",
            "dataURI": LLC_URI,
            "productFilename": "kplr000757450-2009166043257_llc.fits",
            "productSubGroupDescription": "LLC",
            "productType": "SCIENCE"
        }
    ])
}

#[tokio::test]
async fn fetch_downloads_and_decodes_first_light_curve() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .and(body_string_contains("Mast.Caom.Filtered"))
        .and(body_string_contains("kplr000757450"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "obsid": "9000030556", "obs_id": "kplr000757450_lc_Q111111111111111111", "target_name": "kplr000757450" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    mount_products(&server, kepler_products()).await;

    Mock::given(method("GET"))
        .and(path("/api/v0.1/Download/file"))
        .and(query_param("uri", LLC_URI))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(common::kepler_light_curve(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let curve = archive.fetch(&TargetId::new("757450")).await.unwrap();

    assert_eq!(curve.num_rows(), 3);
    assert_eq!(curve.column("flux"), Some(&[10.5, 11.25, 12.0][..]));
    assert_eq!(curve.column("quality"), Some(&[0.0, 128.0, 0.0][..]));
}

#[tokio::test]
async fn numeric_obsid_is_accepted() {
    let server = MockServer::start().await;
    mount_search(&server, json!([{ "obsid": 9000030556u64 }])).await;

    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .and(body_string_contains("Mast.Caom.Products"))
        .and(body_string_contains("9000030556"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(kepler_products())))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v0.1/Download/file"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(common::kepler_light_curve(), "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let curve = archive.fetch(&TargetId::new("757450")).await.unwrap();
    assert_eq!(curve.num_rows(), 3);
}

#[tokio::test]
async fn no_observations_is_not_found() {
    let server = MockServer::start().await;
    mount_search(&server, json!([])).await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("1")).await.unwrap_err();

    assert!(matches!(err, ArchiveError::NotFound(ref id) if id.as_str() == "1"));
}

#[tokio::test]
async fn no_light_curve_product_is_not_found() {
    let server = MockServer::start().await;
    mount_search(&server, json!([{ "obsid": "42" }])).await;
    mount_products(
        &server,
        json!([{
            "dataURI": "mast:KEPLER/url/x_lpd-targ.fits.gz",
            "productFilename": "x_lpd-targ.fits.gz",
            "productSubGroupDescription": "LPD",
            "productType": "SCIENCE"
        }]),
    )
    .await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("757450")).await.unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));
}

#[tokio::test]
async fn server_error_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("757450")).await.unwrap_err();

    match err {
        ArchiveError::Network(msg) => assert!(msg.contains("503"), "got {msg}"),
        other => panic!("expected Network error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("757450")).await.unwrap_err();
    assert!(matches!(err, ArchiveError::Parse(_)));
}

#[tokio::test]
async fn mast_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ERROR",
            "msg": "Request timed out",
            "data": []
        })))
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("757450")).await.unwrap_err();

    assert_eq!(err.to_string(), "MAST error: Request timed out");
}

#[tokio::test]
async fn corrupt_download_is_parse_error() {
    let server = MockServer::start().await;
    mount_search(&server, json!([{ "obsid": "42" }])).await;
    mount_products(&server, kepler_products()).await;

    Mock::given(method("GET"))
        .and(path("/api/v0.1/Download/file"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not fits", "application/octet-stream"))
        .mount(&server)
        .await;

    let archive = MastArchive::new(config_for(&server));
    let err = archive.fetch(&TargetId::new("757450")).await.unwrap_err();
    assert!(matches!(err, ArchiveError::Parse(_)), "got {err:?}");
}
