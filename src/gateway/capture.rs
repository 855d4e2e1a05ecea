// Single still capture

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use tracing::{debug, warn};

use super::AppState;
use crate::camera::jpeg::to_jpeg;
use crate::camera::{Camera, CameraError, Frame};

const X_TIMESTAMP: &str = "x-timestamp";

/// Grab a frame off the async runtime; sensor reads can block
pub(super) async fn capture_frame(camera: Arc<dyn Camera>) -> Result<Frame, CameraError> {
    tokio::task::spawn_blocking(move || camera.capture())
        .await
        .unwrap_or_else(|_| Err(CameraError::Unavailable))
}

pub(super) async fn capture_photo(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let frame = capture_frame(state.camera.clone()).await.map_err(|e| {
        warn!("Camera capture failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let timestamp = format_timestamp(frame.timestamp);
    let jpeg = to_jpeg(frame, state.timing.jpeg_quality).map_err(|e| {
        warn!("Capture encoding failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    debug!("Capture sent: {} bytes", jpeg.len());

    let mut resp = Response::new(Body::from(jpeg));
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("image/jpeg"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        header::HeaderValue::from_static("inline; filename=capture.jpg"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    let ts_val =
        header::HeaderValue::from_str(&timestamp).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    headers.insert(X_TIMESTAMP, ts_val);
    Ok(resp)
}

/// `<seconds>.<microseconds>` with the fraction zero-padded to six digits
fn format_timestamp(ts: Duration) -> String {
    format!("{}.{:06}", ts.as_secs(), ts.subsec_micros())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::control_router;
    use crate::gateway::testing::{NoCamera, rig, rig_with_camera};
    use axum::http::Request;
    use tower::ServiceExt;

    fn get_capture() -> Request<Body> {
        Request::builder()
            .uri("/capture_photo")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(
            format_timestamp(Duration::new(1_700_000_000, 42_000)),
            "1700000000.000042"
        );
        assert_eq!(format_timestamp(Duration::ZERO), "0.000000");
    }

    #[tokio::test]
    async fn test_capture_returns_jpeg_with_headers() {
        let rig = rig();
        let res = control_router(rig.state.clone())
            .oneshot(get_capture())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "inline; filename=capture.jpg"
        );
        let ts = headers[X_TIMESTAMP].to_str().unwrap().to_string();
        let (secs, micros) = ts.split_once('.').unwrap();
        assert!(secs.parse::<u64>().unwrap() > 0);
        assert_eq!(micros.len(), 6);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_capture_without_camera_is_server_error() {
        let rig = rig_with_camera(Arc::new(NoCamera));
        let res = control_router(rig.state.clone())
            .oneshot(get_capture())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
